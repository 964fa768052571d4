//! Authorization table — static alias → destination address mapping.
//!
//! Built once at startup from the `AUTHORIZED_USERS` string and immutable
//! for the process lifetime; shared read-only across event handlers.

use std::collections::HashMap;

/// Alias → destination email address, parsed from `a1:e1,a2:e2,...`.
#[derive(Debug, Default)]
pub struct AuthTable {
    entries: HashMap<String, String>,
}

impl AuthTable {
    /// Parse the authorized-users string.
    ///
    /// Segments without a `:` are dropped with a warning; whitespace around
    /// alias and address is trimmed. Later entries overwrite earlier ones.
    pub fn parse(input: &str) -> Self {
        let mut entries = HashMap::new();

        for segment in input.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(':') {
                Some((alias, address)) => {
                    entries.insert(alias.trim().to_string(), address.trim().to_string());
                }
                None => {
                    tracing::warn!(
                        segment,
                        "Ignoring malformed authorized-user entry (expected alias:address)"
                    );
                }
            }
        }

        Self { entries }
    }

    /// Membership test. Aliases are compared literally, case-sensitive.
    pub fn is_authorized(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    /// Look up the destination address for an alias.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
