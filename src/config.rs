//! Startup configuration — environment variables first, CLI flags as
//! fallback when a variable is absent.

use std::path::PathBuf;

use clap::Parser;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::mailer::SmtpConfig;

/// Command-line flags. Each one backs an environment variable; the variable
/// wins when both are present.
#[derive(Debug, Parser)]
#[command(name = "send-to-kindle", version, about = "Relay Telegram documents to email")]
pub struct CliArgs {
    /// Telegram API token given by @BotFather.
    #[arg(long)]
    pub token: Option<String>,

    /// Authorized users as alias:address pairs, comma separated.
    #[arg(long)]
    pub users: Option<String>,

    /// SMTP server host.
    #[arg(long)]
    pub smtp_server: Option<String>,

    /// SMTP server port (implicit TLS).
    #[arg(long)]
    pub smtp_port: Option<u16>,

    /// SMTP username, also the From address.
    #[arg(long)]
    pub smtp_user: Option<String>,

    /// SMTP password.
    #[arg(long)]
    pub smtp_password: Option<String>,

    /// Public host the platform delivers webhooks to.
    #[arg(long)]
    pub webhook_host: Option<String>,

    /// Public webhook port.
    #[arg(long)]
    pub webhook_port: Option<u16>,

    /// Local listening address.
    #[arg(long)]
    pub webhook_listen: Option<String>,

    /// Local listening port.
    #[arg(long)]
    pub webhook_listen_port: Option<u16>,

    /// Log to the given file instead of stderr.
    #[arg(long)]
    pub logfile: Option<PathBuf>,

    /// Log verbosity.
    #[arg(short, long, default_value = "info",
          value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub verbosity: String,
}

/// Webhook endpoint settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub public_host: String,
    pub public_port: u16,
    pub listen_addr: String,
    pub listen_port: u16,
}

/// Resolved, immutable process configuration.
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    pub authorized_users: String,
    pub smtp: SmtpConfig,
    pub webhook: WebhookConfig,
    pub logfile: Option<PathBuf>,
    pub verbosity: String,
}

impl Config {
    /// Resolve against the process environment.
    pub fn resolve(args: CliArgs) -> Result<Self, ConfigError> {
        Self::resolve_from(args, &|key| std::env::var(key).ok())
    }

    /// Resolve against an explicit environment lookup (test seam).
    pub fn resolve_from(
        args: CliArgs,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let bot_token = required("TELEGRAM_BOT_TOKEN", "--token", env, args.token)?;

        let authorized_users = env_or("AUTHORIZED_USERS", env, args.users).unwrap_or_default();

        let smtp = SmtpConfig {
            host: env_or("SMTP_SERVER", env, args.smtp_server)
                .unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: port_or("SMTP_PORT", env, args.smtp_port, 465)?,
            username: required("SMTP_USER", "--smtp-user", env, args.smtp_user)?,
            password: SecretString::from(required(
                "SMTP_PASSWORD",
                "--smtp-password",
                env,
                args.smtp_password,
            )?),
        };

        let webhook = WebhookConfig {
            public_host: required("WEBHOOK_HOST", "--webhook-host", env, args.webhook_host)?,
            public_port: port_or("WEBHOOK_PORT", env, args.webhook_port, 443)?,
            listen_addr: env_or("WEBHOOK_LISTEN", env, args.webhook_listen)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            listen_port: port_or("WEBHOOK_LISTEN_PORT", env, args.webhook_listen_port, 8080)?,
        };

        let logfile = env_or("LOGFILE", env, args.logfile.map(|p| p.display().to_string()))
            .map(PathBuf::from);

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            authorized_users,
            smtp,
            webhook,
            logfile,
            verbosity: args.verbosity,
        })
    }
}

/// Environment value if present and non-empty, otherwise the flag value.
fn env_or(
    key: &str,
    env: &dyn Fn(&str) -> Option<String>,
    flag: Option<String>,
) -> Option<String> {
    env(key).filter(|v| !v.is_empty()).or(flag)
}

fn required(
    key: &str,
    flag_name: &str,
    env: &dyn Fn(&str) -> Option<String>,
    flag: Option<String>,
) -> Result<String, ConfigError> {
    env_or(key, env, flag).ok_or_else(|| ConfigError::MissingRequired {
        key: key.to_string(),
        hint: format!("Set the environment variable or pass {flag_name}."),
    })
}

fn port_or(
    key: &str,
    env: &dyn Fn(&str) -> Option<String>,
    flag: Option<u16>,
    default: u16,
) -> Result<u16, ConfigError> {
    match env(key).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?} is not a valid port"),
        }),
        None => Ok(flag.unwrap_or(default)),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("send-to-kindle").chain(argv.iter().copied()))
    }

    fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(argv: &[&str], pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env = env_map(pairs);
        Config::resolve_from(args(argv), &move |key| env.get(key).cloned())
    }

    const FULL_ENV: &[(&str, &str)] = &[
        ("TELEGRAM_BOT_TOKEN", "123:ABC"),
        ("AUTHORIZED_USERS", "alice:alice@x.com"),
        ("SMTP_USER", "bot@gmail.com"),
        ("SMTP_PASSWORD", "hunter2"),
        ("WEBHOOK_HOST", "relay.example.com"),
    ];

    #[test]
    fn resolves_with_defaults() {
        let config = resolve(&[], FULL_ENV).unwrap();
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.webhook.public_port, 443);
        assert_eq!(config.webhook.listen_addr, "0.0.0.0");
        assert_eq!(config.webhook.listen_port, 8080);
        assert_eq!(config.verbosity, "info");
        assert!(config.logfile.is_none());
    }

    #[test]
    fn missing_token_is_fatal() {
        let err = resolve(&[], &FULL_ENV[1..]).unwrap_err();
        match err {
            ConfigError::MissingRequired { key, .. } => assert_eq!(key, "TELEGRAM_BOT_TOKEN"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_mail_configuration_is_fatal() {
        let pairs = &[
            ("TELEGRAM_BOT_TOKEN", "123:ABC"),
            ("WEBHOOK_HOST", "relay.example.com"),
        ];
        let err = resolve(&[], pairs).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn missing_webhook_host_is_fatal() {
        let err = resolve(&[], &FULL_ENV[..4]).unwrap_err();
        match err {
            ConfigError::MissingRequired { key, .. } => assert_eq!(key, "WEBHOOK_HOST"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_users_is_not_fatal() {
        let pairs: Vec<_> = FULL_ENV
            .iter()
            .filter(|(k, _)| *k != "AUTHORIZED_USERS")
            .copied()
            .collect();
        let config = resolve(&[], &pairs).unwrap();
        assert!(config.authorized_users.is_empty());
    }

    #[test]
    fn flag_fills_in_for_absent_variable() {
        let pairs: Vec<_> = FULL_ENV
            .iter()
            .filter(|(k, _)| *k != "WEBHOOK_HOST")
            .copied()
            .collect();
        let config = resolve(&["--webhook-host", "cli.example.com"], &pairs).unwrap();
        assert_eq!(config.webhook.public_host, "cli.example.com");
    }

    #[test]
    fn environment_wins_over_flag() {
        let config = resolve(&["--smtp-server", "cli.smtp.com"], FULL_ENV).unwrap();
        assert_eq!(config.smtp.host, "smtp.gmail.com");

        let mut pairs = FULL_ENV.to_vec();
        pairs.push(("SMTP_SERVER", "env.smtp.com"));
        let config = resolve(&["--smtp-server", "cli.smtp.com"], &pairs).unwrap();
        assert_eq!(config.smtp.host, "env.smtp.com");
    }

    #[test]
    fn unparseable_port_is_rejected() {
        let mut pairs = FULL_ENV.to_vec();
        pairs.push(("SMTP_PORT", "not-a-port"));
        let err = resolve(&[], &pairs).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "SMTP_PORT"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn port_flag_used_when_variable_absent() {
        let config = resolve(&["--smtp-port", "2465"], FULL_ENV).unwrap();
        assert_eq!(config.smtp.port, 2465);
    }

    #[test]
    fn logfile_from_environment() {
        let mut pairs = FULL_ENV.to_vec();
        pairs.push(("LOGFILE", "/var/log/relay.log"));
        let config = resolve(&[], &pairs).unwrap();
        assert_eq!(config.logfile, Some(PathBuf::from("/var/log/relay.log")));
    }
}
