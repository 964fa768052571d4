use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use secrecy::ExposeSecret;

use send_to_kindle::auth::AuthTable;
use send_to_kindle::bot::TelegramBot;
use send_to_kindle::config::{CliArgs, Config};
use send_to_kindle::handler::DocumentHandler;
use send_to_kindle::mailer::SmtpMailer;
use send_to_kindle::webhook::{WebhookState, webhook_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = CliArgs::parse();

    let config = match Config::resolve(args) {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet for fatal configuration errors.
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing, optionally into a file.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.verbosity));
    let _guard = match &config.logfile {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file = path.file_name().unwrap_or_else(|| "relay.log".as_ref());
            let (writer, guard) = tracing_appender::non_blocking(
                tracing_appender::rolling::never(dir, file),
            );
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    };

    let auth = Arc::new(AuthTable::parse(&config.authorized_users));
    if auth.is_empty() {
        tracing::warn!("No authorized users configured; no documents will be accepted");
    }

    eprintln!("📨 send-to-kindle v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   SMTP: {}:{}", config.smtp.host, config.smtp.port);
    eprintln!(
        "   Webhook: https://{}:{}/<token>",
        config.webhook.public_host, config.webhook.public_port
    );
    eprintln!("   Authorized users: {}\n", auth.len());

    tracing::info!("Starting up bot...");
    let bot = TelegramBot::new(config.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(
            bot = %me.username.as_deref().unwrap_or("unknown"),
            "Authenticated with the Bot API"
        ),
        Err(e) => {
            tracing::error!("Bot API health check failed: {e}");
            std::process::exit(1);
        }
    }

    // Re-register the webhook on every start.
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!("deleteWebhook failed: {e}");
    }
    let public_url = format!(
        "https://{}:{}/{}",
        config.webhook.public_host,
        config.webhook.public_port,
        config.bot_token.expose_secret()
    );
    if let Err(e) = bot.set_webhook(&public_url).await {
        tracing::error!("setWebhook failed: {e}");
        std::process::exit(1);
    }

    let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));
    let handler = Arc::new(DocumentHandler::new(
        Arc::new(bot),
        mailer,
        Arc::clone(&auth),
    ));

    let app = webhook_routes(WebhookState {
        path_token: config.bot_token.expose_secret().to_string(),
        auth,
        handler,
    });

    let listen = format!(
        "{}:{}",
        config.webhook.listen_addr, config.webhook.listen_port
    );
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!(%listen, "Webhook listener started");
    axum::serve(listener, app).await?;

    Ok(())
}
