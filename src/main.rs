//! Weekly Flashback — binary entrypoint.
//! One run: load config, search Immich, pick photos, send the email, exit.

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weekly_flashback::{run_flashback, Config, EmailSender, ImmichClient};

/// `RUST_LOG` picks the filter (default `weekly_flashback=info,warn`);
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weekly_flashback=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env when present; real environment wins.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env().context("loading configuration")?;
    info!(
        base_url = %cfg.immich_base_url,
        token_len = cfg.immich_api_token.len(),
        people = cfg.person_ids.len(),
        subscribers = cfg.subscribers.len(),
        limit = cfg.email_image_limit,
        start = %cfg.start_date,
        "config loaded"
    );

    let immich = ImmichClient::from_config(&cfg);
    let mailer = EmailSender::from_config(&cfg);
    let today = Utc::now().date_naive();

    let sent = run_flashback(&cfg, &immich, &mailer, today, &mut rand::rng())
        .await
        .context("flashback run")?;

    if sent {
        info!("done");
    } else {
        warn!("email was not delivered");
    }
    Ok(())
}
