// src/pipeline.rs
//! One flashback run: search → select → compose → deliver, strictly in order.

use chrono::NaiveDate;
use rand::Rng;
use tracing::info;

use crate::compose::{compose_email, ComposedEmail};
use crate::config::Config;
use crate::error::Result;
use crate::immich::PhotoSource;
use crate::notify::FlashbackMailer;
use crate::select::{select_candidates, AssetPool};
use crate::windows::{AnniversaryWindows, DateWindow};

/// One search per (window, person), grouped under the window's end year.
/// Years with no hits are kept as empty lists.
pub async fn collect_assets<I>(
    source: &dyn PhotoSource,
    person_ids: &[String],
    windows: I,
) -> Result<AssetPool>
where
    I: IntoIterator<Item = DateWindow>,
{
    let mut pool = AssetPool::new();
    for window in windows {
        let bucket = pool.entry(window.year()).or_default();
        for person_id in person_ids {
            info!(
                taken_after = %window.start,
                taken_before = %window.end,
                person = %person_id,
                "searching"
            );
            let mut found = source.search_random(&window, person_id).await?;
            bucket.append(&mut found);
        }
    }
    Ok(pool)
}

/// Everything up to, but not including, delivery.
pub async fn prepare_email<R: Rng + ?Sized>(
    cfg: &Config,
    source: &dyn PhotoSource,
    today: NaiveDate,
    rng: &mut R,
) -> Result<ComposedEmail> {
    let windows = AnniversaryWindows::since(today, cfg.start_date);
    let pool = collect_assets(source, &cfg.person_ids, windows).await?;
    info!(
        years = pool.len(),
        assets = pool.values().map(Vec::len).sum::<usize>(),
        "search finished"
    );

    let candidates = select_candidates(
        &pool,
        &cfg.person_ids,
        cfg.email_image_limit,
        cfg.selection_max_attempts,
        rng,
    )?;

    compose_email(
        source,
        &candidates,
        &cfg.person_ids,
        &cfg.immich_base_url,
        Some(cfg.html_output_path.as_path()),
    )
    .await
}

/// Full run. `Err` aborts before anything is sent; `Ok(false)` means the
/// email was built but delivery failed.
pub async fn run_flashback<R: Rng + ?Sized>(
    cfg: &Config,
    source: &dyn PhotoSource,
    mailer: &dyn FlashbackMailer,
    today: NaiveDate,
    rng: &mut R,
) -> Result<bool> {
    let email = prepare_email(cfg, source, today, rng).await?;
    Ok(mailer.deliver(&email).await)
}
