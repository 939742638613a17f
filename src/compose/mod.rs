// src/compose/mod.rs
pub mod thumbnail;

use std::path::Path;

use askama::Template;
use tracing::{info, warn};

use crate::error::{FlashbackError, Result};
use crate::immich::{Asset, PhotoSource};

pub const EMAIL_TITLE: &str = "Weekly Flashback";

/// One image embedded in the email body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub content_id: String,
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Per-image data handed to the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCard {
    /// `YYYY-MM-DD`
    pub date_taken: String,
    pub cid: String,
    /// First names of tracked people in the photo.
    pub people_tagged: Vec<String>,
    pub original_url: String,
}

#[derive(Template)]
#[template(path = "flashback.html")]
struct FlashbackTemplate<'a> {
    email_title: &'a str,
    images: &'a [ImageCard],
}

#[derive(Debug, Clone)]
pub struct ComposedEmail {
    pub html: String,
    pub images: Vec<InlineImage>,
}

pub fn content_id(index: usize, asset_id: &str) -> String {
    format!("image_{index}_{asset_id}")
}

/// Display metadata for `asset`, shown at position `index`.
pub fn image_card(index: usize, asset: &Asset, person_ids: &[String], base_url: &str) -> ImageCard {
    ImageCard {
        date_taken: asset.taken_at.format("%Y-%m-%d").to_string(),
        cid: content_id(index, &asset.id),
        people_tagged: asset
            .people
            .iter()
            .filter(|p| person_ids.contains(&p.id))
            .map(|p| p.first_name().to_string())
            .collect(),
        original_url: format!("{}/photos/{}", base_url.trim_end_matches('/'), asset.id),
    }
}

pub fn render_html(cards: &[ImageCard]) -> Result<String> {
    let tpl = FlashbackTemplate {
        email_title: EMAIL_TITLE,
        images: cards,
    };
    Ok(tpl.render()?)
}

/// Builds the email body and inline images for `candidates`, in order.
///
/// Any download or image failure aborts the whole composition. The rendered
/// HTML is also written to `debug_html_path` when one is given; a failed
/// write only logs.
pub async fn compose_email(
    source: &dyn PhotoSource,
    candidates: &[Asset],
    person_ids: &[String],
    base_url: &str,
    debug_html_path: Option<&Path>,
) -> Result<ComposedEmail> {
    let mut cards = Vec::with_capacity(candidates.len());
    let mut images = Vec::with_capacity(candidates.len());

    for (i, asset) in candidates.iter().enumerate() {
        let original = source.download_original(&asset.id).await?;
        let bytes = thumbnail::render_thumbnail(&original).map_err(|e| {
            FlashbackError::ImageProcessing {
                asset_id: asset.id.clone(),
                source: e,
            }
        })?;
        info!(
            index = i,
            asset = %asset.id,
            original_bytes = original.len(),
            thumb_bytes = bytes.len(),
            "image composed"
        );

        let card = image_card(i, asset, person_ids, base_url);
        images.push(InlineImage {
            content_id: card.cid.clone(),
            bytes,
            filename: format!("image_{i}.jpg"),
        });
        cards.push(card);
    }

    let html = render_html(&cards)?;

    if let Some(path) = debug_html_path {
        if let Err(e) = tokio::fs::write(path, &html).await {
            warn!(error = ?e, path = %path.display(), "could not save rendered email");
        }
    }

    Ok(ComposedEmail { html, images })
}
