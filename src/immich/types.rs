// src/immich/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::windows::DateWindow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRef {
    pub id: String,
    /// Display name as entered in Immich, e.g. "Ada Lovelace".
    #[serde(default)]
    pub name: String,
}

impl PersonRef {
    /// First whitespace-separated token of `name`; `""` for a blank name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "fileCreatedAt")]
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub people: Vec<PersonRef>,
}

impl Asset {
    pub fn has_person(&self, person_id: &str) -> bool {
        self.people.iter().any(|p| p.id == person_id)
    }
}

/// Remote photo library. Every call is awaited in sequence by the pipeline.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Random images of `person_id` taken inside `window`.
    async fn search_random(&self, window: &DateWindow, person_id: &str) -> Result<Vec<Asset>>;

    /// Original file bytes of an asset.
    async fn download_original(&self, asset_id: &str) -> Result<Vec<u8>>;
}
