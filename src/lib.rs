// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod compose;
pub mod config;
pub mod error;
pub mod immich;
pub mod notify;
pub mod pipeline;
pub mod select;
pub mod windows;

// ---- Re-exports for stable public API ----
pub use crate::config::Config;
pub use crate::error::FlashbackError;
pub use crate::immich::{Asset, ImmichClient, PersonRef, PhotoSource};
pub use crate::notify::{EmailSender, FlashbackMailer};
pub use crate::pipeline::run_flashback;
