// src/error.rs
use thiserror::Error;

/// Everything that can abort a flashback run.
///
/// `TransportDeliveryFailed` never leaves the mailer: it is logged there and
/// turned into a `false` return.
#[derive(Debug, Error)]
pub enum FlashbackError {
    #[error("missing required environment variable {0}")]
    ConfigurationMissing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    ConfigurationInvalid { var: &'static str, reason: String },

    #[error("photo service request failed ({what})")]
    RemoteRequestFailed {
        what: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no images found for any window or person")]
    EmptyCandidatePool,

    #[error("gave up after {attempts} draws with {found} of {wanted} images accepted")]
    SelectionExhausted {
        wanted: usize,
        found: usize,
        attempts: usize,
    },

    #[error("could not process image for asset {asset_id}")]
    ImageProcessing {
        asset_id: String,
        #[source]
        source: image::ImageError,
    },

    #[error("rendering email template")]
    Template(#[from] askama::Error),

    #[error("email delivery failed: {0}")]
    TransportDeliveryFailed(String),
}

pub type Result<T, E = FlashbackError> = std::result::Result<T, E>;
