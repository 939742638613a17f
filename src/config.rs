// src/config.rs
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::error::{FlashbackError, Result};

pub const DEFAULT_HTML_PATH: &str = "email.html";
pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Run configuration, loaded once at startup and passed by reference.
///
/// | Env Var                  | Required | Default      |
/// |--------------------------|----------|--------------|
/// | `IMMICH_API_TOKEN`       | yes      |              |
/// | `IMMICH_BASE_URL`        | yes      |              |
/// | `SMTP_HOST`              | yes      |              |
/// | `SMTP_PORT`              | yes      |              |
/// | `SMTP_USERNAME`          | yes      |              |
/// | `SMTP_PASSWORD`          | yes      |              |
/// | `SUBSCRIBERS`            | yes      |              |
/// | `PERSON_IDS`             | yes      |              |
/// | `EMAIL_IMAGE_LIMIT`      | yes      |              |
/// | `START_TIME`             | yes      |              |
/// | `FLASHBACK_HTML_PATH`    | no       | `email.html` |
/// | `SELECTION_MAX_ATTEMPTS` | no       | `10000`      |
///
/// Not `Debug`: the API token must never end up in a log line.
#[derive(Clone)]
pub struct Config {
    pub immich_api_token: String,
    /// Base URL without a trailing slash.
    pub immich_base_url: String,
    pub smtp: SmtpConfig,
    pub subscribers: Vec<String>,
    pub person_ids: Vec<String>,
    pub email_image_limit: usize,
    /// Anchor date; windows ending before it are never queried.
    pub start_date: NaiveDate,
    pub html_output_path: PathBuf,
    pub selection_max_attempts: usize,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password_len", &self.password.len())
            .finish()
    }
}

impl Config {
    /// Load from the process environment. Call `dotenvy::dotenv()` first if a
    /// `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String> {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(FlashbackError::ConfigurationMissing(var))
        };

        let immich_api_token = required("IMMICH_API_TOKEN")?;
        let immich_base_url = required("IMMICH_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        let smtp = SmtpConfig {
            host: required("SMTP_HOST")?,
            port: parse_number("SMTP_PORT", &required("SMTP_PORT")?)?,
            username: required("SMTP_USERNAME")?,
            password: required("SMTP_PASSWORD")?,
        };

        let subscribers = split_list("SUBSCRIBERS", &required("SUBSCRIBERS")?)?;
        let person_ids = split_list("PERSON_IDS", &required("PERSON_IDS")?)?;
        let email_image_limit = parse_number("EMAIL_IMAGE_LIMIT", &required("EMAIL_IMAGE_LIMIT")?)?;

        let start_raw = required("START_TIME")?;
        let start_date = NaiveDate::parse_from_str(&start_raw, "%Y-%m-%d").map_err(|e| {
            FlashbackError::ConfigurationInvalid {
                var: "START_TIME",
                reason: format!("expected YYYY-MM-DD, got {start_raw:?} ({e})"),
            }
        })?;

        let html_output_path = lookup("FLASHBACK_HTML_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_PATH));

        let selection_max_attempts = match lookup("SELECTION_MAX_ATTEMPTS") {
            Some(v) if !v.trim().is_empty() => parse_number("SELECTION_MAX_ATTEMPTS", v.trim())?,
            _ => DEFAULT_MAX_ATTEMPTS,
        };

        Ok(Self {
            immich_api_token,
            immich_base_url,
            smtp,
            subscribers,
            person_ids,
            email_image_limit,
            start_date,
            html_output_path,
            selection_max_attempts,
        })
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| FlashbackError::ConfigurationInvalid {
            var,
            reason: format!("{raw:?}: {e}"),
        })
}

fn split_list(var: &'static str, raw: &str) -> Result<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return Err(FlashbackError::ConfigurationMissing(var));
    }
    Ok(items)
}
