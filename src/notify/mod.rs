pub mod email;

use crate::compose::ComposedEmail;

pub use email::EmailSender;

/// Final delivery step. Failures never propagate: implementations log and
/// return `false`.
#[async_trait::async_trait]
pub trait FlashbackMailer: Send + Sync {
    async fn deliver(&self, email: &ComposedEmail) -> bool;
}
