pub mod blocking;
pub mod google;

pub use blocking::translate_blocking;
pub use google::GoogleTranslator;

use anyhow::Result;
use async_trait::async_trait;

/// A remote translation service.
///
/// Translation clients are naturally asynchronous; callers in the synchronous
/// pipeline go through [`translate_blocking`].
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}
