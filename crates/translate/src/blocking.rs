use anyhow::{Context, Result};

use crate::Translator;

/// Run a single translation to completion on a fresh current-thread runtime.
///
/// The runtime lives only for this call and is torn down before returning, so
/// the caller sees an ordinary blocking function. Must not be called from
/// inside an async context; the HTTP surface runs the pipeline on the
/// blocking pool for that reason.
pub fn translate_blocking(
    translator: &dyn Translator,
    text: &str,
    source: &str,
    target: &str,
) -> Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start translation runtime")?;

    let translated = runtime.block_on(translator.translate(text, source, target));
    drop(runtime);

    translated
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Upper;

    #[async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
            tokio::task::yield_now().await;
            Ok(text.to_uppercase())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Translator for Unreachable {
        async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_bridge_returns_plain_result() {
        let out = translate_blocking(&Upper, "apa kabar", "id", "en").unwrap();
        assert_eq!(out, "APA KABAR");
    }

    #[test]
    fn test_bridge_is_reusable_across_calls() {
        for _ in 0..3 {
            assert_eq!(translate_blocking(&Upper, "a", "id", "en").unwrap(), "A");
        }
    }

    #[test]
    fn test_bridge_propagates_errors() {
        let err = translate_blocking(&Unreachable, "a", "id", "en").unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
