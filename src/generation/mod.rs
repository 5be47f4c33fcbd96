//! Streamed text generation.
//!
//! A generator produces a lazy, finite, non-restartable sequence of text
//! fragments; callers concatenate them in arrival order.

mod ollama;

pub use ollama::OllamaGenerator;

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

/// A stream of generated text fragments, in arrival order.
pub type TokenStream = BoxStream<'static, Result<String>>;

/// Trait for generation implementations.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Start generating a reply to `prompt` under the given system instruction.
    async fn generate(&self, system: &str, prompt: &str) -> Result<TokenStream>;
}

/// Drain a token stream into a single string, preserving fragment order.
pub async fn collect_answer(mut stream: TokenStream) -> Result<String> {
    let mut answer = String::new();
    while let Some(fragment) = stream.next().await {
        answer.push_str(&fragment?);
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmakError;
    use futures::stream;

    #[test]
    fn test_collect_preserves_fragment_order() {
        let fragments = vec![
            Ok("Slice ".to_string()),
            Ok("the ".to_string()),
            Ok("leeks".to_string()),
        ];
        let stream: TokenStream = Box::pin(stream::iter(fragments));

        let answer = tokio_test::block_on(collect_answer(stream)).unwrap();
        assert_eq!(answer, "Slice the leeks");
    }

    #[tokio::test]
    async fn test_collect_propagates_errors() {
        let fragments = vec![
            Ok("partial".to_string()),
            Err(SmakError::Generation("connection reset".to_string())),
        ];
        let stream: TokenStream = Box::pin(stream::iter(fragments));

        let result = collect_answer(stream).await;
        assert!(matches!(result, Err(SmakError::Generation(_))));
    }

    #[tokio::test]
    async fn test_collect_empty_stream() {
        let stream: TokenStream = Box::pin(stream::iter(Vec::new()));
        assert_eq!(collect_answer(stream).await.unwrap(), "");
    }
}
