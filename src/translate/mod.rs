// Translation over hosted models
//
// - Huggingface: HTTP engines for the two model families
// - Registry: language code -> engine handle, built once at startup
// - Service: best-effort segment translation with pass-through fallbacks

pub mod huggingface;
pub mod registry;
pub mod service;

use async_trait::async_trait;

pub use huggingface::*;
pub use registry::*;
pub use service::*;

use crate::error::Result;

/// A model that translates one fixed language pair
#[async_trait]
pub trait PairTranslator: Send + Sync {
    /// Translate a batch of texts, one output per input
    async fn translate_batch(&self, texts: &[String]) -> Result<Vec<String>>;

    fn model(&self) -> &str;
}

/// A many-to-many model that needs explicit language tags on every call
#[async_trait]
pub trait MultilingualTranslator: Send + Sync {
    /// Translate a batch of texts between the tagged languages, one output per input
    async fn translate_batch(
        &self,
        texts: &[String],
        source_tag: &str,
        target_tag: &str,
    ) -> Result<Vec<String>>;

    fn model(&self) -> &str;
}
