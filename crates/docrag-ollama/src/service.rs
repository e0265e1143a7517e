//! Blocking facade over [`OllamaClient`] for the synchronous pipeline.

use crate::client::OllamaClient;
use crate::error::OllamaResult;
use crate::types::{GenerateOptions, GenerateRequest};
use docrag_config::OllamaConfig;
use docrag_core::{AnswerGenerator, Embedder};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

const ANSWER_TEMPERATURE: f32 = 0.2;

/// Ollama-backed [`Embedder`] and [`AnswerGenerator`].
///
/// Owns a small multi-threaded runtime, so it can be shared between the
/// ingestion thread and request threads. Must not be called from inside
/// another async runtime.
pub struct OllamaService {
    client: OllamaClient,
    runtime: Runtime,
    model: String,
    embedding_model: String,
}

impl OllamaService {
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("docrag-ollama")
            .enable_all()
            .build()?;

        Ok(Self {
            client: OllamaClient::from_config(config)?,
            runtime,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Whether the server answers at all.
    pub fn is_available(&self) -> bool {
        self.runtime.block_on(self.client.is_available())
    }

    /// Whether `model` has been pulled on the server.
    pub fn has_model(&self, model: &str) -> OllamaResult<bool> {
        self.runtime.block_on(self.client.has_model(model))
    }
}

impl Embedder for OllamaService {
    fn embed(&self, text: &str) -> docrag_core::Result<Vec<f32>> {
        self.runtime
            .block_on(self.client.embed(&self.embedding_model, text))
            .map_err(|e| docrag_core::Error::Embedding(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

impl AnswerGenerator for OllamaService {
    fn generate(&self, system_prompt: &str, user_message: &str) -> docrag_core::Result<String> {
        let request = GenerateRequest::new(&self.model, user_message)
            .with_system(system_prompt)
            .with_options(GenerateOptions::new().with_temperature(ANSWER_TEMPERATURE));

        let response = self
            .runtime
            .block_on(self.client.generate(request))
            .map_err(|e| docrag_core::Error::Generation(e.to_string()))?;

        debug!("Generation finished with model {}", response.model);
        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> OllamaService {
        let config = OllamaConfig {
            host: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 5,
            ..OllamaConfig::default()
        };
        OllamaService::from_config(&config).unwrap()
    }

    #[test]
    fn test_model_names_from_config() {
        let service = OllamaService::from_config(&OllamaConfig::default()).unwrap();
        assert_eq!(service.model(), "llama3.1");
        assert_eq!(service.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_errors_map_to_core_kinds() {
        let service = unreachable();

        assert!(!service.is_available());
        assert!(matches!(
            service.embed("IVA"),
            Err(docrag_core::Error::Embedding(_))
        ));
        assert!(matches!(
            service.generate("system", "user"),
            Err(docrag_core::Error::Generation(_))
        ));
    }
}
