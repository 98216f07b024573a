//! byoserve_runtime_gazetteer - Dictionary-based entity recognition runtime
//!
//! Loads a JSON phrase dictionary (label -> phrases) and tags every
//! occurrence in the input text.

mod model;
mod tokens;

use anyhow::Result;
use async_trait::async_trait;
use byoserve_runtime_api::{Entity, Runtime, RuntimeConfig, RuntimeStatus};

pub use model::{Gazetteer, GazetteerFile, MODEL_FILE_NAME};

pub struct GazetteerRuntime {
    status: RuntimeStatus,
    config: Option<RuntimeConfig>,
    model: Option<Gazetteer>,
}

impl GazetteerRuntime {
    pub fn new() -> Self {
        Self {
            status: RuntimeStatus::Unloaded,
            config: None,
            model: None,
        }
    }

    pub fn config(&self) -> Option<&RuntimeConfig> {
        self.config.as_ref()
    }
}

impl Default for GazetteerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runtime for GazetteerRuntime {
    fn status(&self) -> RuntimeStatus {
        self.status
    }

    async fn load(&mut self, config: RuntimeConfig) -> Result<()> {
        self.status = RuntimeStatus::Loading;
        tracing::info!("Loading model from {:?}", config.model_path);

        let model_path = config.model_path.clone();
        let loaded = tokio::task::spawn_blocking(move || Gazetteer::load(&model_path))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|result| result);

        match loaded {
            Ok(model) => {
                tracing::info!(
                    "Model '{}' loaded with {} phrases",
                    model.name(),
                    model.phrase_count()
                );
                self.model = Some(model);
                self.config = Some(config);
                self.status = RuntimeStatus::Ready;
                Ok(())
            }
            Err(e) => {
                self.model = None;
                self.status = RuntimeStatus::Error;
                Err(e)
            }
        }
    }

    async fn unload(&mut self) -> Result<()> {
        tracing::info!("Unloading model");
        self.model = None;
        self.config = None;
        self.status = RuntimeStatus::Unloaded;
        Ok(())
    }

    fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Model not loaded"))?;
        Ok(model.extract(text))
    }
}
