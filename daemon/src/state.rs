use anyhow::Result;
use byoserve_runtime_api::{Entity, Runtime, RuntimeConfig, RuntimeStatus};
use byoserve_runtime_gazetteer::GazetteerRuntime;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::api::invocations::InvocationError;

pub struct AppState {
    pub runtime: Arc<RwLock<dyn Runtime>>,
    /// Mirror of the runtime status, readable while a load holds the write lock
    status: watch::Sender<RuntimeStatus>,
}

impl AppState {
    /// State backed by the bundled gazetteer runtime, nothing loaded yet.
    pub fn new() -> Self {
        Self::with_runtime(GazetteerRuntime::new())
    }

    pub fn with_runtime<R: Runtime + 'static>(runtime: R) -> Self {
        let (status, _) = watch::channel(runtime.status());
        Self {
            runtime: Arc::new(RwLock::new(runtime)),
            status,
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        *self.status.borrow()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.status() == RuntimeStatus::Ready
    }

    pub async fn load_model(&self, model_path: &Path) -> Result<()> {
        self.status.send_replace(RuntimeStatus::Loading);

        let mut runtime = self.runtime.write().await;
        let result = runtime
            .load(RuntimeConfig {
                model_path: model_path.to_path_buf(),
            })
            .await;
        self.status.send_replace(runtime.status());
        result
    }

    pub async fn unload_model(&self) -> Result<()> {
        let mut runtime = self.runtime.write().await;
        if runtime.status() == RuntimeStatus::Ready {
            runtime.unload().await?;
        }
        self.status.send_replace(runtime.status());
        Ok(())
    }

    /// Run the model on `text` on the blocking pool. A panic inside the model
    /// surfaces as an error; the server keeps running.
    pub async fn extract(&self, text: String) -> Result<Vec<Entity>, InvocationError> {
        if !self.is_model_loaded() {
            return Err(InvocationError::ModelNotLoaded);
        }

        let runtime = self.runtime.clone();
        tokio::task::spawn_blocking(move || runtime.blocking_read().extract(&text))
            .await?
            .map_err(InvocationError::Model)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
