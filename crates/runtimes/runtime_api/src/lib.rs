//! byoserve_runtime_api - Runtime API traits and types
//!
//! This crate defines the contract for pluggable model runtimes.
//! The application server only talks to a model through [`Runtime`].

use anyhow::Result;
use async_trait::async_trait;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// Runtime status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Unloaded,
    Loading,
    Ready,
    Error,
}

/// Configuration for loading a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Model file, or a directory the runtime knows how to look into
    pub model_path: PathBuf,
}

/// A recognised span of the input together with its label.
///
/// Serialized as a `[text, label]` pair, which is what clients of the
/// invocation endpoint receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.text)?;
        pair.serialize_element(&self.label)?;
        pair.end()
    }
}

/// The trait every model backend implements
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Get current status
    fn status(&self) -> RuntimeStatus;

    /// Load a model
    async fn load(&mut self, config: RuntimeConfig) -> Result<()>;

    /// Unload the current model
    async fn unload(&mut self) -> Result<()>;

    /// Extract entities from `text`. Synchronous; callers run it off the
    /// async executor.
    fn extract(&self, text: &str) -> Result<Vec<Entity>>;
}
