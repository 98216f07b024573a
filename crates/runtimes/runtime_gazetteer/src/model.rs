//! Gazetteer model files and phrase matching

use anyhow::{Context, Result};
use byoserve_runtime_api::Entity;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::tokens::{normalized, tokenize};

/// File looked up when the model path is a directory.
pub const MODEL_FILE_NAME: &str = "entities.json";

/// On-disk model format.
#[derive(Debug, Deserialize)]
pub struct GazetteerFile {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub case_sensitive: bool,

    /// Label -> phrases carrying that label
    pub entities: BTreeMap<String, Vec<String>>,
}

pub struct Gazetteer {
    name: String,
    case_sensitive: bool,
    /// Normalized token sequence -> label
    phrases: HashMap<Vec<String>, String>,
    /// Longest phrase, in tokens
    max_len: usize,
}

impl Gazetteer {
    pub fn load(model_path: &Path) -> Result<Self> {
        let path = resolve_model_file(model_path);
        tracing::info!("Loading gazetteer from {:?}", path);

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        let file: GazetteerFile = serde_json::from_str(&content)
            .with_context(|| format!("Invalid model file {}", path.display()))?;

        let fallback_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gazetteer".to_string());
        Self::build(file, fallback_name)
    }

    pub fn build(file: GazetteerFile, fallback_name: String) -> Result<Self> {
        let case_sensitive = file.case_sensitive;
        let mut phrases: HashMap<Vec<String>, String> = HashMap::new();
        let mut max_len = 0;

        for (label, entries) in file.entities {
            if label.trim().is_empty() {
                anyhow::bail!("Entity label must not be empty");
            }
            for phrase in entries {
                let tokens = tokenize(&phrase);
                if tokens.is_empty() {
                    anyhow::bail!("Blank phrase under label '{}'", label);
                }
                let key = normalized(&phrase, &tokens, case_sensitive);
                max_len = max_len.max(key.len());

                if let Some(existing) = phrases.get(&key) {
                    if existing != &label {
                        tracing::warn!(
                            "Phrase '{}' listed under both '{}' and '{}'; keeping '{}'",
                            phrase,
                            existing,
                            label,
                            existing
                        );
                    }
                    continue;
                }
                phrases.insert(key, label.clone());
            }
        }

        if phrases.is_empty() {
            anyhow::bail!("Model contains no phrases");
        }

        Ok(Self {
            name: file.name.unwrap_or(fallback_name),
            case_sensitive,
            phrases,
            max_len,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Leftmost-longest, non-overlapping phrase matches over the token stream.
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let tokens = tokenize(text);
        let keys = normalized(text, &tokens, self.case_sensitive);
        let mut entities = Vec::new();

        let mut i = 0;
        while i < keys.len() {
            let longest = self.max_len.min(keys.len() - i);
            let hit = (1..=longest)
                .rev()
                .find_map(|len| self.phrases.get(&keys[i..i + len]).map(|label| (len, label)));

            match hit {
                Some((len, label)) => {
                    let span = tokens[i].start..tokens[i + len - 1].end;
                    entities.push(Entity::new(&text[span], label.as_str()));
                    i += len;
                }
                None => i += 1,
            }
        }

        entities
    }
}

fn resolve_model_file(model_path: &Path) -> PathBuf {
    if model_path.is_dir() {
        model_path.join(MODEL_FILE_NAME)
    } else {
        model_path.to_path_buf()
    }
}
