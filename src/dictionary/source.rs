use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::error::LoadError;

/// Name of the active dataset. Each selector maps to exactly one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictionarySelector(String);

impl DictionarySelector {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DictionarySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFormat {
    /// A JSON object of word to definition, or a JSON array of words
    Json,
    /// Plain text, one word per line
    WordList,
}

/// Raw dictionary data as delivered by a source, before parsing.
#[derive(Debug, Clone)]
pub struct Resource {
    pub location: String,
    pub format: ResourceFormat,
    pub body: String,
}

/// Where dictionary data comes from.
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Fetch the resource backing `selector`.
    async fn fetch(&self, selector: &DictionarySelector) -> Result<Resource, LoadError>;
}

/// Reads `<dir>/<name>.json`, falling back to `<dir>/<name>.txt`.
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DictionarySource for FileSource {
    async fn fetch(&self, selector: &DictionarySelector) -> Result<Resource, LoadError> {
        let name = selector.name();
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(LoadError::Unreachable {
                location: name.to_string(),
                reason: "invalid dataset name".to_string(),
            });
        }

        let candidates = [
            (self.dir.join(format!("{name}.json")), ResourceFormat::Json),
            (self.dir.join(format!("{name}.txt")), ResourceFormat::WordList),
        ];

        for (path, format) in candidates {
            let location = path.display().to_string();
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => {
                    debug!("Read {} bytes from {}", body.len(), location);
                    return Ok(Resource {
                        location,
                        format,
                        body,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("No dictionary resource at {}", location);
                }
                Err(e) => {
                    return Err(LoadError::Unreachable {
                        location,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(LoadError::Unreachable {
            location: self.dir.join(name).display().to_string(),
            reason: "no .json or .txt resource found".to_string(),
        })
    }
}

/// Preloaded resources keyed by dataset name.
#[derive(Default, Clone)]
pub struct MemorySource {
    resources: HashMap<String, Resource>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, name: &str, body: impl Into<String>) -> Self {
        self.insert(name, ResourceFormat::Json, body.into());
        self
    }

    pub fn with_word_list(mut self, name: &str, body: impl Into<String>) -> Self {
        self.insert(name, ResourceFormat::WordList, body.into());
        self
    }

    fn insert(&mut self, name: &str, format: ResourceFormat, body: String) {
        self.resources.insert(
            name.to_string(),
            Resource {
                location: format!("memory:{name}"),
                format,
                body,
            },
        );
    }
}

#[async_trait]
impl DictionarySource for MemorySource {
    async fn fetch(&self, selector: &DictionarySelector) -> Result<Resource, LoadError> {
        self.resources
            .get(selector.name())
            .cloned()
            .ok_or_else(|| LoadError::Unreachable {
                location: format!("memory:{selector}"),
                reason: "no such dataset".to_string(),
            })
    }
}
