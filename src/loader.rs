//! Document loading and caching
//!
//! The loader owns an in-memory cache of parsed documents keyed by their
//! canonical location string, and an [`Opener`] that performs the actual
//! byte fetching and RFC3986 location arithmetic. Cache keys are compared
//! as exact strings; no URL re-normalization is attempted.
//!
//! Beyond the fetch location, a document declaring a top-level string
//! `$id` is aliased in the cache under that identifier (fragment
//! stripped), so later loads and resolves can reach it by declared
//! identity without re-fetching.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::document::Document;
use crate::error::{ResolveError, Result};
use crate::reference::Reference;
use crate::resolver;
use crate::tree::yaml_to_tree;

// =============================================================================
// OPENER
// =============================================================================

/// Raw text of an opened resource plus an optional media-type hint
#[derive(Debug, Clone)]
pub struct OpenedResource {
    pub text: String,
    pub media_type: Option<String>,
}

/// Byte-stream access and location arithmetic, pluggable per transport
///
/// Implementations are expected to be blocking; timeouts and retries are
/// their concern, not the loader's.
pub trait Opener {
    /// Fetch the resource at an absolute canonical location
    fn open(&self, location: &str) -> Result<OpenedResource>;

    /// Resolve a relative locator against a base location per RFC3986
    fn resolve_against(&self, base: &str, relative: &str) -> Result<String> {
        resolve_location(base, relative)
    }
}

/// RFC3986 resolution via the url crate; absolute inputs pass through
pub fn resolve_location(base: &str, relative: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(relative) {
        return Ok(absolute.to_string());
    }
    let base_url = Url::parse(base).map_err(|source| ResolveError::InvalidLocation {
        location: base.to_string(),
        source,
    })?;
    let joined = base_url
        .join(relative)
        .map_err(|source| ResolveError::InvalidLocation {
            location: relative.to_string(),
            source,
        })?;
    Ok(joined.to_string())
}

/// Opener for `file:` URLs backed by std::fs
///
/// Supplies no media-type hint, leaving the format decision to the
/// location suffix rule.
#[derive(Debug, Default)]
pub struct FileOpener;

impl Opener for FileOpener {
    fn open(&self, location: &str) -> Result<OpenedResource> {
        let url = Url::parse(location).map_err(|source| ResolveError::InvalidLocation {
            location: location.to_string(),
            source,
        })?;
        if url.scheme() != "file" {
            return Err(ResolveError::ResourceNotFound {
                location: location.to_string(),
                source: None,
            });
        }
        let path = url
            .to_file_path()
            .map_err(|_| ResolveError::ResourceNotFound {
                location: location.to_string(),
                source: None,
            })?;
        let text = std::fs::read_to_string(&path).map_err(|source| {
            ResolveError::ResourceNotFound {
                location: location.to_string(),
                source: Some(source),
            }
        })?;
        Ok(OpenedResource {
            text,
            media_type: None,
        })
    }
}

// =============================================================================
// FORMAT DECISION
// =============================================================================

/// Decide whether a resource should be parsed as YAML
///
/// A media-type hint wins: "yaml"/"yml" anywhere in it means YAML, an
/// explicit "json" means JSON. Without a verdict the location's path
/// suffix decides (`.yaml`/`.yml`, case-insensitive, query and fragment
/// ignored). Everything else is JSON.
pub fn looks_like_yaml(media_type: Option<&str>, location: &str) -> bool {
    if let Some(media_type) = media_type {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.contains("yaml") || media_type.contains("yml") {
            return true;
        }
        if media_type.contains("json") {
            return false;
        }
    }
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
        .to_ascii_lowercase();
    path.ends_with(".yaml") || path.ends_with(".yml")
}

// =============================================================================
// LOADER
// =============================================================================

/// Caching document loader
///
/// Maps canonical location strings (and `$id` aliases) to parsed
/// documents. Single-threaded by design: `load` takes `&mut self` and the
/// map has no internal locking.
pub struct DocumentLoader {
    opener: Box<dyn Opener>,
    cache: HashMap<String, Arc<Document>>,
}

impl DocumentLoader {
    pub fn new(opener: Box<dyn Opener>) -> DocumentLoader {
        DocumentLoader {
            opener,
            cache: HashMap::new(),
        }
    }

    /// Loader over the local filesystem
    pub fn with_file_opener() -> DocumentLoader {
        DocumentLoader::new(Box::new(FileOpener))
    }

    pub fn opener(&self) -> &dyn Opener {
        self.opener.as_ref()
    }

    /// Load the document at a canonical location, fetching and parsing on
    /// a cache miss
    ///
    /// A present cache key is always a hit, even if the cached document's
    /// root is Null — "not cached" and "cached as empty" are distinct.
    pub fn load(&mut self, location: &str) -> Result<Arc<Document>> {
        if let Some(doc) = self.cache.get(location) {
            debug!(location, "document cache hit");
            return Ok(doc.clone());
        }

        let opened = self.opener.open(location)?;
        let root = if looks_like_yaml(opened.media_type.as_deref(), location) {
            debug!(location, "parsing as YAML");
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(&opened.text).map_err(|source| ResolveError::Parse {
                    location: location.to_string(),
                    source: Box::new(source),
                })?;
            yaml_to_tree(yaml).map_err(|source| ResolveError::Parse {
                location: location.to_string(),
                source: Box::new(source),
            })?
        } else {
            debug!(location, "parsing as JSON");
            serde_json::from_str(&opened.text).map_err(|source| ResolveError::Parse {
                location: location.to_string(),
                source: Box::new(source),
            })?
        };

        let doc = Arc::new(Document::new(location.to_string(), root));
        self.cache.insert(location.to_string(), doc.clone());

        if let Some(id) = doc.declared_id() {
            match self.opener.resolve_against(location, id) {
                Ok(canonical) => {
                    let alias = strip_fragment(&canonical).to_string();
                    debug!(location, alias = %alias, "registering $id alias");
                    self.cache.insert(alias, doc.clone());
                }
                Err(err) => {
                    warn!(location, id, %err, "ignoring unresolvable $id");
                }
            }
        }

        Ok(doc)
    }

    /// Load a document and return a reference to its root
    pub fn load_root(&mut self, location: &str) -> Result<Reference> {
        Ok(Reference::root(self.load(location)?))
    }

    /// Resolve a relative reference string against a current reference
    ///
    /// See [`resolver::resolve`] for the three syntactic forms.
    pub fn resolve(&mut self, base: &Reference, reference: &str) -> Result<Reference> {
        resolver::resolve(self, base, reference)
    }

    // =========================================================================
    // CACHE MUTATION
    // =========================================================================

    /// Insert or overwrite a cache entry directly
    pub fn add_to_cache(&mut self, key: impl Into<String>, doc: Arc<Document>) {
        self.cache.insert(key.into(), doc);
    }

    /// Drop a single cache entry, returning the evicted document
    pub fn remove_from_cache(&mut self, key: &str) -> Option<Arc<Document>> {
        self.cache.remove(key)
    }

    /// Drop every cache entry
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Whether a key is currently cached (location or `$id` alias)
    pub fn is_cached(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }
}

fn strip_fragment(location: &str) -> &str {
    match location.split_once('#') {
        Some((before, _)) => before,
        None => location,
    }
}
