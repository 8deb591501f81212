//! Source location and the bounded syntax tree cache
//!
//! `TreeCache` memoizes parsed trees by fully qualified type name. It is a
//! FIFO: once full, inserting evicts the entry inserted first, and hits do
//! not change the order.

use crate::error::{MetaError, MetaResult};
use crate::tree::{Source, SyntaxTree};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Default number of trees kept.
pub const DEFAULT_CAPACITY: usize = 16;

/// Finds the source file declaring a type.
pub trait SourceLocator: Send + Sync {
    /// Raw source of the file declaring `type_name` (fully qualified,
    /// without leading `\`).
    fn locate(&self, type_name: &str) -> MetaResult<Source>;
}

/// Maps `a\b\C` to `<root>/a/b/C.<extension>` for each root and extension.
#[derive(Debug, Clone)]
pub struct FileSystemLocator {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl FileSystemLocator {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            extensions: vec!["php".to_string()],
        }
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

impl SourceLocator for FileSystemLocator {
    fn locate(&self, type_name: &str) -> MetaResult<Source> {
        let relative = type_name.trim_start_matches('\\').replace('\\', "/");
        for root in &self.roots {
            for extension in &self.extensions {
                let path = root.join(format!("{}.{}", relative, extension));
                if !path.is_file() {
                    continue;
                }
                let bytes = std::fs::read(&path)
                    .map_err(|err| MetaError::unavailable(type_name, format!("{}: {}", path.display(), err)))?;
                return Ok(Source::new(path.display().to_string(), bytes));
            }
        }
        Err(MetaError::unavailable(
            type_name,
            format!("no source file in {} root(s)", self.roots.len()),
        ))
    }
}

/// In-memory sources keyed by type name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    sources: FxHashMap<String, Source>,
}

impl MemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `code` as the file declaring `type_name`.
    pub fn insert(&mut self, type_name: &str, code: impl Into<String>) {
        let name = type_name.trim_start_matches('\\');
        let source = Source::new(format!("memory://{}", name), code.into());
        self.sources.insert(name.to_ascii_lowercase(), source);
    }

    pub fn with(mut self, type_name: &str, code: impl Into<String>) -> Self {
        self.insert(type_name, code);
        self
    }
}

impl SourceLocator for MemoryLocator {
    fn locate(&self, type_name: &str) -> MetaResult<Source> {
        let key = type_name.trim_start_matches('\\').to_ascii_lowercase();
        self.sources
            .get(&key)
            .cloned()
            .ok_or_else(|| MetaError::unavailable(type_name, "not registered"))
    }
}

#[derive(Default)]
struct CacheState {
    trees: FxHashMap<String, Arc<SyntaxTree>>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
}

/// Bounded FIFO cache of parsed trees.
pub struct TreeCache {
    locator: Arc<dyn SourceLocator>,
    capacity: usize,
    state: Mutex<CacheState>,
}

fn cache_key(type_name: &str) -> String {
    type_name.trim_start_matches('\\').to_ascii_lowercase()
}

impl TreeCache {
    pub fn new(locator: Arc<dyn SourceLocator>) -> Self {
        Self::with_capacity(locator, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(locator: Arc<dyn SourceLocator>, capacity: usize) -> Self {
        Self {
            locator,
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The tree of `type_name`, parsing its source on a miss.
    pub fn tree(&self, type_name: &str) -> MetaResult<Arc<SyntaxTree>> {
        let key = cache_key(type_name);
        if let Some(tree) = self.state.lock().trees.get(&key) {
            return Ok(Arc::clone(tree));
        }

        // Parse without holding the lock
        let name = type_name.trim_start_matches('\\');
        let source = self.locator.locate(name)?;
        debug!(type_name = name, origin = %source.origin, "parsing syntax tree");
        let tree = Arc::new(SyntaxTree::parse(name, source)?);

        if self.capacity == 0 {
            return Ok(tree);
        }

        let mut state = self.state.lock();
        if let Some(existing) = state.trees.get(&key) {
            return Ok(Arc::clone(existing));
        }
        while state.order.len() >= self.capacity {
            if let Some(evicted) = state.order.pop_front() {
                debug!(evicted = %evicted, "evicting syntax tree");
                state.trees.remove(&evicted);
            }
        }
        state.order.push_back(key.clone());
        state.trees.insert(key, Arc::clone(&tree));
        Ok(tree)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.state.lock().trees.contains_key(&cache_key(type_name))
    }

    pub fn len(&self) -> usize {
        self.state.lock().trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.trees.clear();
        state.order.clear();
    }
}

impl std::fmt::Debug for TreeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TreeCache")
            .field("capacity", &self.capacity)
            .field("entries", &state.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(count: usize) -> MemoryLocator {
        let mut locator = MemoryLocator::new();
        for i in 0..count {
            locator.insert(&format!("app\\T{}", i), format!("<?php namespace app; class T{} {{}}", i));
        }
        locator
    }

    #[test]
    fn test_seventeenth_insert_evicts_first() {
        let cache = TreeCache::new(Arc::new(locator(17)));
        for i in 0..16 {
            cache.tree(&format!("app\\T{}", i)).unwrap();
        }
        assert_eq!(cache.len(), 16);

        cache.tree("app\\T16").unwrap();
        assert_eq!(cache.len(), 16);
        assert!(!cache.contains("app\\T0"));
        for i in 1..=16 {
            assert!(cache.contains(&format!("app\\T{}", i)));
        }
    }

    #[test]
    fn test_hits_do_not_reorder() {
        let cache = TreeCache::with_capacity(Arc::new(locator(3)), 2);
        cache.tree("app\\T0").unwrap();
        cache.tree("app\\T1").unwrap();
        cache.tree("app\\T0").unwrap();
        cache.tree("app\\T2").unwrap();
        assert!(!cache.contains("app\\T0"));
        assert!(cache.contains("app\\T1"));
    }

    #[test]
    fn test_repeated_requests_share_tree() {
        let cache = TreeCache::new(Arc::new(locator(1)));
        let first = cache.tree("app\\T0").unwrap();
        let second = cache.tree("\\APP\\t0").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut memory = MemoryLocator::new();
        memory.insert("Broken", "<?php class Broken {");
        let cache = TreeCache::new(Arc::new(memory));

        assert!(matches!(cache.tree("Missing"), Err(MetaError::SourceUnavailable { .. })));
        assert!(matches!(cache.tree("Broken"), Err(MetaError::ParseFailure { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = TreeCache::with_capacity(Arc::new(locator(1)), 0);
        cache.tree("app\\T0").unwrap();
        assert!(cache.is_empty());
    }
}
