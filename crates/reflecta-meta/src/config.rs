//! Options (reflecta.toml)
//!
//! ```toml
//! mode = "auto"
//! cache-capacity = 16
//! computed-key = "eval"
//! max-eval-depth = 256
//!
//! [sources]
//! roots = ["src/main/php", "vendor"]
//! extensions = ["php"]
//! ```

use crate::cache::DEFAULT_CAPACITY;
use crate::error::{MetaError, MetaResult};
use crate::eval::DEFAULT_MAX_DEPTH;
use crate::source::DEFAULT_COMPUTED_KEY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which annotation source to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceMode {
    /// Attribute tables when the host supplies them, else syntax trees
    #[default]
    Auto,
    SyntaxTree,
    Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MetaOptions {
    #[serde(default)]
    pub mode: SourceMode,

    /// Number of parsed syntax trees kept (0 disables caching)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Argument name marking a computed annotation value
    #[serde(default = "default_computed_key")]
    pub computed_key: String,

    #[serde(default = "default_max_eval_depth")]
    pub max_eval_depth: usize,

    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Where the file system locator looks for declaring files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_computed_key() -> String {
    DEFAULT_COMPUTED_KEY.to_string()
}

fn default_max_eval_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_extensions() -> Vec<String> {
    vec!["php".to_string()]
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: default_extensions(),
        }
    }
}

impl Default for MetaOptions {
    fn default() -> Self {
        Self {
            mode: SourceMode::default(),
            cache_capacity: default_cache_capacity(),
            computed_key: default_computed_key(),
            max_eval_depth: default_max_eval_depth(),
            sources: SourcesConfig::default(),
        }
    }
}

impl MetaOptions {
    /// Read options from a TOML file.
    pub fn load(path: &Path) -> MetaResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| MetaError::Options(format!("{}: {}", path.display(), err)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> MetaResult<Self> {
        let options: MetaOptions =
            toml::from_str(content).map_err(|err| MetaError::Options(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> MetaResult<()> {
        if self.computed_key.is_empty() {
            return Err(MetaError::Options("computed-key cannot be empty".to_string()));
        }
        if self.max_eval_depth == 0 {
            return Err(MetaError::Options("max-eval-depth must be at least 1".to_string()));
        }
        if let Some(ext) = self
            .sources
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(MetaError::Options(format!(
                "Invalid extension {:?}: expected a bare extension such as \"php\"",
                ext
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = MetaOptions::from_toml_str("").unwrap();
        assert_eq!(options, MetaOptions::default());
        assert_eq!(options.cache_capacity, 16);
        assert_eq!(options.computed_key, "eval");
        assert_eq!(options.mode, SourceMode::Auto);
        assert_eq!(options.sources.extensions, ["php"]);
    }

    #[test]
    fn test_full_document() {
        let options = MetaOptions::from_toml_str(
            r#"
mode = "syntax-tree"
cache-capacity = 4
computed-key = "expr"
max-eval-depth = 32

[sources]
roots = ["src", "vendor"]
extensions = ["php", "class.php"]
"#,
        )
        .unwrap();
        assert_eq!(options.mode, SourceMode::SyntaxTree);
        assert_eq!(options.cache_capacity, 4);
        assert_eq!(options.computed_key, "expr");
        assert_eq!(options.max_eval_depth, 32);
        assert_eq!(options.sources.roots, [PathBuf::from("src"), PathBuf::from("vendor")]);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(MetaOptions::from_toml_str("mode = \"bytecode\""), Err(MetaError::Options(_))));
        assert!(matches!(MetaOptions::from_toml_str("unknown = 1"), Err(MetaError::Options(_))));
        assert!(matches!(MetaOptions::from_toml_str("computed-key = \"\""), Err(MetaError::Options(_))));
        assert!(matches!(
            MetaOptions::from_toml_str("[sources]\nextensions = [\".php\"]"),
            Err(MetaError::Options(_))
        ));
    }
}
