use crate::dsl::TokenizerOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of records evaluated per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Filter settings loaded from a YAML file and `BOOLEVAL_*` environment variables.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FilterConfig {
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(flatten)]
    pub options: TokenizerOptions,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl FilterConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix("BOOLEVAL").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn tokenizer_options(&self) -> TokenizerOptions {
        self.options
    }
}

/// Effective settings after merging CLI flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub expression: String,
    pub options: TokenizerOptions,
    pub batch_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            expression: String::new(),
            options: TokenizerOptions::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// CLI values win over file values; a missing expression is the empty filter.
    pub fn resolve(
        file: Option<FilterConfig>,
        expression: Option<String>,
        case_insensitive: bool,
        batch_size: Option<usize>,
    ) -> Self {
        let file = file.unwrap_or_default();
        let options = TokenizerOptions {
            case_insensitive: case_insensitive || file.tokenizer_options().case_insensitive,
        };

        Self {
            expression: expression.or(file.expression).unwrap_or_default(),
            options,
            batch_size: batch_size
                .or(file.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE)
                .max(1),
        }
    }
}
