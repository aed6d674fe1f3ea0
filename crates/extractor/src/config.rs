use serde::{Deserialize, Serialize};

/// Controls which regions and terms the extractor produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Split identifiers on camelCase and underscores
    pub split_tokens: bool,

    /// Add the words of comments and docstrings to the term bags
    pub tokenize_comments: bool,

    /// Fold runs of plain line comments into one region
    pub fold_line_comments: bool,

    /// Fold runs of field declarations into one region
    pub conflate_fields: bool,

    /// Fold runs of import statements into one region
    pub fold_imports: bool,

    /// Terms shorter than this many characters are dropped
    pub min_term_len: usize,

    /// Files larger than this are skipped (0 = no limit)
    pub max_file_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            split_tokens: true,
            tokenize_comments: true,
            fold_line_comments: false,
            conflate_fields: true,
            fold_imports: true,
            min_term_len: 1,
            max_file_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ExtractorConfig {
    /// Identifiers only, no comment words
    pub fn code_only() -> Self {
        Self {
            tokenize_comments: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_term_len == 0 {
            return Err("min_term_len must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.split_tokens);
        assert!(config.tokenize_comments);
        assert!(!config.fold_line_comments);
    }

    #[test]
    fn test_zero_term_length_rejected() {
        let config = ExtractorConfig {
            min_term_len: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
