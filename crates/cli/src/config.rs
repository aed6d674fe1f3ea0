use anyhow::{anyhow, Context, Result};
use autofold_extractor::ExtractorConfig;
use autofold_folding::FoldSettings;
use autofold_topic_model::SamplerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings file read with `--config`; every section is optional.
///
/// ```toml
/// [extractor]
/// fold_line_comments = true
///
/// [sampler]
/// iterations = 2000
/// estimator = "minka"
///
/// [fold]
/// policy = "vsm"
/// compression_ratio = 60.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extractor: ExtractorConfig,
    pub sampler: SamplerConfig,
    pub fold: FoldSettings,
}

impl AppConfig {
    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.extractor
            .validate()
            .map_err(|e| anyhow!("invalid [extractor] config: {e}"))?;
        self.sampler
            .validate()
            .map_err(|e| anyhow!("invalid [sampler] config: {e}"))?;
        self.fold
            .validate()
            .map_err(|e| anyhow!("invalid [fold] config: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofold_folding::PolicyKind;
    use autofold_topic_model::EstimatorKind;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_missing_path_gives_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sampler]\niterations = 20\nestimator = \"minka\"\n\n[fold]\npolicy = \"largest\"\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.sampler.iterations, 20);
        assert_eq!(config.sampler.estimator, EstimatorKind::Minka);
        assert_eq!(config.sampler.burn_in, SamplerConfig::default().burn_in);
        assert_eq!(config.fold.policy, PolicyKind::Largest);
        assert_eq!(config.fold.compression_ratio, 50.0);
        assert_eq!(config.extractor, ExtractorConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_fold_section() {
        let mut config = AppConfig::default();
        config.fold.backoff_topic = 7;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[fold]"), "{err}");
    }
}
