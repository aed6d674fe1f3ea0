use crate::error::{FoldError, Result};
use crate::policy::{Policy, ProfitOracle};
use crate::vsm::TfScheme;
use autofold_protocol::TermBag;
use autofold_topic_model::{KlDivergenceKind, TopicModel, N_BACKGROUND};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scoring rule selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Profit per cost, profit from the topic model divergence
    #[default]
    Topic,
    /// Profit per cost, profit from cosine similarity to the whole file
    Vsm,
    Shallowest,
    Largest,
    Javadocs,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::Topic,
        PolicyKind::Vsm,
        PolicyKind::Shallowest,
        PolicyKind::Largest,
        PolicyKind::Javadocs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Topic => "topic",
            PolicyKind::Vsm => "vsm",
            PolicyKind::Shallowest => "shallowest",
            PolicyKind::Largest => "largest",
            PolicyKind::Javadocs => "javadocs",
        }
    }

    pub fn needs_model(self) -> bool {
        matches!(self, PolicyKind::Topic)
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = FoldError;

    fn from_str(s: &str) -> Result<Self> {
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                FoldError::configuration(format!(
                    "unknown policy '{s}' (expected topic, vsm, shallowest, largest or javadocs)"
                ))
            })
    }
}

/// File a topic policy scores against, located in a trained model.
#[derive(Debug, Clone, Copy)]
pub struct TopicTarget<'m> {
    pub model: &'m TopicModel,
    pub project: &'m str,
    pub file: &'m str,
}

/// Folding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldSettings {
    pub policy: PolicyKind,

    /// Divergence used by the topic policy (KLDivFile, KLDivProj, KLDivFileMinusProj)
    pub profit: String,

    /// Background topic the query backs off to for unseen terms
    pub backoff_topic: usize,

    /// Share of the file's lines to fold away, in percent
    pub compression_ratio: f64,

    /// Term weighting for the cosine oracle
    pub tf_scheme: TfScheme,
}

impl Default for FoldSettings {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Topic,
            profit: KlDivergenceKind::File.as_str().to_string(),
            backoff_topic: 2,
            compression_ratio: 50.0,
            tf_scheme: TfScheme::Log,
        }
    }
}

impl FoldSettings {
    /// Settings that need no trained model
    pub fn vsm() -> Self {
        Self {
            policy: PolicyKind::Vsm,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.profit_kind().map_err(|e| e.to_string())?;

        if self.backoff_topic >= N_BACKGROUND {
            return Err(format!(
                "backoff_topic must be < {N_BACKGROUND}, got {}",
                self.backoff_topic
            ));
        }

        if !(self.compression_ratio.is_finite() && (0.0..=100.0).contains(&self.compression_ratio))
        {
            return Err(format!(
                "compression_ratio must be within 0..=100, got {}",
                self.compression_ratio
            ));
        }

        Ok(())
    }

    pub fn profit_kind(&self) -> Result<KlDivergenceKind> {
        self.profit
            .parse()
            .map_err(|e| FoldError::configuration(format!("{e}")))
    }

    /// Line budget for a file of `loc` lines.
    pub fn budget_for(&self, loc: usize) -> Result<usize> {
        budget_for_compression(loc, self.compression_ratio)
    }

    /// Builds the configured policy, rejecting bad settings before any
    /// scoring state is computed.
    pub fn build_policy<'m>(
        &self,
        file_terms: &TermBag,
        target: Option<TopicTarget<'m>>,
    ) -> Result<Policy<'m>> {
        self.validate().map_err(FoldError::configuration)?;

        Ok(match self.policy {
            PolicyKind::Topic => {
                let target = target.ok_or_else(|| {
                    FoldError::configuration("the topic policy needs a trained model")
                })?;
                Policy::ProfitPerCost(ProfitOracle::topic(
                    target.model,
                    self.profit_kind()?,
                    self.backoff_topic,
                    target.project,
                    target.file,
                )?)
            }
            PolicyKind::Vsm => Policy::ProfitPerCost(ProfitOracle::cosine(file_terms, self.tf_scheme)),
            PolicyKind::Shallowest => Policy::ShallowestFirst,
            PolicyKind::Largest => Policy::LargestFirst,
            PolicyKind::Javadocs => Policy::JavadocsFirst,
        })
    }
}

/// `⌊loc × (100 − ratio) / 100⌋` lines: `ratio` percent of the file is
/// folded away.
pub fn budget_for_compression(loc: usize, ratio_percent: f64) -> Result<usize> {
    if !(ratio_percent.is_finite() && (0.0..=100.0).contains(&ratio_percent)) {
        return Err(FoldError::configuration(format!(
            "compression ratio must be within 0..=100, got {ratio_percent}"
        )));
    }
    Ok((loc as f64 * (100.0 - ratio_percent) / 100.0).floor() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = FoldSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.profit_kind().unwrap(), KlDivergenceKind::File);
        assert_eq!(settings.backoff_topic, 2);
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = FoldSettings::default();
        settings.profit = "Cosine".to_string();
        assert!(settings.validate().is_err());

        let mut settings = FoldSettings::default();
        settings.backoff_topic = 3;
        assert!(settings.validate().is_err());

        let mut settings = FoldSettings::default();
        settings.compression_ratio = 120.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_build_policy_rejects_before_computing() {
        let mut settings = FoldSettings::vsm();
        settings.backoff_topic = 7;
        let err = settings.build_policy(&TermBag::new(), None).err().unwrap();
        assert!(matches!(err, FoldError::Configuration(_)));

        let err = FoldSettings::default()
            .build_policy(&TermBag::new(), None)
            .err()
            .unwrap();
        assert!(matches!(err, FoldError::Configuration(_)));
    }

    #[test]
    fn test_build_static_policies() {
        let bag = TermBag::new();
        for (kind, name) in [
            (PolicyKind::Vsm, "profit-per-cost/cosine"),
            (PolicyKind::Shallowest, "shallowest-first"),
            (PolicyKind::Largest, "largest-first"),
            (PolicyKind::Javadocs, "javadocs-first"),
        ] {
            let settings = FoldSettings {
                policy: kind,
                ..Default::default()
            };
            assert_eq!(settings.build_policy(&bag, None).unwrap().name(), name);
        }
    }

    #[test]
    fn test_policy_kind_parse() {
        for kind in PolicyKind::ALL {
            assert_eq!(kind.as_str().parse::<PolicyKind>().unwrap(), kind);
        }
        assert!("greedy".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_budget_for_compression() {
        assert_eq!(budget_for_compression(10, 50.0).unwrap(), 5);
        assert_eq!(budget_for_compression(7, 50.0).unwrap(), 3);
        assert_eq!(budget_for_compression(10, 30.0).unwrap(), 7);
        assert_eq!(budget_for_compression(120, 0.0).unwrap(), 120);
        assert_eq!(budget_for_compression(120, 100.0).unwrap(), 0);
        assert!(budget_for_compression(10, -1.0).is_err());
        assert!(budget_for_compression(10, f64::NAN).is_err());
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: FoldSettings = serde_json::from_str(
            r#"{"policy": "largest", "compression_ratio": 30.0, "tf_scheme": "log_average"}"#,
        )
        .unwrap();
        assert_eq!(settings.policy, PolicyKind::Largest);
        assert_eq!(settings.tf_scheme, TfScheme::LogAverage);
        assert_eq!(settings.profit, "KLDivFile");
    }
}
