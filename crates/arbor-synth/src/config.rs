use std::path::Path;

use serde::{Deserialize, Serialize};

use arbor_mwis::MwisConfig;
use arbor_select::{NodeSelectionStrategy, StrategyKind, DEFAULT_MAX_PRODUCT_SIZE};
use arbor_types::EdgeKind;

use crate::error::{ConfigError, ConfigResult};
use crate::ranking::RankingCriterion;

/// Configuration for a synthesis run.
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Which per-node selection strategy to run.
    pub strategy: StrategyKind,
    /// Edge kinds traversed and considered for selection.
    pub edge_kinds: Vec<EdgeKind>,
    /// When `true`, cycles are broken by excluding their least trusted
    /// edges instead of failing the run.
    pub break_cycles: bool,
    /// Largest combination count enumerated for one product of edge sets
    /// during augmenting search; larger products are solved by MWIS.
    pub max_product_size: u64,
    /// Independent-set solver settings.
    pub mwis: MwisConfig,
    /// How source ranks are derived from source metadata. When absent the
    /// ranks stored on the edges are used as-is.
    pub ranking: Option<RankingCriterion>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            edge_kinds: EdgeKind::ALL.to_vec(),
            break_cycles: false,
            max_product_size: DEFAULT_MAX_PRODUCT_SIZE,
            mwis: MwisConfig::default(),
            ranking: None,
        }
    }
}

impl SynthesisConfig {
    /// Defaults with a different strategy.
    pub fn with_strategy(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Defaults, but cyclic graphs are repaired instead of rejected.
    pub fn lenient() -> Self {
        Self {
            break_cycles: true,
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.edge_kinds.is_empty() {
            return Err(ConfigError::Invalid("edge_kinds must not be empty".into()));
        }
        for (i, kind) in self.edge_kinds.iter().enumerate() {
            if self.edge_kinds[..i].contains(kind) {
                return Err(ConfigError::Invalid(format!("edge kind {kind} listed twice")));
            }
        }
        if self.max_product_size == 0 {
            return Err(ConfigError::Invalid("max_product_size must be at least 1".into()));
        }
        if self.mwis.exact_threshold > arbor_mwis::BitMask::CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "mwis.exact_threshold must be at most {}",
                arbor_mwis::BitMask::CAPACITY
            )));
        }
        match &self.ranking {
            Some(criterion) if criterion.property().trim().is_empty() => {
                Err(ConfigError::Invalid("ranking.property must not be empty".into()))
            }
            Some(RankingCriterion::PriorityList { values, .. }) if values.is_empty() => Err(
                ConfigError::Invalid("ranking.values must list at least one value".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Instantiate the configured strategy.
    pub fn build_strategy(&self) -> Box<dyn NodeSelectionStrategy> {
        self.strategy.build(&self.mwis, self.max_product_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::SortOrder;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SynthesisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.strategy, StrategyKind::RankedAugmentingSearch);
        assert_eq!(config.edge_kinds, EdgeKind::ALL.to_vec());
        assert!(!config.break_cycles);
        assert!(SynthesisConfig::lenient().break_cycles);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SynthesisConfig::from_toml_str(
            r#"
            strategy = "rank-priority"

            [mwis]
            exact_threshold = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyKind::RankPriority);
        assert_eq!(config.mwis.exact_threshold, 10);
        assert_eq!(config.max_product_size, DEFAULT_MAX_PRODUCT_SIZE);
        assert!(config.ranking.is_none());
    }

    #[test]
    fn ranking_section_parses() {
        let config = SynthesisConfig::from_toml_str(
            r#"
            [ranking]
            kind = "property"
            property = "year"
            order = "decreasing"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.ranking,
            Some(RankingCriterion::by_property("year", SortOrder::Decreasing))
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let empty_kinds = SynthesisConfig::from_toml_str("edge_kinds = []");
        assert!(matches!(empty_kinds, Err(ConfigError::Invalid(_))));

        let repeated = SynthesisConfig::from_toml_str(r#"edge_kinds = ["taxonomy", "taxonomy"]"#);
        assert!(matches!(repeated, Err(ConfigError::Invalid(_))));

        let zero = SynthesisConfig::from_toml_str("max_product_size = 0");
        assert!(matches!(zero, Err(ConfigError::Invalid(_))));

        let unknown = SynthesisConfig::from_toml_str(r#"strategy = "fastest""#);
        assert!(matches!(unknown, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = SynthesisConfig::with_strategy(StrategyKind::MwisOnly);
        config.ranking = Some(RankingCriterion::by_property("year", SortOrder::Increasing));
        let text = config.to_toml_string().unwrap();
        assert_eq!(SynthesisConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "break_cycles = true").unwrap();
        let config = SynthesisConfig::load(file.path()).unwrap();
        assert!(config.break_cycles);

        let missing = SynthesisConfig::load(file.path().with_extension("absent"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn builds_the_configured_strategy() {
        let config = SynthesisConfig::with_strategy(StrategyKind::RankPriorityInferredPath);
        assert_eq!(config.build_strategy().name(), "rank-priority-inferred-path");
    }
}
