//! Lattice policy configuration
//!
//! Loads a YAML policy declaring principals, named levels and file channels:
//!
//! ```yaml
//! principals: [alice, bob, carol]
//! levels:
//!   public: []
//!   alice_only: [alice]
//!   team: [alice, bob]
//!   everyone: top
//! channels:
//!   inbox:  { path: data/inbox.txt, level: alice_only }
//!   report: { path: out/report.txt, level: team }
//! ```
//!
//! Wherever a level name is expected, the keywords `bot` and `top` are also
//! accepted. They are reserved and cannot name a level.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use label_types::Level;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dynamic::{self, DynSink, DynSource};
use crate::error::ConfigError;

/// Environment variable naming the policy file
pub const CONFIG_ENV: &str = "LIO_CONFIG";

/// Policy file used when [`CONFIG_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "lattice.yaml";

const BOT_KEYWORD: &str = "bot";
const TOP_KEYWORD: &str = "top";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub principals: Vec<String>,
    #[serde(default)]
    pub levels: BTreeMap<String, LevelSpec>,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

/// A named level: either a keyword or an explicit principal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    Keyword(String),
    Principals(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub path: PathBuf,
    pub level: String,
}

impl LatticeConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: LatticeConfig =
            serde_yaml::from_str(content).context("Failed to parse lattice policy")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading lattice policy from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: LatticeConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid lattice policy in {}", path.display()))?;

        info!(
            "Loaded {} principals, {} levels, {} channels",
            config.principals.len(),
            config.levels.len(),
            config.channels.len()
        );
        Ok(config)
    }

    /// Load from `LIO_CONFIG`, or `lattice.yaml` in the working directory.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for principal in &self.principals {
            if !seen.insert(principal.as_str()) {
                return Err(ConfigError::DuplicatePrincipal(principal.clone()));
            }
        }

        for (name, spec) in &self.levels {
            if name == BOT_KEYWORD || name == TOP_KEYWORD {
                return Err(ConfigError::ReservedLevelName(name.clone()));
            }
            self.resolve_spec(name, spec)?;
        }

        for channel in self.channels.values() {
            self.level(&channel.level)?;
        }
        Ok(())
    }

    /// Resolve a level name (or `bot`/`top`) to its run-time level.
    pub fn level(&self, name: &str) -> std::result::Result<Level, ConfigError> {
        match name {
            BOT_KEYWORD => Ok(Level::bot()),
            TOP_KEYWORD => Ok(Level::top()),
            _ => {
                let spec = self
                    .levels
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownLevel(name.to_string()))?;
                self.resolve_spec(name, spec)
            }
        }
    }

    pub fn channel(&self, name: &str) -> std::result::Result<&ChannelConfig, ConfigError> {
        self.channels
            .get(name)
            .ok_or_else(|| ConfigError::UnknownChannel(name.to_string()))
    }

    pub fn channel_level(&self, name: &str) -> std::result::Result<Level, ConfigError> {
        self.level(&self.channel(name)?.level)
    }

    /// A file source reading the named channel at its configured level.
    pub fn source(&self, name: &str) -> std::result::Result<DynSource<String>, ConfigError> {
        let channel = self.channel(name)?;
        Ok(dynamic::file_source(self.level(&channel.level)?, &channel.path))
    }

    /// A file sink writing the named channel at its configured level.
    pub fn sink(&self, name: &str) -> std::result::Result<DynSink<String>, ConfigError> {
        let channel = self.channel(name)?;
        Ok(dynamic::file_sink(self.level(&channel.level)?, &channel.path))
    }

    fn resolve_spec(
        &self,
        name: &str,
        spec: &LevelSpec,
    ) -> std::result::Result<Level, ConfigError> {
        match spec {
            LevelSpec::Keyword(keyword) => match keyword.as_str() {
                BOT_KEYWORD => Ok(Level::bot()),
                TOP_KEYWORD => Ok(Level::top()),
                _ => Err(ConfigError::UnknownKeyword {
                    level: name.to_string(),
                    keyword: keyword.clone(),
                }),
            },
            LevelSpec::Principals(members) => {
                if let Some(unknown) = members.iter().find(|p| !self.principals.contains(p)) {
                    return Err(ConfigError::UnknownPrincipal {
                        level: name.to_string(),
                        principal: unknown.clone(),
                    });
                }
                Ok(Level::from_principals(members.iter().map(String::as_str)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r#"
principals: [alice, bob, carol]
levels:
  public: []
  alice_only: [alice]
  team: [alice, bob]
  everyone: top
channels:
  inbox:  { path: data/inbox.txt, level: alice_only }
  report: { path: out/report.txt, level: team }
"#;

    #[test]
    fn parses_levels_and_channels() {
        let config = LatticeConfig::from_yaml_str(POLICY).unwrap();
        assert_eq!(config.principals, vec!["alice", "bob", "carol"]);
        assert_eq!(config.level("public").unwrap(), Level::bot());
        assert_eq!(config.level("everyone").unwrap(), Level::top());
        assert_eq!(
            config.level("team").unwrap(),
            Level::from_principals(["alice", "bob"])
        );
        assert_eq!(
            config.channel("inbox").unwrap().path,
            PathBuf::from("data/inbox.txt")
        );
        assert_eq!(
            config.channel_level("report").unwrap(),
            Level::from_principals(["alice", "bob"])
        );
    }

    #[test]
    fn keywords_resolve_without_definition() {
        let config = LatticeConfig::from_yaml_str("principals: [alice]").unwrap();
        assert_eq!(config.level("bot").unwrap(), Level::bot());
        assert_eq!(config.level("top").unwrap(), Level::top());
    }

    #[test]
    fn rejects_duplicate_principals() {
        let config = LatticeConfig {
            principals: vec!["alice".into(), "alice".into()],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicatePrincipal("alice".into()))
        );
    }

    #[test]
    fn rejects_undeclared_principal() {
        let err = LatticeConfig::from_yaml_str("principals: [alice]\nlevels:\n  odd: [mallory]\n")
            .unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(
            config_err,
            &ConfigError::UnknownPrincipal {
                level: "odd".into(),
                principal: "mallory".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_keyword() {
        let err = LatticeConfig::from_yaml_str("principals: []\nlevels:\n  weird: secret\n")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownKeyword { .. })
        ));
    }

    #[test]
    fn rejects_levels_named_like_keywords() {
        let yaml = "principals: [alice]\n\
                    levels:\n  top: [alice]\n\
                    channels:\n  vault: { path: v.txt, level: top }\n";
        let err = LatticeConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ReservedLevelName("top".into()))
        );

        let config = LatticeConfig {
            principals: vec!["alice".into()],
            levels: BTreeMap::from([(
                "bot".to_string(),
                LevelSpec::Principals(vec!["alice".into()]),
            )]),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ReservedLevelName("bot".into()))
        );
    }

    #[test]
    fn rejects_channel_with_undefined_level() {
        let yaml = "principals: [alice]\nchannels:\n  out: { path: x.txt, level: nowhere }\n";
        let err = LatticeConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownLevel("nowhere".into()))
        );
    }

    #[test]
    fn unknown_lookups_are_errors() {
        let config = LatticeConfig::from_yaml_str(POLICY).unwrap();
        assert_eq!(
            config.level("boss").unwrap_err(),
            ConfigError::UnknownLevel("boss".into())
        );
        assert_eq!(
            config.channel_level("outbox").unwrap_err(),
            ConfigError::UnknownChannel("outbox".into())
        );
    }

    #[test]
    fn load_reads_a_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lattice.yaml");
        std::fs::write(&path, POLICY).unwrap();
        let config = LatticeConfig::load(&path).unwrap();
        assert_eq!(config.channels.len(), 2);
    }

    #[test]
    fn load_reports_the_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let err = LatticeConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
