#[cfg(feature = "cli")]
pub mod cli;
pub mod parameters;
pub mod project_config;

use crate::adapters::simulated::LOCAL_CHAIN_ID;
use crate::core::deployer::DEFAULT_CONCURRENCY;
use crate::core::journal::JOURNAL_FILE;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

/// 合併命令列與專案檔後的部署設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySettings {
    pub chain_id: u64,
    pub concurrency: usize,
    pub deployments_dir: String,
    pub artifacts_dir: Option<String>,
    pub parameters_file: Option<String>,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            chain_id: LOCAL_CHAIN_ID,
            concurrency: DEFAULT_CONCURRENCY,
            deployments_dir: "./deployments".to_string(),
            artifacts_dir: None,
            parameters_file: None,
        }
    }
}

impl DeploySettings {
    /// journal 相對於 deployments_dir 的位置
    pub fn journal_path(&self) -> String {
        format!("chain-{}/{}", self.chain_id, JOURNAL_FILE)
    }
}

impl Validate for DeploySettings {
    fn validate(&self) -> Result<()> {
        validate_positive_number("concurrency", self.concurrency, 1)?;
        validate_path("deployments_dir", &self.deployments_dir)?;
        if let Some(dir) = &self.artifacts_dir {
            validate_path("artifacts_dir", dir)?;
        }
        if let Some(file) = &self.parameters_file {
            validate_path("parameters_file", file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = DeploySettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.journal_path(), "chain-31337/deployed_addresses.json");
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let settings = DeploySettings {
            concurrency: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
