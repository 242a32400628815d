use crate::config::project_config::DeploymentSection;
use crate::config::DeploySettings;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "deploy-modules")]
#[command(about = "Declare contract deployment modules and run them against a deployment engine")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Project TOML; the built-in modules are used when omitted
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Directory with compiled contract artifacts (Hardhat JSON)
    #[arg(long, global = true)]
    pub artifacts: Option<String>,

    /// Module parameters JSON file
    #[arg(long, global = true)]
    pub parameters: Option<String>,

    #[arg(long, global = true)]
    pub deployments_dir: Option<String>,

    #[arg(long, global = true)]
    pub chain_id: Option<u64>,

    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the modules of the project and their exports
    List,
    /// Show the execution plan of a module without deploying
    Plan { module: String },
    /// Deploy a module and report the addresses of its exports
    Deploy {
        module: String,

        /// Ignore the journal of previous deployments on this chain
        #[arg(long)]
        reset: bool,

        /// Print the deployment result as JSON
        #[arg(long)]
        json: bool,
    },
}

impl CliConfig {
    /// 命令列參數優先於專案檔的 `[deployment]`
    pub fn settings(&self, deployment: &DeploymentSection) -> DeploySettings {
        let defaults = DeploySettings::default();
        DeploySettings {
            chain_id: self
                .chain_id
                .or(deployment.chain_id)
                .unwrap_or(defaults.chain_id),
            concurrency: self
                .concurrency
                .or(deployment.concurrency)
                .unwrap_or(defaults.concurrency),
            deployments_dir: self
                .deployments_dir
                .clone()
                .or_else(|| deployment.deployments_dir.clone())
                .unwrap_or(defaults.deployments_dir),
            artifacts_dir: self
                .artifacts
                .clone()
                .or_else(|| deployment.artifacts_dir.clone()),
            parameters_file: self
                .parameters
                .clone()
                .or_else(|| deployment.parameters_file.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_project_settings() {
        let cli = CliConfig::parse_from([
            "deploy-modules",
            "deploy",
            "NFTmarketPlaceModule",
            "--chain-id",
            "5",
        ]);
        let deployment = DeploymentSection {
            chain_id: Some(31337),
            concurrency: Some(3),
            ..Default::default()
        };

        let settings = cli.settings(&deployment);
        assert_eq!(settings.chain_id, 5);
        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.deployments_dir, "./deployments");
        assert!(matches!(cli.command, Command::Deploy { ref module, .. } if module == "NFTmarketPlaceModule"));
    }
}
