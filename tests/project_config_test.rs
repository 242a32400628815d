use anyhow::Result;
use deploy_modules::{
    ArtifactRegistry, Deployer, DeploymentJournal, ExecutionPlan, Parameters, ProjectConfig,
    SimulatedEngine,
};
use std::sync::Arc;
use tempfile::TempDir;

const PROJECT_TOML: &str = r#"
[project]
name = "nft-marketplace"
description = "Marketplace with an explicit fee recipient"

[deployment]
chain_id = 31337
concurrency = 2

[[modules]]
name = "jaricNFTModule"

[[modules.contracts]]
artifact = "jaricNFT"

[modules.exports]
jaric = "jaricNFT"

[[modules]]
name = "NFTmarketPlaceModule"
uses = ["jaricNFTModule"]

[[modules.contracts]]
artifact = "NFTMarket"
args = [{ param = "listingFee", default = 100 }, { param = "feeRecipient" }]

[modules.exports]
NFTMarket = "NFTMarket"
jaric = "jaricNFTModule#jaric"
"#;

const MARKET_ARTIFACT: &str = r#"{
    "contractName": "NFTMarket",
    "abi": [
        {
            "type": "constructor",
            "inputs": [
                { "name": "_listingFee", "type": "uint256" },
                { "name": "_feeRecipient", "type": "address" }
            ]
        }
    ]
}"#;

const JARIC_ARTIFACT: &str = r#"{ "contractName": "jaricNFT", "abi": [] }"#;

fn write_fixtures(dir: &TempDir) -> Result<()> {
    let artifacts = dir.path().join("artifacts");
    std::fs::create_dir_all(&artifacts)?;
    std::fs::write(artifacts.join("NFTMarket.json"), MARKET_ARTIFACT)?;
    std::fs::write(artifacts.join("jaricNFT.json"), JARIC_ARTIFACT)?;
    std::fs::write(dir.path().join("project.toml"), PROJECT_TOML)?;
    std::fs::write(
        dir.path().join("parameters.json"),
        r#"{ "NFTmarketPlaceModule": { "feeRecipient": { "address": "0x64BA35F47326A8F356888440eB6159863b5B66d6" } } }"#,
    )?;
    Ok(())
}

#[tokio::test]
async fn test_project_file_deploys_with_parameters() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_fixtures(&temp_dir)?;

    let config = ProjectConfig::from_file(temp_dir.path().join("project.toml"))?;
    let project = config.build_project()?;
    let plan = ExecutionPlan::for_module(&project, "NFTmarketPlaceModule")?;
    assert_eq!(plan.len(), 2);

    let registry = ArtifactRegistry::load_dir(temp_dir.path().join("artifacts"))?;
    let engine = Arc::new(SimulatedEngine::new(31337, registry));
    let parameters = Parameters::from_file(temp_dir.path().join("parameters.json"))?;

    let mut journal = DeploymentJournal::new();
    let result = Deployer::new(engine)
        .with_parameters(parameters)
        .with_concurrency(config.deployment().concurrency.unwrap_or(1))?
        .execute(&plan, &mut journal)
        .await?;

    assert_eq!(result.deployed.len(), 2);
    let market_exports = &result.exports["NFTmarketPlaceModule"];
    assert_eq!(
        market_exports.keys().cloned().collect::<Vec<_>>(),
        vec!["NFTMarket".to_string(), "jaric".to_string()]
    );
    assert_eq!(
        result.export_address("NFTmarketPlaceModule", "jaric"),
        result.export_address("jaricNFTModule", "jaric")
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_parameter_is_reported() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_fixtures(&temp_dir)?;

    let project = ProjectConfig::from_file(temp_dir.path().join("project.toml"))?.build_project()?;
    let plan = ExecutionPlan::for_module(&project, "NFTmarketPlaceModule")?;
    let engine = Arc::new(SimulatedEngine::permissive(31337));

    let mut journal = DeploymentJournal::new();
    let error = Deployer::new(engine)
        .execute(&plan, &mut journal)
        .await
        .expect_err("feeRecipient has no default");
    assert!(error.to_string().contains("feeRecipient"));
    // 同一批次的 jaricNFT 也不會被部署
    assert!(journal.is_empty());
    Ok(())
}
