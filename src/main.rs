use clap::Parser;
use deploy_modules::config::project_config::DeploymentSection;
use deploy_modules::utils::{logger, validation::Validate};
use deploy_modules::{
    modules, ArtifactRegistry, CliConfig, Command, DeployError, DeploySettings, Deployer,
    DeploymentJournal, DeploymentResult, ExecutionPlan, LocalStorage, Parameters, Project,
    ProjectConfig, SimulatedEngine,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!("❌ {} (category: {:?})", e, e.category());
        eprintln!("❌ {}", e);
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(config: CliConfig) -> Result<(), DeployError> {
    let (project, deployment) = load_project(&config)?;
    let settings = config.settings(&deployment);
    settings.validate()?;

    match &config.command {
        Command::List => {
            list_modules(&project);
            Ok(())
        }
        Command::Plan { module } => {
            let plan = ExecutionPlan::for_module(&project, module)?;
            println!("📋 Execution plan for {} (chain {}):", module, settings.chain_id);
            for line in plan.describe() {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Deploy {
            module,
            reset,
            json,
        } => {
            let plan = ExecutionPlan::for_module(&project, module)?;
            let result = deploy(&plan, &settings, *reset).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display_result(&result);
            }
            Ok(())
        }
    }
}

fn load_project(config: &CliConfig) -> Result<(Project, DeploymentSection), DeployError> {
    match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading project configuration from: {}", path);
            let project_config = ProjectConfig::from_file(path)?;
            let project = project_config.build_project()?;
            Ok((project, project_config.deployment()))
        }
        None => Ok((modules::builtin_project()?, DeploymentSection::default())),
    }
}

async fn deploy(
    plan: &ExecutionPlan,
    settings: &DeploySettings,
    reset: bool,
) -> Result<DeploymentResult, DeployError> {
    let parameters = match &settings.parameters_file {
        Some(path) => Parameters::from_file(path)?,
        None => Parameters::new(),
    };

    let storage = LocalStorage::new(settings.deployments_dir.clone());
    let journal_path = settings.journal_path();
    let mut journal = if reset {
        DeploymentJournal::new()
    } else {
        DeploymentJournal::load(&storage, &journal_path).await?
    };

    let engine = match &settings.artifacts_dir {
        Some(dir) => SimulatedEngine::new(settings.chain_id, ArtifactRegistry::load_dir(dir)?),
        None => {
            tracing::warn!("⚠️ No artifacts directory given; constructor arguments are not checked");
            SimulatedEngine::permissive(settings.chain_id)
        }
    }
    .with_journal(&journal);

    let deployer = Deployer::new(Arc::new(engine))
        .with_parameters(parameters)
        .with_concurrency(settings.concurrency)?;

    let outcome = deployer.execute(plan, &mut journal).await;

    // 失敗時也保存已完成的部分，下次執行可以接續
    journal.save(&storage, &journal_path).await?;
    outcome
}

fn list_modules(project: &Project) {
    println!("📦 Project {} ({} module(s)):", project.name(), project.len());
    for module in project.modules() {
        println!("  {} - {} contract(s)", module.name(), module.requests().len());
        for (key, handle) in module.exports() {
            println!("     {} -> {}", key, handle);
        }
    }
}

fn display_result(result: &DeploymentResult) {
    println!("✅ Deployed module {} on chain {}", result.module, result.chain_id);
    for (module, exports) in &result.exports {
        for (key, address) in exports {
            println!("  {}#{} - {}", module, key, address);
        }
    }
    if !result.skipped.is_empty() {
        println!("⏭️ Reused from previous deployment: {}", result.skipped.join(", "));
    }
    println!("⏱️ Took {:?}", result.duration);
}
