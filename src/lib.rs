pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod modules;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{
    artifacts::{Artifact, ArtifactRegistry},
    simulated::SimulatedEngine,
    storage::LocalStorage,
};
pub use config::{parameters::Parameters, project_config::ProjectConfig, DeploySettings};
pub use core::{
    builder::{build_module, ModuleBuilder},
    deployer::{Deployer, DeploymentResult},
    journal::DeploymentJournal,
    plan::ExecutionPlan,
    project::Project,
};
pub use domain::model::{Handle, Literal, ModuleDescriptor, Value};
pub use utils::error::{DeployError, Result};
