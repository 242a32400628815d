pub mod builder;
pub mod deployer;
pub mod journal;
pub mod plan;
pub mod project;

pub use crate::domain::model::{
    ContractRequest, DeployedContract, Handle, Literal, ModuleDescriptor, ResolvedRequest, Value,
};
pub use crate::domain::ports::{DeploymentEngine, Storage};
pub use crate::utils::error::Result;
