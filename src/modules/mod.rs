// Built-in deployment modules, one descriptor per file.

pub mod jaric_nft;
pub mod nft_market;

use crate::core::project::Project;
use crate::utils::error::Result;

pub const PROJECT_NAME: &str = "nft-marketplace";

/// 內建模組組成的專案
pub fn builtin_project() -> Result<Project> {
    Project::new(PROJECT_NAME)
        .with_module(nft_market::module()?)?
        .with_module(jaric_nft::module()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_project() {
        let project = builtin_project().unwrap();
        let names: Vec<&str> = project.modules().map(|m| m.name()).collect();
        assert_eq!(names, vec!["NFTmarketPlaceModule", "jaricNFTModule"]);
    }
}
