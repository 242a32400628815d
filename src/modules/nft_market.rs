use crate::core::builder::build_module;
use crate::domain::model::ModuleDescriptor;
use crate::utils::error::Result;

pub const MODULE_NAME: &str = "NFTmarketPlaceModule";
pub const INITIAL_LISTING_FEE: u64 = 100;
// Reads like an account index rather than an address; the engine rejects
// it when the artifact declares `address _feeRecipient`.
pub const INITIAL_FEE_RECIPIENT: u64 = 20;

/// NFT 市集：`NFTMarket(listingFee, feeRecipient)`
pub fn module() -> Result<ModuleDescriptor> {
    tracing::warn!(
        "{} passes fee recipient {} as a number, not an address",
        MODULE_NAME,
        INITIAL_FEE_RECIPIENT
    );

    build_module(MODULE_NAME, |m| {
        let market = m.contract(
            "NFTMarket",
            [INITIAL_LISTING_FEE, INITIAL_FEE_RECIPIENT],
        );
        Ok([("NFTMarket", market)])
    })
}
