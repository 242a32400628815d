use crate::core::builder::build_module;
use crate::domain::model::{ModuleDescriptor, Value};
use crate::utils::error::Result;

pub const MODULE_NAME: &str = "jaricNFTModule";

pub fn module() -> Result<ModuleDescriptor> {
    build_module(MODULE_NAME, |m| {
        let jaric = m.contract("jaricNFT", Vec::<Value>::new());
        Ok([("jaric", jaric)])
    })
}
