use crate::domain::model::ModuleDescriptor;
use crate::utils::error::{DeployError, Result};
use std::collections::BTreeMap;

/// 部署專案：明確收集所有模組描述，取代全域註冊表
#[derive(Debug, Clone, Default)]
pub struct Project {
    name: String,
    modules: BTreeMap<String, ModuleDescriptor>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 加入模組及其使用的子模組；同名但內容不同的模組會被拒絕
    ///
    /// 先檢查整個子模組樹，全部通過後才寫入，失敗時專案保持不變。
    pub fn add(&mut self, module: ModuleDescriptor) -> Result<()> {
        let mut pending = BTreeMap::new();
        self.collect(&module, &mut pending)?;

        for (name, descriptor) in pending {
            tracing::debug!("Registered module {} in project {}", name, self.name);
            self.modules.insert(name, descriptor);
        }
        Ok(())
    }

    fn collect(
        &self,
        module: &ModuleDescriptor,
        pending: &mut BTreeMap<String, ModuleDescriptor>,
    ) -> Result<()> {
        for submodule in &module.submodules {
            self.collect(submodule, pending)?;
        }

        let existing = match self.modules.get(&module.name) {
            Some(registered) => Some(registered),
            None => pending.get(&module.name),
        };
        match existing {
            Some(existing) if existing == module => {
                tracing::debug!("Module {} already registered", module.name);
                Ok(())
            }
            Some(_) => Err(DeployError::configuration(format!(
                "Module name '{}' is declared more than once in project {}",
                module.name, self.name
            ))),
            None => {
                pending.insert(module.name.clone(), module.clone());
                Ok(())
            }
        }
    }

    pub fn with_module(mut self, module: ModuleDescriptor) -> Result<Self> {
        self.add(module)?;
        Ok(self)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
