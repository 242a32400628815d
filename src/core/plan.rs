use crate::core::project::Project;
use crate::domain::model::{ContractRequest, Handle, ModuleDescriptor};
use crate::utils::error::{DeployError, Result};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct PlanNode {
    pub request: ContractRequest,
    pub dependencies: BTreeSet<String>,
}

/// 依照參考關係排序好的部署計畫。同一批次內的請求彼此無依賴，可以並行部署
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    module: String,
    nodes: BTreeMap<String, PlanNode>,
    batches: Vec<Vec<String>>,
    exports: BTreeMap<String, BTreeMap<String, Handle>>,
}

impl ExecutionPlan {
    /// 為專案中的某個模組（含其子模組）建立計畫
    pub fn for_module(project: &Project, name: &str) -> Result<Self> {
        let root = project.module(name).ok_or_else(|| {
            DeployError::configuration(format!(
                "Module '{}' is not part of project {}",
                name,
                project.name()
            ))
        })?;

        let mut modules = BTreeMap::new();
        collect_modules(root, &mut modules);

        let requests = modules
            .values()
            .flat_map(|m| m.requests.iter().cloned())
            .collect();
        let exports = modules
            .values()
            .map(|m| (m.name.clone(), m.exports.clone()))
            .collect();

        let mut plan = Self::from_requests(name, requests)?;
        plan.exports = exports;
        Ok(plan)
    }

    pub fn from_requests(module: &str, requests: Vec<ContractRequest>) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        for request in requests {
            let future_id = request.handle.future_id();
            let dependencies = request.dependencies().map(Handle::future_id).collect();
            if nodes
                .insert(
                    future_id.clone(),
                    PlanNode {
                        request,
                        dependencies,
                    },
                )
                .is_some()
            {
                return Err(DeployError::configuration(format!(
                    "Contract '{}' appears twice in the plan",
                    future_id
                )));
            }
        }

        for (future_id, node) in &nodes {
            if let Some(missing) = node.dependencies.iter().find(|d| !nodes.contains_key(*d)) {
                return Err(DeployError::configuration(format!(
                    "Contract '{}' depends on '{}', which is not in the plan",
                    future_id, missing
                )));
            }
        }

        let batches = order_batches(&nodes)?;

        Ok(Self {
            module: module.to_string(),
            nodes,
            batches,
            exports: BTreeMap::new(),
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn batches(&self) -> &[Vec<String>] {
        &self.batches
    }

    pub fn node(&self, future_id: &str) -> Option<&PlanNode> {
        self.nodes.get(future_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 每個模組的 exports，包含子模組
    pub fn exports(&self) -> &BTreeMap<String, BTreeMap<String, Handle>> {
        &self.exports
    }

    /// 部署順序，批次內按名稱排序
    pub fn order(&self) -> Vec<&str> {
        self.batches
            .iter()
            .flat_map(|b| b.iter().map(String::as_str))
            .collect()
    }

    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (index, batch) in self.batches.iter().enumerate() {
            lines.push(format!("Batch #{}", index + 1));
            for future_id in batch {
                if let Some(node) = self.nodes.get(future_id) {
                    let args: Vec<String> = node.request.args.iter().map(|a| a.to_string()).collect();
                    lines.push(format!(
                        "  {} = {}({})",
                        future_id,
                        node.request.artifact,
                        args.join(", ")
                    ));
                }
            }
        }
        lines
    }
}

fn collect_modules<'a>(module: &'a ModuleDescriptor, out: &mut BTreeMap<String, &'a ModuleDescriptor>) {
    if out.contains_key(&module.name) {
        return;
    }
    out.insert(module.name.clone(), module);
    for submodule in &module.submodules {
        collect_modules(submodule, out);
    }
}

// Kahn's algorithm, one batch per round
fn order_batches(nodes: &BTreeMap<String, PlanNode>) -> Result<Vec<Vec<String>>> {
    let mut remaining: BTreeMap<&str, BTreeSet<&str>> = nodes
        .iter()
        .map(|(id, node)| {
            (
                id.as_str(),
                node.dependencies.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let mut batches = Vec::new();
    while !remaining.is_empty() {
        let ready: Vec<&str> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| *id)
            .collect();

        if ready.is_empty() {
            let stuck: Vec<&str> = remaining.keys().copied().collect();
            return Err(DeployError::configuration(format!(
                "Circular dependency between contracts: {}",
                stuck.join(", ")
            )));
        }

        for id in &ready {
            remaining.remove(id);
        }
        for deps in remaining.values_mut() {
            for id in &ready {
                deps.remove(id);
            }
        }

        batches.push(ready.into_iter().map(str::to_string).collect());
    }

    Ok(batches)
}
