use crate::core::builder::build_module;
use crate::core::project::Project;
use crate::domain::model::{Handle, Literal, ModuleDescriptor, Value};
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{
    validate_address, validate_identifier, validate_non_empty_string, validate_path,
    validate_positive_number, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern compiles"));

/// TOML 專案檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    pub deployment: Option<DeploymentSection>,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentSection {
    pub chain_id: Option<u64>,
    pub concurrency: Option<usize>,
    pub deployments_dir: Option<String>,
    pub artifacts_dir: Option<String>,
    pub parameters_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default)]
    pub contracts: Vec<ContractConfig>,
    /// export 名稱 -> 本模組合約 ID 或 `Module#export`
    #[serde(default)]
    pub exports: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    pub id: Option<String>,
    pub artifact: String,
    #[serde(default)]
    pub args: Vec<ArgConfig>,
}

impl ContractConfig {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.artifact)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarConfig {
    Integer(i64),
    Bool(bool),
    Text(String),
}

impl From<&ScalarConfig> for Literal {
    fn from(value: &ScalarConfig) -> Self {
        match value {
            ScalarConfig::Integer(n) => Literal::Number(*n as i128),
            ScalarConfig::Bool(b) => Literal::Bool(*b),
            ScalarConfig::Text(s) => Literal::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgConfig {
    Scalar(ScalarConfig),
    Address {
        address: String,
    },
    Reference {
        #[serde(rename = "ref")]
        reference: String,
    },
    Parameter {
        param: String,
        default: Option<ScalarConfig>,
    },
}

impl ProjectConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${FEE_RECIPIENT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn deployment(&self) -> DeploymentSection {
        self.deployment.clone().unwrap_or_default()
    }

    /// 依 `uses` 排序，被引用的模組先建構
    fn build_order(&self) -> Vec<&ModuleConfig> {
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        for module in &self.modules {
            self.visit(module, &mut visited, &mut ordered);
        }
        ordered
    }

    fn visit<'a>(
        &'a self,
        module: &'a ModuleConfig,
        visited: &mut HashSet<&'a str>,
        ordered: &mut Vec<&'a ModuleConfig>,
    ) {
        if !visited.insert(module.name.as_str()) {
            return;
        }
        for used in &module.uses {
            if let Some(dep) = self.module(used) {
                self.visit(dep, visited, ordered);
            }
        }
        ordered.push(module);
    }

    fn has_circular_uses(
        &self,
        module_name: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
    ) -> bool {
        visited.insert(module_name.to_string());
        rec_stack.insert(module_name.to_string());

        if let Some(module) = self.module(module_name) {
            for used in &module.uses {
                if !visited.contains(used) {
                    if self.has_circular_uses(used, visited, rec_stack) {
                        return true;
                    }
                } else if rec_stack.contains(used) {
                    return true;
                }
            }
        }

        rec_stack.remove(module_name);
        false
    }

    /// 把 TOML 中宣告的模組建構成描述並組成專案
    pub fn build_project(&self) -> Result<Project> {
        self.validate()?;

        let mut built: BTreeMap<String, ModuleDescriptor> = BTreeMap::new();
        let mut project = Project::new(self.project.name.clone());

        for module in self.build_order() {
            let descriptor = build_configured_module(module, &built)?;
            built.insert(module.name.clone(), descriptor.clone());
            project.add(descriptor)?;
        }

        tracing::info!(
            "📋 Project {} assembled with {} module(s)",
            project.name(),
            project.len()
        );
        Ok(project)
    }
}

fn build_configured_module(
    module: &ModuleConfig,
    built: &BTreeMap<String, ModuleDescriptor>,
) -> Result<ModuleDescriptor> {
    build_module(module.name.clone(), |m| {
        let mut used_exports: BTreeMap<String, BTreeMap<String, Handle>> = BTreeMap::new();
        for used in &module.uses {
            let descriptor = built.get(used).ok_or_else(|| {
                DeployError::configuration(format!(
                    "Module {} uses unknown module {}",
                    module.name, used
                ))
            })?;
            used_exports.insert(used.clone(), m.use_module(descriptor));
        }

        let mut local: BTreeMap<String, Handle> = BTreeMap::new();
        let lookup = |local: &BTreeMap<String, Handle>, reference: &str| -> Result<Handle> {
            let found = match reference.split_once('#') {
                Some((used, key)) => used_exports.get(used).and_then(|e| e.get(key)),
                None => local.get(reference),
            };
            found.cloned().ok_or_else(|| {
                DeployError::configuration(format!(
                    "Module {} references '{}', which is not a previously declared contract or an export of a used module",
                    module.name, reference
                ))
            })
        };

        for contract in &module.contracts {
            let mut args = Vec::with_capacity(contract.args.len());
            for arg in &contract.args {
                let value = match arg {
                    ArgConfig::Scalar(scalar) => Value::Literal(Literal::from(scalar)),
                    ArgConfig::Address { address } => Value::address(address.clone()),
                    ArgConfig::Reference { reference } => Value::Reference(lookup(&local, reference.as_str())?),
                    ArgConfig::Parameter { param, default } => match default {
                        Some(default) => m.parameter_or(param.clone(), Literal::from(default)),
                        None => m.parameter(param.clone()),
                    },
                };
                args.push(value);
            }

            let handle = m.contract_with_id(contract.id(), contract.artifact.clone(), args);
            local.insert(contract.id().to_string(), handle);
        }

        module
            .exports
            .iter()
            .map(|(key, reference)| -> Result<(String, Handle)> {
                Ok((key.clone(), lookup(&local, reference.as_str())?))
            })
            .collect::<Result<Vec<_>>>()
    })
}

impl Validate for ProjectConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("project.name", &self.project.name)?;

        if let Some(deployment) = &self.deployment {
            if let Some(concurrency) = deployment.concurrency {
                validate_positive_number("deployment.concurrency", concurrency, 1)?;
            }
            if let Some(dir) = &deployment.deployments_dir {
                validate_path("deployment.deployments_dir", dir)?;
            }
            if let Some(dir) = &deployment.artifacts_dir {
                validate_path("deployment.artifacts_dir", dir)?;
            }
            if let Some(file) = &deployment.parameters_file {
                validate_path("deployment.parameters_file", file)?;
            }
        }

        let mut names = HashSet::new();
        for module in &self.modules {
            let field = format!("modules.{}", module.name);
            validate_identifier(&format!("{}.name", field), &module.name)?;

            if !names.insert(module.name.as_str()) {
                return Err(DeployError::configuration(format!(
                    "Module name '{}' is declared more than once",
                    module.name
                )));
            }

            for used in &module.uses {
                if self.module(used).is_none() {
                    return Err(DeployError::InvalidConfigValueError {
                        field: format!("{}.uses", field),
                        value: used.clone(),
                        reason: "Module not found".to_string(),
                    });
                }
            }

            for contract in &module.contracts {
                validate_non_empty_string(&format!("{}.contracts.artifact", field), &contract.artifact)?;
                for arg in &contract.args {
                    if let ArgConfig::Address { address } = arg {
                        validate_address(&format!("{}.contracts.{}.args", field, contract.id()), address)?;
                    }
                }
            }
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        for module in &self.modules {
            if !visited.contains(&module.name)
                && self.has_circular_uses(&module.name, &mut visited, &mut rec_stack)
            {
                return Err(DeployError::configuration(
                    "Circular `uses` between modules in project configuration",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::ExecutionPlan;

    const PROJECT: &str = r#"
[project]
name = "nft-marketplace"

[deployment]
chain_id = 31337
concurrency = 2

[[modules]]
name = "TokenModule"

[[modules.contracts]]
artifact = "Token"
args = ["Jaric", "JRC"]

[modules.exports]
token = "Token"

[[modules]]
name = "MarketModule"
uses = ["TokenModule"]

[[modules.contracts]]
artifact = "NFTMarket"
args = [{ param = "listingFee", default = 100 }, { address = "0x64BA35F47326A8F356888440eB6159863b5B66d6" }]

[[modules.contracts]]
id = "Listing"
artifact = "Listing"
args = [{ ref = "NFTMarket" }, { ref = "TokenModule#token" }, true]

[modules.exports]
market = "NFTMarket"
listing = "Listing"
"#;

    #[test]
    fn test_parse_and_build_project() {
        let config = ProjectConfig::from_toml_str(PROJECT).unwrap();
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.deployment().chain_id, Some(31337));

        let project = config.build_project().unwrap();
        let market = project.module("MarketModule").unwrap();
        assert_eq!(
            market.exports().keys().cloned().collect::<Vec<_>>(),
            vec!["listing".to_string(), "market".to_string()]
        );

        let listing = market.request("Listing").unwrap();
        let deps: Vec<String> = listing.dependencies().map(Handle::future_id).collect();
        assert_eq!(
            deps,
            vec!["MarketModule#NFTMarket".to_string(), "TokenModule#Token".to_string()]
        );
        assert_eq!(listing.args[2], Value::Literal(Literal::Bool(true)));

        let plan = ExecutionPlan::for_module(&project, "MarketModule").unwrap();
        assert_eq!(plan.batches().len(), 2);
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let content = r#"
[project]
name = "p"

[[modules]]
name = "M"

[[modules.contracts]]
artifact = "B"
args = [{ ref = "A" }]

[[modules.contracts]]
artifact = "A"
"#;
        let config = ProjectConfig::from_toml_str(content).unwrap();
        assert!(matches!(
            config.build_project(),
            Err(DeployError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_duplicate_module_names() {
        let content = r#"
[project]
name = "p"

[[modules]]
name = "M"

[[modules]]
name = "M"
"#;
        let config = ProjectConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_circular_uses_detection() {
        let content = r#"
[project]
name = "p"

[[modules]]
name = "A"
uses = ["B"]

[[modules]]
name = "B"
uses = ["A"]
"#;
        let config = ProjectConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("DEPLOY_MODULES_TEST_RECIPIENT", "0x64BA35F47326A8F356888440eB6159863b5B66d6");
        let content = r#"
[project]
name = "p"

[[modules]]
name = "M"

[[modules.contracts]]
artifact = "NFTMarket"
args = [100, { address = "${DEPLOY_MODULES_TEST_RECIPIENT}" }]
"#;
        let config = ProjectConfig::from_toml_str(content).unwrap();
        let project = config.build_project().unwrap();
        let request = project.module("M").unwrap().request("NFTMarket").unwrap();
        assert_eq!(
            request.args[1],
            Value::address("0x64BA35F47326A8F356888440eB6159863b5B66d6")
        );
    }

    #[test]
    fn test_invalid_address_argument() {
        let content = r#"
[project]
name = "p"

[[modules]]
name = "M"

[[modules.contracts]]
artifact = "NFTMarket"
args = [100, { address = "20" }]
"#;
        let config = ProjectConfig::from_toml_str(content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plain_string_stays_string() {
        let content = r#"
[project]
name = "p"

[[modules]]
name = "M"

[[modules.contracts]]
artifact = "Registry"
args = ["0x64BA35F47326A8F356888440eB6159863b5B66d6", { address = "0x64BA35F47326A8F356888440eB6159863b5B66d6" }]
"#;
        let project = ProjectConfig::from_toml_str(content)
            .unwrap()
            .build_project()
            .unwrap();
        let request = project.module("M").unwrap().request("Registry").unwrap();
        assert_eq!(
            request.args[0],
            Value::Literal(Literal::String(
                "0x64BA35F47326A8F356888440eB6159863b5B66d6".to_string()
            ))
        );
        assert_eq!(
            request.args[1],
            Value::address("0x64BA35F47326A8F356888440eB6159863b5B66d6")
        );
    }
}
