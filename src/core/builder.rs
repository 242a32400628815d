use crate::domain::model::{ContractRequest, Handle, Literal, ModuleDescriptor, Value};
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{is_address, validate_identifier};
use std::collections::{BTreeMap, HashSet};

/// 建構模組時傳給 setup 的上下文
///
/// `contract` 等方法直接回傳 handle，過程中發現的錯誤會累積起來，
/// 由 [`build_module`] 在 setup 結束後一次回報。
#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    requests: Vec<ContractRequest>,
    submodules: Vec<ModuleDescriptor>,
    known: HashSet<Handle>,
    errors: Vec<String>,
}

impl ModuleBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            requests: Vec::new(),
            submodules: Vec::new(),
            known: HashSet::new(),
            errors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 以 artifact 名稱作為 ID 發出實例化請求
    pub fn contract<A, I>(&mut self, artifact: A, args: I) -> Handle
    where
        A: Into<String>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let artifact = artifact.into();
        let id = artifact.clone();
        self.contract_with_id(id, artifact, args)
    }

    /// 同一個 artifact 在模組內部署多次時，需要各自指定 ID
    pub fn contract_with_id<S, A, I>(&mut self, id: S, artifact: A, args: I) -> Handle
    where
        S: Into<String>,
        A: Into<String>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let id = id.into();
        let artifact = artifact.into();
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        let handle = Handle::new(self.name.clone(), id.clone());

        if let Err(e) = validate_identifier("contract.id", &id) {
            self.errors.push(e.to_string());
        }
        if artifact.trim().is_empty() {
            self.errors
                .push(format!("Contract '{}' has an empty artifact name", id));
        }
        if self.requests.iter().any(|r| r.handle == handle) {
            self.errors.push(format!(
                "Duplicate contract id '{}' in module {}; use contract_with_id to deploy an artifact twice",
                id, self.name
            ));
        }

        for (index, arg) in args.iter().enumerate() {
            match arg {
                Value::Reference(dep) if !self.known.contains(dep) => {
                    self.errors.push(format!(
                        "Argument {} of {} references '{}', which is not part of module {} or its submodules",
                        index, handle, dep, self.name
                    ));
                }
                Value::Literal(Literal::Address(address)) if !is_address(address) => {
                    self.errors.push(format!(
                        "Argument {} of {} is not a valid address: {}",
                        index, handle, address
                    ));
                }
                _ => {}
            }
        }

        tracing::debug!(
            "Declared {} -> {} with {} argument(s)",
            handle,
            artifact,
            args.len()
        );

        self.known.insert(handle.clone());
        self.requests.push(ContractRequest {
            handle: handle.clone(),
            artifact,
            args,
        });
        handle
    }

    /// 沒有預設值的模組參數，執行時必須提供
    pub fn parameter(&mut self, name: impl Into<String>) -> Value {
        self.declare_parameter(name.into(), None)
    }

    pub fn parameter_or(&mut self, name: impl Into<String>, default: impl Into<Literal>) -> Value {
        self.declare_parameter(name.into(), Some(default.into()))
    }

    fn declare_parameter(&mut self, name: String, default: Option<Literal>) -> Value {
        if let Err(e) = validate_identifier("parameter", &name) {
            self.errors.push(e.to_string());
        }
        Value::Parameter { name, default }
    }

    /// 引用另一個模組，回傳它的 exports 供本模組當作參數使用
    pub fn use_module(&mut self, module: &ModuleDescriptor) -> BTreeMap<String, Handle> {
        if module.name == self.name {
            self.errors
                .push(format!("Module {} cannot use itself", self.name));
            return BTreeMap::new();
        }

        match self.submodules.iter().find(|m| m.name == module.name) {
            Some(existing) if existing != module => {
                self.errors.push(format!(
                    "Module {} uses two different modules named {}",
                    self.name, module.name
                ));
                return BTreeMap::new();
            }
            Some(_) => {}
            None => {
                collect_handles(module, &mut self.known);
                self.submodules.push(module.clone());
            }
        }

        module.exports.clone()
    }
}

fn collect_handles(module: &ModuleDescriptor, known: &mut HashSet<Handle>) {
    known.extend(module.requests.iter().map(|r| r.handle.clone()));
    for submodule in &module.submodules {
        collect_handles(submodule, known);
    }
}

/// 建構模組描述。只做結構檢查，不會有任何 I/O
pub fn build_module<F, E, K>(name: impl Into<String>, setup: F) -> Result<ModuleDescriptor>
where
    F: FnOnce(&mut ModuleBuilder) -> Result<E>,
    E: IntoIterator<Item = (K, Handle)>,
    K: Into<String>,
{
    let name = name.into();
    if name.trim().is_empty() {
        return Err(DeployError::configuration("Module name cannot be empty"));
    }
    validate_identifier("module.name", &name)
        .map_err(|e| DeployError::configuration(e.to_string()))?;

    let mut builder = ModuleBuilder::new(name);
    let returned = setup(&mut builder)?;

    let mut exports = BTreeMap::new();
    for (key, handle) in returned {
        let key: String = key.into();
        if key.trim().is_empty() {
            builder
                .errors
                .push(format!("Module {} exports an empty key", builder.name));
            continue;
        }
        if !builder.known.contains(&handle) {
            builder.errors.push(format!(
                "Export '{}' of module {} references '{}', which the module does not deploy",
                key, builder.name, handle
            ));
            continue;
        }
        if exports.insert(key.clone(), handle).is_some() {
            builder.errors.push(format!(
                "Module {} exports key '{}' more than once",
                builder.name, key
            ));
        }
    }

    if !builder.errors.is_empty() {
        return Err(DeployError::configuration(builder.errors.join("; ")));
    }

    tracing::debug!(
        "Built module {} ({} contract(s), {} export(s))",
        builder.name,
        builder.requests.len(),
        exports.len()
    );

    Ok(ModuleDescriptor {
        name: builder.name,
        requests: builder.requests,
        submodules: builder.submodules,
        exports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports_match_setup_keys() {
        let module = build_module("X", |m| {
            let a = m.contract("Foo", [100, 20]);
            let b = m.contract("Bar", Vec::<Value>::new());
            Ok([("a", a), ("b", b)])
        })
        .unwrap();

        let keys: Vec<&str> = module.exports().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_single_contract_scenario() {
        let module = build_module("X", |m| Ok([("m", m.contract("Foo", [100, 20]))])).unwrap();

        let handle = module.export("m").unwrap();
        assert_eq!(handle.future_id(), "X#Foo");

        let request = module.request("Foo").unwrap();
        assert_eq!(request.artifact, "Foo");
        assert_eq!(request.args, vec![Value::from(100), Value::from(20)]);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = build_module("", |_| Ok(Vec::<(String, Handle)>::new()));
        assert!(matches!(result, Err(DeployError::ConfigurationError { .. })));

        let result = build_module("   ", |_| Ok(Vec::<(String, Handle)>::new()));
        assert!(matches!(result, Err(DeployError::ConfigurationError { .. })));
    }

    #[test]
    fn test_duplicate_export_keys_are_rejected() {
        let result = build_module("X", |m| {
            let a = m.contract("Foo", [1]);
            let b = m.contract("Bar", [2]);
            Ok(vec![("same", a), ("same", b)])
        });
        match result {
            Err(DeployError::ConfigurationError { message }) => {
                assert!(message.contains("more than once"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reference_records_dependency() {
        let module = build_module("X", |m| {
            let token = m.contract("Token", Vec::<Value>::new());
            let market = m.contract("Market", vec![Value::from(&token), Value::from(100)]);
            Ok([("market", market)])
        })
        .unwrap();

        let market = module.request("Market").unwrap();
        let deps: Vec<String> = market.dependencies().map(Handle::future_id).collect();
        assert_eq!(deps, vec!["X#Token".to_string()]);
    }

    #[test]
    fn test_duplicate_contract_id_needs_explicit_id() {
        let result = build_module("X", |m| {
            let a = m.contract("Foo", [1]);
            let b = m.contract("Foo", [2]);
            Ok([("a", a), ("b", b)])
        });
        assert!(result.is_err());

        let module = build_module("X", |m| {
            let a = m.contract("Foo", [1]);
            let b = m.contract_with_id("Foo2", "Foo", [2]);
            Ok([("a", a), ("b", b)])
        })
        .unwrap();
        assert_eq!(module.requests().len(), 2);
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let other = build_module("Other", |m| Ok([("t", m.contract("Token", [1]))])).unwrap();
        let foreign = other.export("t").unwrap().clone();

        let result = build_module("X", move |m| {
            let market = m.contract("Market", vec![Value::from(foreign)]);
            Ok([("market", market)])
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_use_module_exposes_handles() {
        let token_module =
            build_module("TokenModule", |m| Ok([("token", m.contract("Token", [1]))])).unwrap();

        let market_module = build_module("MarketModule", |m| {
            let token_exports = m.use_module(&token_module);
            let token = token_exports["token"].clone();
            let market = m.contract("Market", vec![Value::from(token.clone())]);
            Ok([("market", market), ("token", token)])
        })
        .unwrap();

        assert_eq!(market_module.submodules().len(), 1);
        assert_eq!(
            market_module.export("token").unwrap().future_id(),
            "TokenModule#Token"
        );
    }

    #[test]
    fn test_invalid_address_literal() {
        let result = build_module("X", |m| {
            Ok([("m", m.contract("Foo", vec![Value::address("0x1234")]))])
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_parameters_are_recorded() {
        let module = build_module("X", |m| {
            let fee = m.parameter_or("listingFee", 100);
            let owner = m.parameter("owner");
            Ok([("m", m.contract("Foo", vec![fee, owner]))])
        })
        .unwrap();

        let request = module.request("Foo").unwrap();
        assert_eq!(
            request.args[0],
            Value::Parameter {
                name: "listingFee".to_string(),
                default: Some(Literal::Number(100)),
            }
        );
        assert_eq!(
            request.args[1],
            Value::Parameter {
                name: "owner".to_string(),
                default: None,
            }
        );
    }
}
