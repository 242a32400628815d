use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 建構子參數中的常數
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Number(i128),
    String(String),
    Bool(bool),
    Address(String),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Number(_) => "number",
            Literal::String(_) => "string",
            Literal::Bool(_) => "bool",
            Literal::Address(_) => "address",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Address(a) => write!(f, "{}", a),
        }
    }
}

/// 指向某個合約部署請求的不透明參考，只在同一次部署過程中有效
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    module: String,
    id: String,
}

impl Handle {
    pub(crate) fn new(module: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            id: id.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `Module#Id`
    pub fn future_id(&self) -> String {
        format!("{}#{}", self.module, self.id)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.module, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Literal(Literal),
    Reference(Handle),
    Parameter {
        name: String,
        default: Option<Literal>,
    },
}

impl Value {
    pub fn address(value: impl Into<String>) -> Self {
        Value::Literal(Literal::Address(value.into()))
    }

    pub fn as_reference(&self) -> Option<&Handle> {
        match self {
            Value::Reference(handle) => Some(handle),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(literal) => write!(f, "{}", literal),
            Value::Reference(handle) => write!(f, "<{}>", handle),
            Value::Parameter { name, default } => match default {
                Some(default) => write!(f, "${{{}:{}}}", name, default),
                None => write!(f, "${{{}}}", name),
            },
        }
    }
}

macro_rules! number_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    Literal::Number(value as i128)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Literal(Literal::from(value))
                }
            }
        )*
    };
}

number_value!(i32, i64, i128, u32, u64, usize);

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<Literal> for Value {
    fn from(value: Literal) -> Self {
        Value::Literal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Literal(Literal::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Literal(Literal::Bool(value))
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Value::Reference(value)
    }
}

impl From<&Handle> for Value {
    fn from(value: &Handle) -> Self {
        Value::Reference(value.clone())
    }
}

/// 一筆合約實例化請求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRequest {
    pub handle: Handle,
    pub artifact: String,
    pub args: Vec<Value>,
}

impl ContractRequest {
    /// 此請求以參數形式引用的其他請求
    pub fn dependencies(&self) -> impl Iterator<Item = &Handle> {
        self.args.iter().filter_map(Value::as_reference)
    }
}

/// 已建構、尚未執行的模組描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub(crate) name: String,
    pub(crate) requests: Vec<ContractRequest>,
    pub(crate) submodules: Vec<ModuleDescriptor>,
    pub(crate) exports: BTreeMap<String, Handle>,
}

impl ModuleDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requests(&self) -> &[ContractRequest] {
        &self.requests
    }

    pub fn request(&self, id: &str) -> Option<&ContractRequest> {
        self.requests.iter().find(|r| r.handle.id() == id)
    }

    pub fn submodules(&self) -> &[ModuleDescriptor] {
        &self.submodules
    }

    pub fn exports(&self) -> &BTreeMap<String, Handle> {
        &self.exports
    }

    pub fn export(&self, key: &str) -> Option<&Handle> {
        self.exports.get(key)
    }
}

/// 參數與參考都已解析完成，交給部署引擎的請求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub module: String,
    pub future_id: String,
    pub artifact: String,
    pub args: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub future_id: String,
    pub artifact: String,
    pub address: String,
}
