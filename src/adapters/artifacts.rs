use crate::domain::model::Literal;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// 檢查常數是否能編碼成此 Solidity 型別；陣列與 tuple 不檢查
    pub fn accepts(&self, value: &Literal) -> bool {
        let kind = self.kind.as_str();
        if kind.ends_with(']') || kind.starts_with("tuple") {
            return true;
        }

        match value {
            Literal::Address(_) => kind == "address" || kind == "address payable",
            Literal::Number(n) if kind.starts_with("uint") => *n >= 0,
            Literal::Number(_) => kind.starts_with("int"),
            Literal::Bool(_) => kind == "bool",
            Literal::String(s) if kind.starts_with("bytes") => s.starts_with("0x"),
            Literal::String(_) => kind == "string",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AbiEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: String,
    #[serde(default)]
    abi: Vec<AbiEntry>,
}

/// 編譯後的合約定義，只保留部署需要的建構子簽名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub contract_name: String,
    pub constructor: Vec<AbiParam>,
}

impl Artifact {
    pub fn new(contract_name: impl Into<String>, constructor: Vec<AbiParam>) -> Self {
        Self {
            contract_name: contract_name.into(),
            constructor,
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(content)?;
        let constructor = file
            .abi
            .into_iter()
            .find(|entry| entry.kind == "constructor")
            .map(|entry| entry.inputs)
            .unwrap_or_default();

        Ok(Self {
            contract_name: file.contract_name,
            constructor,
        })
    }

    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.constructor.iter().map(|p| p.kind.as_str()).collect();
        format!("{}({})", self.contract_name, params.join(","))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, Artifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, artifact: Artifact) {
        self.artifacts
            .insert(artifact.contract_name.clone(), artifact);
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.register(artifact);
        self
    }

    /// 遞迴讀取 artifacts 目錄下的 JSON（略過 `.dbg.json`）
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut registry = Self::new();
        registry.scan(dir.as_ref())?;
        tracing::info!(
            "📦 Loaded {} artifact(s) from {}",
            registry.len(),
            dir.as_ref().display()
        );
        Ok(registry)
    }

    fn scan(&mut self, dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.scan(&path)?;
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".json") || file_name.ends_with(".dbg.json") {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            match Artifact::from_json_str(&content) {
                Ok(artifact) => {
                    tracing::debug!("Artifact {} from {}", artifact.signature(), path.display());
                    self.register(artifact);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: not a contract artifact ({})", path.display(), e);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}
