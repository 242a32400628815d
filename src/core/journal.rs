use crate::core::Storage;
use crate::domain::model::DeployedContract;
use crate::utils::error::Result;
use std::collections::BTreeMap;

pub const JOURNAL_FILE: &str = "deployed_addresses.json";

/// 已完成的部署（`Module#Id` -> 地址），重新執行時用來跳過已部署的合約
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentJournal {
    entries: BTreeMap<String, String>,
}

impl DeploymentJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 檔案不存在時回傳空的 journal
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        if !storage.exists(path).await {
            tracing::debug!("No journal at {}, starting fresh", path);
            return Ok(Self::new());
        }

        let data = storage.read_file(path).await?;
        let entries: BTreeMap<String, String> = serde_json::from_slice(&data)?;
        tracing::info!("📒 Loaded {} deployed contract(s) from {}", entries.len(), path);
        Ok(Self { entries })
    }

    pub async fn save<S: Storage>(&self, storage: &S, path: &str) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.entries)?;
        storage.write_file(path, &data).await?;
        tracing::debug!("Journal saved to {}", path);
        Ok(())
    }

    pub fn record(&mut self, contract: &DeployedContract) {
        self.entries
            .insert(contract.future_id.clone(), contract.address.clone());
    }

    pub fn address(&self, future_id: &str) -> Option<&str> {
        self.entries.get(future_id).map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
