use crate::adapters::artifacts::ArtifactRegistry;
use crate::core::journal::DeploymentJournal;
use crate::domain::model::{DeployedContract, ResolvedRequest};
use crate::domain::ports::DeploymentEngine;
use crate::utils::error::{DeployError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;

pub const LOCAL_CHAIN_ID: u64 = 31337;

#[derive(Debug, Default)]
struct ChainState {
    nonce: u64,
    contracts: BTreeMap<String, DeployedContract>,
}

/// 記憶體內的模擬鏈，不做任何網路 I/O
///
/// 有 artifacts 時會檢查 artifact 是否存在以及建構子參數；
/// 沒有 artifacts 時接受任何請求。
#[derive(Debug)]
pub struct SimulatedEngine {
    chain_id: u64,
    artifacts: Option<ArtifactRegistry>,
    block_time: Duration,
    state: Mutex<ChainState>,
}

impl SimulatedEngine {
    pub fn new(chain_id: u64, artifacts: ArtifactRegistry) -> Self {
        Self {
            chain_id,
            artifacts: Some(artifacts),
            block_time: Duration::ZERO,
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn permissive(chain_id: u64) -> Self {
        Self {
            chain_id,
            artifacts: None,
            block_time: Duration::ZERO,
            state: Mutex::new(ChainState::default()),
        }
    }

    pub fn with_block_time(mut self, block_time: Duration) -> Self {
        self.block_time = block_time;
        self
    }

    /// 從 journal 中本鏈已用過的地址接續 nonce，避免重新執行時配出相同地址
    pub fn with_journal(mut self, journal: &DeploymentJournal) -> Self {
        let prefix = format!("0x{:016x}", self.chain_id);
        let used = journal
            .entries()
            .values()
            .filter_map(|address| address.strip_prefix(&prefix))
            .filter_map(|nonce| u64::from_str_radix(nonce, 16).ok())
            .max()
            .unwrap_or(0);

        let state = self.state.get_mut();
        state.nonce = state.nonce.max(used);
        tracing::debug!("Simulated chain {} resumes after nonce {}", self.chain_id, state.nonce);
        self
    }

    pub async fn contract_at(&self, address: &str) -> Option<DeployedContract> {
        self.state.lock().await.contracts.get(address).cloned()
    }

    pub async fn deployed_count(&self) -> usize {
        self.state.lock().await.contracts.len()
    }

    fn check(&self, request: &ResolvedRequest) -> Result<()> {
        let Some(artifacts) = &self.artifacts else {
            return Ok(());
        };

        let artifact = artifacts.get(&request.artifact).ok_or_else(|| {
            DeployError::ArtifactNotFoundError {
                module: request.module.clone(),
                future_id: request.future_id.clone(),
                artifact: request.artifact.clone(),
            }
        })?;

        let mismatch = |reason: String| DeployError::ConstructorArgumentMismatchError {
            module: request.module.clone(),
            future_id: request.future_id.clone(),
            artifact: request.artifact.clone(),
            reason,
        };

        if artifact.constructor.len() != request.args.len() {
            return Err(mismatch(format!(
                "{} expects {} argument(s), got {}",
                artifact.signature(),
                artifact.constructor.len(),
                request.args.len()
            )));
        }

        for (index, (param, value)) in artifact.constructor.iter().zip(&request.args).enumerate() {
            if !param.accepts(value) {
                return Err(mismatch(format!(
                    "argument {} ('{}') is {} {}, expected {}",
                    index,
                    param.name,
                    value.type_name(),
                    value,
                    param.kind
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DeploymentEngine for SimulatedEngine {
    async fn deploy(&self, request: &ResolvedRequest) -> Result<DeployedContract> {
        self.check(request)?;

        if !self.block_time.is_zero() {
            tokio::time::sleep(self.block_time).await;
        }

        let mut state = self.state.lock().await;
        state.nonce += 1;
        let address = format!("0x{:016x}{:024x}", self.chain_id, state.nonce);
        let contract = DeployedContract {
            future_id: request.future_id.clone(),
            artifact: request.artifact.clone(),
            address: address.clone(),
        };
        state.contracts.insert(address, contract.clone());

        tracing::debug!(
            "Simulated {} on chain {} (nonce {})",
            request.future_id,
            self.chain_id,
            state.nonce
        );
        Ok(contract)
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
