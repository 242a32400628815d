use crate::config::parameters::Parameters;
use crate::core::journal::DeploymentJournal;
use crate::core::plan::ExecutionPlan;
use crate::domain::model::{ContractRequest, DeployedContract, Literal, ResolvedRequest, Value};
use crate::domain::ports::DeploymentEngine;
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::validate_positive_number;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 5;

/// 一次部署的結果
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentResult {
    pub module: String,
    pub chain_id: u64,
    /// 計畫中所有合約的地址，包含先前已部署而被跳過的
    pub contracts: BTreeMap<String, String>,
    pub deployed: Vec<DeployedContract>,
    pub skipped: Vec<String>,
    /// 模組 -> export 名稱 -> 地址
    pub exports: BTreeMap<String, BTreeMap<String, String>>,
    pub duration: Duration,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentResult {
    pub fn export_address(&self, module: &str, key: &str) -> Option<&str> {
        self.exports
            .get(module)
            .and_then(|e| e.get(key))
            .map(String::as_str)
    }
}

/// 依計畫批次呼叫部署引擎
pub struct Deployer {
    engine: Arc<dyn DeploymentEngine>,
    parameters: Parameters,
    concurrency: usize,
}

impl Deployer {
    pub fn new(engine: Arc<dyn DeploymentEngine>) -> Self {
        Self {
            engine,
            parameters: Parameters::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
        validate_positive_number("concurrency", concurrency, 1)?;
        self.concurrency = concurrency;
        Ok(self)
    }

    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        journal: &mut DeploymentJournal,
    ) -> Result<DeploymentResult> {
        let start_time = Instant::now();
        let limiter = Arc::new(Semaphore::new(self.concurrency));
        let mut contracts: BTreeMap<String, String> = BTreeMap::new();
        let mut deployed = Vec::new();
        let mut skipped = Vec::new();

        tracing::info!(
            "🚀 Deploying module {} ({} contract(s) in {} batch(es), chain {})",
            plan.module(),
            plan.len(),
            plan.batches().len(),
            self.engine.chain_id()
        );

        for (index, batch) in plan.batches().iter().enumerate() {
            tracing::debug!("Batch #{}: {}", index + 1, batch.join(", "));
            let mut pending = Vec::new();

            for future_id in batch {
                let node = plan.node(future_id).ok_or_else(|| {
                    DeployError::configuration(format!("Plan has no entry for {}", future_id))
                })?;

                if let Some(address) = journal.address(future_id) {
                    tracing::info!("⏭️ {} already deployed at {}", future_id, address);
                    contracts.insert(future_id.clone(), address.to_string());
                    skipped.push(future_id.clone());
                    continue;
                }

                pending.push(self.resolve(&node.request, &contracts)?);
            }

            // 整批解析成功後才開始部署
            let mut tasks = JoinSet::new();
            for request in pending {
                let engine = Arc::clone(&self.engine);
                let limiter = Arc::clone(&limiter);
                tasks.spawn(async move {
                    let _permit = limiter.acquire_owned().await.ok();
                    engine.deploy(&request).await
                });
            }

            let mut failure = None;
            while let Some(joined) = tasks.join_next().await {
                // 任務 panic 與引擎錯誤同樣處理，繼續收完整批
                match joined.map_err(DeployError::from).and_then(|outcome| outcome) {
                    Ok(contract) => {
                        tracing::info!(
                            "✅ {} ({}) deployed at {}",
                            contract.future_id,
                            contract.artifact,
                            contract.address
                        );
                        journal.record(&contract);
                        contracts.insert(contract.future_id.clone(), contract.address.clone());
                        deployed.push(contract);
                    }
                    Err(e) => {
                        tracing::error!("❌ {}", e);
                        // 等同批次其他任務結束，讓成功的部分寫進 journal
                        failure.get_or_insert(e);
                    }
                }
            }

            if let Some(e) = failure {
                return Err(e);
            }
        }

        let exports = plan
            .exports()
            .iter()
            .map(|(module, exports)| {
                let addresses = exports
                    .iter()
                    .filter_map(|(key, handle)| {
                        contracts
                            .get(&handle.future_id())
                            .map(|address| (key.clone(), address.clone()))
                    })
                    .collect();
                (module.clone(), addresses)
            })
            .collect();

        let duration = start_time.elapsed();
        tracing::info!(
            "🎉 Module {} finished: {} deployed, {} skipped, {:?}",
            plan.module(),
            deployed.len(),
            skipped.len(),
            duration
        );

        Ok(DeploymentResult {
            module: plan.module().to_string(),
            chain_id: self.engine.chain_id(),
            contracts,
            deployed,
            skipped,
            exports,
            duration,
            finished_at: Utc::now(),
        })
    }

    fn resolve(
        &self,
        request: &ContractRequest,
        addresses: &BTreeMap<String, String>,
    ) -> Result<ResolvedRequest> {
        let module = request.handle.module();
        let args = request
            .args
            .iter()
            .map(|arg| match arg {
                Value::Literal(literal) => Ok(literal.clone()),
                Value::Reference(handle) => {
                    let future_id = handle.future_id();
                    addresses
                        .get(&future_id)
                        .map(|address| Literal::Address(address.clone()))
                        .ok_or(DeployError::UnresolvedReferenceError { future_id })
                }
                Value::Parameter { name, default } => self
                    .parameters
                    .get(module, name)
                    .or(default.as_ref())
                    .cloned()
                    .ok_or_else(|| DeployError::MissingParameterError {
                        module: module.to_string(),
                        name: name.clone(),
                    }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedRequest {
            module: module.to_string(),
            future_id: request.handle.future_id(),
            artifact: request.artifact.clone(),
            args,
        })
    }
}
