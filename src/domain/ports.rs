use crate::domain::model::{DeployedContract, ResolvedRequest};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// 外部部署引擎：依名稱找到編譯好的合約並以給定參數實例化
#[async_trait]
pub trait DeploymentEngine: Send + Sync {
    async fn deploy(&self, request: &ResolvedRequest) -> Result<DeployedContract>;

    fn chain_id(&self) -> u64;
}
