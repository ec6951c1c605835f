use crate::domain::model::{CommandOutput, CommandSpec};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 專案目錄內的檔案存取；路徑皆為相對於專案根目錄
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// 執行外部指令；非零結束碼必須回傳 `StackError::CommandFailed`
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// 查詢執行中的容器狀態
#[async_trait]
pub trait ContainerInspector: Send + Sync {
    /// 名稱包含 `name_filter` 的執行中容器
    async fn list_containers(&self, name_filter: &str) -> Result<Vec<String>>;

    async fn exec_in_container(&self, container: &str, shell_expr: &str) -> Result<CommandOutput>;
}
