use crate::core::compose::ComposeCommands;
use crate::core::{CommandRunner, ContainerInspector};
use crate::domain::model::CommandOutput;
use crate::utils::error::{Result, StackError};
use async_trait::async_trait;
use std::sync::Arc;

/// 透過 `docker ps` / `docker exec` 查詢容器
pub struct DockerInspector {
    runner: Arc<dyn CommandRunner>,
}

impl DockerInspector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ContainerInspector for DockerInspector {
    async fn list_containers(&self, name_filter: &str) -> Result<Vec<String>> {
        let output = self
            .runner
            .run(&ComposeCommands::list_containers(name_filter))
            .await
            .map_err(|e| StackError::ProbeError {
                message: e.to_string(),
            })?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect())
    }

    async fn exec_in_container(&self, container: &str, shell_expr: &str) -> Result<CommandOutput> {
        // exec 的非零結束碼不代表檢查失敗，只回傳輸出
        match self
            .runner
            .run(&ComposeCommands::exec_in_container(container, shell_expr))
            .await
        {
            Ok(output) => Ok(output),
            Err(StackError::CommandFailed {
                exit_code, stderr, ..
            }) => Ok(CommandOutput {
                exit_code,
                stdout: String::new(),
                stderr,
            }),
            Err(e) => Err(StackError::ProbeError {
                message: e.to_string(),
            }),
        }
    }
}
