use crate::core::phase_sequence::{BootstrapPhase, PhaseContext, PhaseOutput};
use crate::core::CommandRunner;
use crate::domain::model::CommandSpec;
use crate::utils::error::Result;
use std::sync::Arc;

pub const PHASE_NAME: &str = "services_startup";

/// 啟動輔助服務。`command` 為 `None` 表示解析結果為空，不需要啟動任何東西
pub struct ServicesStartPhase {
    runner: Arc<dyn CommandRunner>,
    command: Option<CommandSpec>,
    services: Vec<String>,
}

impl ServicesStartPhase {
    pub fn new(runner: Arc<dyn CommandRunner>, command: Option<CommandSpec>, services: Vec<String>) -> Self {
        Self {
            runner,
            command,
            services,
        }
    }
}

#[async_trait::async_trait]
impl BootstrapPhase for ServicesStartPhase {
    fn name(&self) -> &str {
        PHASE_NAME
    }

    async fn execute(&self, context: &PhaseContext) -> Result<PhaseOutput> {
        let Some(command) = &self.command else {
            tracing::warn!("⚠️ No services resolved from the selection, nothing will be started");
            return Ok(PhaseOutput::new()
                .with_message("nothing to start")
                .with_metadata("started", false));
        };

        tracing::info!("🚀 Starting local AI services (profile: {})...", context.profile);
        self.runner.run(command).await?;

        Ok(PhaseOutput::new()
            .with_metadata("started", true)
            .with_metadata("services", self.services.clone())
            .with_metadata("command", command.display()))
    }
}
