use crate::core::phase_sequence::{BootstrapPhase, PhaseContext, PhaseOutput};
use crate::core::CommandRunner;
use crate::domain::model::CommandSpec;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

pub const START_PHASE_NAME: &str = "foundation_startup";
pub const SETTLE_PHASE_NAME: &str = "settle_wait";

pub struct FoundationStartPhase {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl FoundationStartPhase {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec) -> Self {
        Self { runner, command }
    }
}

#[async_trait::async_trait]
impl BootstrapPhase for FoundationStartPhase {
    fn name(&self) -> &str {
        START_PHASE_NAME
    }

    async fn execute(&self, _context: &PhaseContext) -> Result<PhaseOutput> {
        tracing::info!("🚀 Starting Supabase services...");
        self.runner.run(&self.command).await?;
        Ok(PhaseOutput::new().with_metadata("command", self.command.display()))
    }
}

/// 固定等待；不輪詢健康狀態
pub struct SettlePhase {
    delay: Duration,
}

impl SettlePhase {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl BootstrapPhase for SettlePhase {
    fn name(&self) -> &str {
        SETTLE_PHASE_NAME
    }

    async fn execute(&self, _context: &PhaseContext) -> Result<PhaseOutput> {
        tracing::info!("⏳ Waiting {:?} for Supabase to initialize...", self.delay);
        tokio::time::sleep(self.delay).await;
        Ok(PhaseOutput::new().with_metadata("delay_ms", self.delay.as_millis() as u64))
    }
}
