use crate::core::phase_sequence::{BootstrapPhase, PhaseContext, PhaseOutput};
use crate::core::CommandRunner;
use crate::domain::model::CommandSpec;
use crate::utils::error::Result;
use std::sync::Arc;

pub const PHASE_NAME: &str = "teardown";

/// 先停掉輔助服務，再停掉同一個專案下的基礎堆疊
pub struct TeardownPhase {
    runner: Arc<dyn CommandRunner>,
    services_down: CommandSpec,
    foundation_down: CommandSpec,
}

impl TeardownPhase {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        services_down: CommandSpec,
        foundation_down: CommandSpec,
    ) -> Self {
        Self {
            runner,
            services_down,
            foundation_down,
        }
    }
}

#[async_trait::async_trait]
impl BootstrapPhase for TeardownPhase {
    fn name(&self) -> &str {
        PHASE_NAME
    }

    async fn execute(&self, _context: &PhaseContext) -> Result<PhaseOutput> {
        tracing::info!("🛑 Stopping and removing existing local AI containers...");
        self.runner.run(&self.services_down).await?;

        tracing::info!("🛑 Stopping and removing existing Supabase containers...");
        self.runner.run(&self.foundation_down).await?;

        Ok(PhaseOutput::new().with_metadata(
            "commands",
            vec![self.services_down.display(), self.foundation_down.display()],
        ))
    }
}
