use crate::core::directive::{DirectiveToggle, DirectiveTransition};
use crate::core::phase_sequence::{BootstrapPhase, FailurePolicy, PhaseContext, PhaseOutput};
use crate::core::probe::RuntimeStateProbe;
use crate::core::{ContainerInspector, Storage};
use crate::utils::error::{Result, StackError};
use std::sync::Arc;

pub const PHASE_NAME: &str = "directive_patch";

/// 依 SearXNG 是否已初始化，開關 compose 檔中的 `cap_drop` 指令
pub struct DirectivePatchPhase<S: Storage> {
    storage: Arc<S>,
    inspector: Arc<dyn ContainerInspector>,
    compose_file: String,
    probe_target: String,
    marker_path: String,
    toggle: DirectiveToggle,
}

impl<S: Storage> DirectivePatchPhase<S> {
    pub fn new(
        storage: Arc<S>,
        inspector: Arc<dyn ContainerInspector>,
        compose_file: impl Into<String>,
        probe_target: impl Into<String>,
        marker_path: impl Into<String>,
        toggle: DirectiveToggle,
    ) -> Self {
        Self {
            storage,
            inspector,
            compose_file: compose_file.into(),
            probe_target: probe_target.into(),
            marker_path: marker_path.into(),
            toggle,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage + 'static> BootstrapPhase for DirectivePatchPhase<S> {
    fn name(&self) -> &str {
        PHASE_NAME
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Degraded
    }

    async fn execute(&self, _context: &PhaseContext) -> Result<PhaseOutput> {
        if !self.storage.exists(&self.compose_file).await {
            tracing::warn!("⚠️ Docker Compose file not found at {}", self.compose_file);
            return Ok(PhaseOutput::new().with_message("compose file missing, skipped"));
        }

        let bytes = self.storage.read_file(&self.compose_file).await?;
        let content = String::from_utf8(bytes).map_err(|source| StackError::InvalidUtf8 {
            path: self.compose_file.clone(),
            source,
        })?;

        let probe = RuntimeStateProbe::new(self.inspector.as_ref(), self.marker_path.clone());
        let first_run = probe.is_first_run(&self.probe_target).await;

        let transition = self.toggle.apply(&content, first_run);
        let label = match &transition {
            DirectiveTransition::Relaxed(_) => {
                tracing::info!(
                    "🆕 First run detected for {}. Temporarily removing '{}'",
                    self.probe_target,
                    self.toggle.active()
                );
                tracing::warn!(
                    "After the first run completes, re-add '{}' to {} for security reasons",
                    self.toggle.active(),
                    self.compose_file
                );
                "relaxed"
            }
            DirectiveTransition::Restored(_) => {
                tracing::info!(
                    "🔒 {} has been initialized. Re-enabling '{}'",
                    self.probe_target,
                    self.toggle.active()
                );
                "restored"
            }
            DirectiveTransition::Unchanged => "unchanged",
        };

        if let Some(text) = transition.new_text() {
            self.storage
                .write_file(&self.compose_file, text.as_bytes())
                .await?;
        }

        Ok(PhaseOutput::new()
            .with_message(format!("directive {}", label))
            .with_metadata("first_run", first_run)
            .with_metadata("transition", label))
    }
}
