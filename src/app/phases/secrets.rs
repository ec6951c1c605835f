use crate::config::toml_config::SecretsConfig;
use crate::core::phase_sequence::{BootstrapPhase, FailurePolicy, PhaseContext, PhaseOutput};
use crate::core::secrets::{SecretOutcome, SecretProvisioner};
use crate::core::Storage;
use crate::utils::error::Result;
use std::sync::Arc;

pub const PHASE_NAME: &str = "secret_provisioning";

/// 建立 SearXNG 設定檔並產生金鑰
pub struct SecretProvisionPhase<S: Storage> {
    storage: Arc<S>,
    config: SecretsConfig,
}

impl<S: Storage> SecretProvisionPhase<S> {
    pub fn new(storage: Arc<S>, config: SecretsConfig) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage + 'static> BootstrapPhase for SecretProvisionPhase<S> {
    fn name(&self) -> &str {
        PHASE_NAME
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Degraded
    }

    async fn execute(&self, _context: &PhaseContext) -> Result<PhaseOutput> {
        let provisioner = SecretProvisioner::new(self.storage.as_ref(), &self.config);

        match provisioner.provision().await {
            Ok(SecretOutcome::TemplateMissing) => Ok(PhaseOutput::new()
                .with_message(format!("{} not found, skipped", self.config.base_file))
                .with_metadata("generated", false)),
            Ok(SecretOutcome::Generated { created }) => Ok(PhaseOutput::new()
                .with_message("secret key generated")
                .with_metadata("generated", true)
                .with_metadata("created_settings", created)),
            Ok(SecretOutcome::AlreadyProvisioned { created }) => Ok(PhaseOutput::new()
                .with_message("existing secret key kept")
                .with_metadata("generated", false)
                .with_metadata("created_settings", created)),
            Err(e) => {
                tracing::error!("❌ Error generating SearXNG secret key: {}", e);
                tracing::warn!("You may need to generate the secret key manually:");
                for instruction in provisioner.manual_instructions() {
                    tracing::warn!("  - {}", instruction);
                }
                Err(e)
            }
        }
    }
}
