use crate::adapters::lock::NamespaceLock;
use crate::app::phases::{
    DirectivePatchPhase, FoundationStartPhase, SecretProvisionPhase, ServicesStartPhase,
    SettlePhase, TeardownPhase,
};
use crate::config::StackSettings;
use crate::core::catalog::ServiceCatalog;
use crate::core::compose::ComposeCommands;
use crate::core::directive::DirectiveToggle;
use crate::core::phase_sequence::{PhaseResult, PhaseSequence};
use crate::core::resolver::{DependencyResolver, Resolution};
use crate::core::{CommandRunner, ContainerInspector, Storage};
use crate::domain::model::{CommandSpec, ServiceSelection};
use crate::utils::error::{Result, StackError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// 實際執行前就能算出的內容，供 `--dry-run` 顯示
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapPlan {
    pub project: String,
    pub profile: String,
    pub environment: String,
    /// `None` 代表啟動全部服務
    pub services: Option<Vec<String>>,
    pub unknown_services: Vec<String>,
    pub gateway_injected: bool,
    pub commands: Vec<String>,
}

/// 一次 bootstrap 的結果；`error` 為 `None` 表示全部成功
#[derive(Debug)]
pub struct BootstrapReport {
    pub execution_id: String,
    pub results: Vec<PhaseResult>,
    pub summary: HashMap<String, serde_json::Value>,
    pub error: Option<StackError>,
}

impl BootstrapReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<PhaseResult>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.results),
        }
    }
}

/// 整個本機堆疊的啟動流程：
/// 金鑰 → 指令開關 → 停止舊容器 → 啟動基礎堆疊 → 等待 → 啟動輔助服務
pub struct BootstrapSequencer<S: Storage + 'static> {
    settings: StackSettings,
    catalog: ServiceCatalog,
    runner: Arc<dyn CommandRunner>,
    inspector: Arc<dyn ContainerInspector>,
    storage: Arc<S>,
}

impl<S: Storage + 'static> BootstrapSequencer<S> {
    pub fn new(
        settings: StackSettings,
        catalog: ServiceCatalog,
        runner: Arc<dyn CommandRunner>,
        inspector: Arc<dyn ContainerInspector>,
        storage: Arc<S>,
    ) -> Self {
        Self {
            settings,
            catalog,
            runner,
            inspector,
            storage,
        }
    }

    pub fn settings(&self) -> &StackSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// 只有指定名稱時才需要解析
    pub fn resolve(&self, selection: &ServiceSelection) -> Option<Resolution> {
        match selection {
            ServiceSelection::All => None,
            ServiceSelection::Named(names) => Some(
                DependencyResolver::new(&self.catalog)
                    .resolve_with_report(names, self.settings.profile),
            ),
        }
    }

    /// 輔助服務的啟動指令；解析結果為空時為 `None`
    fn services_command(&self, resolution: Option<&Resolution>) -> Option<CommandSpec> {
        let commands = ComposeCommands::new(&self.settings);
        match resolution {
            None => Some(commands.start_services(None)),
            Some(resolution) if resolution.services.is_empty() => None,
            Some(resolution) => Some(commands.start_services(Some(&resolution.services))),
        }
    }

    pub fn plan(&self, selection: &ServiceSelection) -> BootstrapPlan {
        let commands = ComposeCommands::new(&self.settings);
        let resolution = self.resolve(selection);

        let mut planned = vec![
            commands.teardown_services(),
            commands.teardown_foundation(),
            commands.start_foundation(),
        ];
        planned.extend(self.services_command(resolution.as_ref()));

        BootstrapPlan {
            project: self.settings.project_name().to_string(),
            profile: self.settings.profile.to_string(),
            environment: self.settings.environment.to_string(),
            services: resolution.as_ref().map(|r| r.services.to_vec()),
            unknown_services: resolution
                .as_ref()
                .map(|r| r.unknown.clone())
                .unwrap_or_default(),
            gateway_injected: resolution.as_ref().is_some_and(|r| r.gateway_injected),
            commands: planned.iter().map(CommandSpec::display).collect(),
        }
    }

    pub fn build_sequence(&self, selection: &ServiceSelection, execution_id: String) -> PhaseSequence {
        let config = &self.settings.config;
        let commands = ComposeCommands::new(&self.settings);
        let resolution = self.resolve(selection);

        if let Some(resolution) = &resolution {
            tracing::info!(
                "🧩 Resolved {} service(s) for profile {}: {:?}",
                resolution.services.len(),
                self.settings.profile,
                resolution.services.to_vec()
            );
        }

        let mut sequence = PhaseSequence::new(execution_id, self.settings.profile);
        sequence.add_phase(Box::new(SecretProvisionPhase::new(
            Arc::clone(&self.storage),
            config.secrets.clone(),
        )));
        sequence.add_phase(Box::new(DirectivePatchPhase::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.inspector),
            config.project.compose_file.clone(),
            config.probe.container_filter.clone(),
            config.probe.marker_path.clone(),
            DirectiveToggle::from_config(&config.directive),
        )));
        sequence.add_phase(Box::new(TeardownPhase::new(
            Arc::clone(&self.runner),
            commands.teardown_services(),
            commands.teardown_foundation(),
        )));
        sequence.add_phase(Box::new(FoundationStartPhase::new(
            Arc::clone(&self.runner),
            commands.start_foundation(),
        )));
        sequence.add_phase(Box::new(SettlePhase::new(self.settings.settle_delay)));
        sequence.add_phase(Box::new(ServicesStartPhase::new(
            Arc::clone(&self.runner),
            self.services_command(resolution.as_ref()),
            resolution
                .map(|r| r.services.to_vec())
                .unwrap_or_default(),
        )));

        sequence
    }

    /// 持有命名空間鎖，依序執行所有階段。
    ///
    /// 取得鎖失敗時直接回傳錯誤；之後的失敗記錄在報告的 `error` 中，
    /// 已完成的階段不會回復。
    pub async fn run(&self, selection: &ServiceSelection, execution_id: String) -> Result<BootstrapReport> {
        let _lock = if self.settings.config.project.lock {
            Some(NamespaceLock::acquire(self.settings.lock_path())?)
        } else {
            None
        };

        tracing::info!(
            "🚀 Bootstrapping project '{}' (profile: {}, environment: {}, execution: {})",
            self.settings.project_name(),
            self.settings.profile,
            self.settings.environment,
            execution_id
        );

        let mut sequence = self.build_sequence(selection, execution_id.clone());
        let outcome = sequence.execute_all().await;

        Ok(BootstrapReport {
            execution_id,
            results: sequence.results().to_vec(),
            summary: sequence.get_execution_summary(),
            error: outcome.err(),
        })
    }
}
