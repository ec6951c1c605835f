use crate::config::toml_config::ProbeConfig;
use crate::core::ContainerInspector;
use crate::utils::error::Result;

const FOUND: &str = "found";
const NOT_FOUND: &str = "not_found";

/// 判斷某個輔助服務是否還沒完成初始化（首次執行）。
///
/// 任何檢查失敗都視為首次執行。
pub struct RuntimeStateProbe<'a> {
    inspector: &'a dyn ContainerInspector,
    marker_path: String,
}

impl<'a> RuntimeStateProbe<'a> {
    pub fn new(inspector: &'a dyn ContainerInspector, marker_path: impl Into<String>) -> Self {
        Self {
            inspector,
            marker_path: marker_path.into(),
        }
    }

    pub fn from_config(inspector: &'a dyn ContainerInspector, config: &ProbeConfig) -> Self {
        Self::new(inspector, config.marker_path.clone())
    }

    pub async fn is_first_run(&self, probe_target: &str) -> bool {
        match self.check(probe_target).await {
            Ok(first_run) => first_run,
            Err(e) => {
                tracing::warn!("⚠️ Error checking container '{}': {} - assuming first run", probe_target, e);
                true
            }
        }
    }

    async fn check(&self, probe_target: &str) -> Result<bool> {
        let containers = self.inspector.list_containers(probe_target).await?;
        let Some(container) = containers.iter().find(|name| !name.trim().is_empty()) else {
            tracing::info!("🔍 No running {} container found - assuming first run", probe_target);
            return Ok(true);
        };

        tracing::info!("🔍 Found running {} container: {}", probe_target, container);
        let output = self
            .inspector
            .exec_in_container(container, &self.marker_check_expr())
            .await?;

        let found = output.stdout.lines().any(|line| line.trim() == FOUND);
        if found {
            tracing::info!("✅ {} exists inside {} - not first run", self.marker_path, container);
        } else {
            tracing::info!("🆕 {} not found inside {} - first run", self.marker_path, container);
        }
        Ok(!found)
    }

    fn marker_check_expr(&self) -> String {
        format!(
            "[ -f {} ] && echo '{}' || echo '{}'",
            self.marker_path, FOUND, NOT_FOUND
        )
    }

    /// 名稱含有 `name_filter` 的執行中容器；查詢失敗時回傳空清單
    pub async fn running_containers(&self, name_filter: &str) -> Vec<String> {
        match self.inspector.list_containers(name_filter).await {
            Ok(names) => names.into_iter().filter(|n| !n.trim().is_empty()).collect(),
            Err(e) => {
                tracing::debug!("Could not list '{}' containers: {}", name_filter, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CommandOutput;
    use crate::utils::error::StackError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockInspector {
        containers: Vec<String>,
        exec_stdout: String,
        fail_listing: bool,
        exec_calls: Mutex<Vec<(String, String)>>,
    }

    impl MockInspector {
        fn new(containers: &[&str], exec_stdout: &str) -> Self {
            Self {
                containers: containers.iter().map(|c| c.to_string()).collect(),
                exec_stdout: exec_stdout.to_string(),
                fail_listing: false,
                exec_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            let mut inspector = Self::new(&[], "");
            inspector.fail_listing = true;
            inspector
        }
    }

    #[async_trait]
    impl ContainerInspector for MockInspector {
        async fn list_containers(&self, _name_filter: &str) -> Result<Vec<String>> {
            if self.fail_listing {
                return Err(StackError::ProbeError {
                    message: "Cannot connect to the Docker daemon".to_string(),
                });
            }
            Ok(self.containers.clone())
        }

        async fn exec_in_container(&self, container: &str, shell_expr: &str) -> Result<CommandOutput> {
            self.exec_calls
                .lock()
                .unwrap()
                .push((container.to_string(), shell_expr.to_string()));
            Ok(CommandOutput::success(self.exec_stdout.clone()))
        }
    }

    #[tokio::test]
    async fn test_no_container_is_first_run() {
        let inspector = MockInspector::new(&[], "");
        let probe = RuntimeStateProbe::new(&inspector, "/etc/searxng/uwsgi.ini");

        assert!(probe.is_first_run("searxng").await);
        assert!(inspector.exec_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_names_are_ignored() {
        let inspector = MockInspector::new(&["", "  "], "found\n");
        let probe = RuntimeStateProbe::new(&inspector, "/etc/searxng/uwsgi.ini");

        assert!(probe.is_first_run("searxng").await);
    }

    #[tokio::test]
    async fn test_container_without_marker_is_first_run() {
        let inspector = MockInspector::new(&["localai-searxng-1"], "not_found\n");
        let probe = RuntimeStateProbe::new(&inspector, "/etc/searxng/uwsgi.ini");

        assert!(probe.is_first_run("searxng").await);

        let calls = inspector.exec_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "localai-searxng-1");
        assert!(calls[0].1.contains("[ -f /etc/searxng/uwsgi.ini ]"));
    }

    #[tokio::test]
    async fn test_container_with_marker_is_not_first_run() {
        let inspector = MockInspector::new(&["localai-searxng-1"], "found\n");
        let probe = RuntimeStateProbe::new(&inspector, "/etc/searxng/uwsgi.ini");

        assert!(!probe.is_first_run("searxng").await);
    }

    #[tokio::test]
    async fn test_inspection_failure_defaults_to_first_run() {
        let inspector = MockInspector::failing();
        let probe = RuntimeStateProbe::new(&inspector, "/etc/searxng/uwsgi.ini");

        assert!(probe.is_first_run("searxng").await);
        assert!(probe.running_containers("supabase-").await.is_empty());
    }
}
