use crate::domain::model::Profile;
use crate::utils::error::{Result, StackError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 階段失敗時整個序列要如何處理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 中止後續所有階段
    Fatal,
    /// 記錄警告後繼續
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Degraded,
    Failed,
}

/// 階段執行成功時回報的內容
#[derive(Debug, Clone, Default)]
pub struct PhaseOutput {
    pub message: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PhaseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// 單一階段的執行結果
#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    pub phase_name: String,
    pub status: PhaseStatus,
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
    pub message: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// 各階段共用的執行資訊
#[derive(Debug, Clone)]
pub struct PhaseContext {
    pub execution_id: String,
    pub profile: Profile,
}

impl PhaseContext {
    pub fn new(execution_id: String, profile: Profile) -> Self {
        Self {
            execution_id,
            profile,
        }
    }
}

/// bootstrap 的一個步驟
#[async_trait::async_trait]
pub trait BootstrapPhase: Send + Sync {
    fn name(&self) -> &str;

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Fatal
    }

    async fn execute(&self, context: &PhaseContext) -> Result<PhaseOutput>;
}

/// 依序執行各階段；Fatal 階段失敗時中止
pub struct PhaseSequence {
    phases: Vec<Box<dyn BootstrapPhase>>,
    execution_id: String,
    profile: Profile,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    results: Vec<PhaseResult>,
}

impl PhaseSequence {
    pub fn new(execution_id: String, profile: Profile) -> Self {
        Self {
            phases: Vec::new(),
            execution_id,
            profile,
            started_at: None,
            finished_at: None,
            results: Vec::new(),
        }
    }

    pub fn add_phase(&mut self, phase: Box<dyn BootstrapPhase>) {
        self.phases.push(phase);
    }

    /// 目前為止的結果，失敗時也包含失敗的那一個階段
    pub fn results(&self) -> &[PhaseResult] {
        &self.results
    }

    pub async fn execute_all(&mut self) -> Result<Vec<PhaseResult>> {
        let context = PhaseContext::new(self.execution_id.clone(), self.profile);
        self.results.clear();
        self.started_at = Some(Utc::now());

        let outcome = self.run_phases(&context).await;
        self.finished_at = Some(Utc::now());

        outcome.map(|_| self.results.clone())
    }

    async fn run_phases(&mut self, context: &PhaseContext) -> Result<()> {
        for phase in &self.phases {
            let start_time = Instant::now();

            tracing::info!("▶️ Phase: {}", phase.name());
            match phase.execute(context).await {
                Ok(output) => {
                    let result = PhaseResult {
                        phase_name: phase.name().to_string(),
                        status: PhaseStatus::Completed,
                        duration: start_time.elapsed(),
                        message: output.message,
                        metadata: output.metadata,
                    };

                    tracing::info!(
                        "✅ Phase completed: {} (duration: {:?})",
                        result.phase_name,
                        result.duration
                    );

                    self.results.push(result);
                }
                Err(e) => match phase.failure_policy() {
                    FailurePolicy::Degraded => {
                        tracing::warn!("⚠️ Phase {} failed, continuing: {}", phase.name(), e);
                        let result = PhaseResult {
                            phase_name: phase.name().to_string(),
                            status: PhaseStatus::Degraded,
                            duration: start_time.elapsed(),
                            message: Some(e.to_string()),
                            metadata: HashMap::new(),
                        };
                        self.results.push(result);
                    }
                    FailurePolicy::Fatal => {
                        tracing::error!("❌ Phase execution failed: {}", e);
                        self.results.push(PhaseResult {
                            phase_name: phase.name().to_string(),
                            status: PhaseStatus::Failed,
                            duration: start_time.elapsed(),
                            message: Some(e.to_string()),
                            metadata: HashMap::new(),
                        });
                        return Err(StackError::PhaseFailed {
                            phase: phase.name().to_string(),
                            details: e.user_friendly_message(),
                            source: Box::new(e),
                        });
                    }
                },
            }
        }

        Ok(())
    }

    /// 執行摘要，可直接輸出成 JSON
    pub fn get_execution_summary(&self) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();
        let total_duration: Duration = self.results.iter().map(|r| r.duration).sum();
        let failed = self.results.iter().any(|r| r.status == PhaseStatus::Failed);

        summary.insert(
            "execution_id".to_string(),
            serde_json::Value::String(self.execution_id.clone()),
        );
        summary.insert(
            "profile".to_string(),
            serde_json::Value::String(self.profile.to_string()),
        );
        summary.insert(
            "total_phases".to_string(),
            serde_json::Value::Number(self.results.len().into()),
        );
        summary.insert(
            "total_duration_ms".to_string(),
            serde_json::Value::Number((total_duration.as_millis() as u64).into()),
        );
        summary.insert(
            "status".to_string(),
            serde_json::Value::String(if failed { "failed" } else { "succeeded" }.to_string()),
        );
        if let Some(started_at) = self.started_at {
            summary.insert(
                "started_at".to_string(),
                serde_json::Value::String(started_at.to_rfc3339()),
            );
        }
        if let Some(finished_at) = self.finished_at {
            summary.insert(
                "finished_at".to_string(),
                serde_json::Value::String(finished_at.to_rfc3339()),
            );
        }
        summary.insert(
            "phases".to_string(),
            serde_json::to_value(&self.results).unwrap_or(serde_json::Value::Null),
        );

        summary
    }
}
