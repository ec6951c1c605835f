use crate::core::CommandRunner;
use crate::domain::model::{CommandOutput, CommandSpec, OutputMode};
use crate::utils::error::{Result, StackError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

const ORPHAN_WARNING: &str = "Found orphan containers";

/// 以 `tokio::process` 執行外部指令
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if spec.output != OutputMode::Capture {
            println!("Running: {}", spec.display());
        }
        tracing::debug!("Running: {} (cwd: {:?})", spec.display(), spec.working_dir);

        let mut command = Self::command(spec);
        let output = match spec.output {
            OutputMode::Inherit => {
                let status = command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|source| StackError::CommandSpawnError {
                        program: spec.program.clone(),
                        source,
                    })?;
                CommandOutput {
                    exit_code: status.code(),
                    stdout: String::new(),
                    stderr: String::new(),
                }
            }
            OutputMode::Capture | OutputMode::Filtered { .. } => {
                let output = command
                    .stdin(Stdio::null())
                    .output()
                    .await
                    .map_err(|source| StackError::CommandSpawnError {
                        program: spec.program.clone(),
                        source,
                    })?;
                CommandOutput {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                }
            }
        };

        if let OutputMode::Filtered {
            quiet,
            suppress_orphan_warning,
        } = spec.output
        {
            let compose_lifecycle = spec.has_arg("up") || spec.has_arg("down");
            for line in filter_stdout(&output.stdout, quiet && compose_lifecycle) {
                println!("{}", line);
            }
            for line in filter_stderr(&output.stderr, suppress_orphan_warning) {
                eprintln!("{}", line);
            }
        }

        if !output.is_success() {
            return Err(StackError::CommandFailed {
                command: spec.display(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }
}

/// quiet 模式只保留網路與容器狀態摘要，略過逐步的建立與啟動訊息
pub fn filter_stdout(stdout: &str, quiet: bool) -> Vec<&str> {
    const SUMMARY: [&str; 3] = ["Network", "Running", "Container"];
    const PROGRESS: [&str; 6] = ["Creating", "Created", "Starting", "Started", "Waiting", "Healthy"];

    stdout
        .lines()
        .filter(|line| {
            if !quiet {
                return true;
            }
            !line.trim().is_empty()
                && SUMMARY.iter().any(|word| line.contains(word))
                && !PROGRESS.iter().any(|word| line.contains(word))
        })
        .collect()
}

pub fn filter_stderr(stderr: &str, suppress_orphan_warning: bool) -> Vec<&str> {
    stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !(suppress_orphan_warning && line.contains(ORPHAN_WARNING)))
        .collect()
}
