use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Failed to launch '{program}': {source}")]
    CommandSpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{}' exited with {}", .command, describe_exit(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Container inspection failed: {message}")]
    ProbeError { message: String },

    #[error("Foundation stack not found: {message}")]
    FoundationNotFound { message: String },

    #[error("Another bootstrap holds the namespace lock at {path}")]
    NamespaceLocked { path: String },

    #[error("Invalid UTF-8 in '{path}': {source}")]
    InvalidUtf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Fatal 階段的失敗；嚴重度與建議沿用 `source`
    #[error("Phase '{phase}' failed: {details}")]
    PhaseFailed {
        phase: String,
        details: String,
        #[source]
        source: Box<StackError>,
    },

    #[error("Aborted: {message}")]
    Aborted { message: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Command,
    Runtime,
    FileSystem,
    Concurrency,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StackError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            StackError::IoError(_) | StackError::InvalidUtf8 { .. } => ErrorCategory::FileSystem,
            StackError::SerializationError(_)
            | StackError::ConfigError { .. }
            | StackError::ConfigValidationError { .. }
            | StackError::InvalidConfigValueError { .. }
            | StackError::MissingConfigError { .. }
            | StackError::FoundationNotFound { .. } => ErrorCategory::Configuration,
            StackError::CommandSpawnError { .. } | StackError::CommandFailed { .. } => {
                ErrorCategory::Command
            }
            StackError::PhaseFailed { source, .. } => source.category(),
            StackError::ProbeError { .. } => ErrorCategory::Runtime,
            StackError::NamespaceLocked { .. } => ErrorCategory::Concurrency,
            StackError::Aborted { .. } => ErrorCategory::User,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StackError::PhaseFailed { source, .. } => source.severity(),
            StackError::ProbeError { .. } => ErrorSeverity::Low,
            StackError::NamespaceLocked { .. } => ErrorSeverity::Medium,
            StackError::CommandSpawnError { .. } => ErrorSeverity::Critical,
            StackError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            StackError::ConfigError { .. }
            | StackError::ConfigValidationError { .. }
            | StackError::InvalidConfigValueError { .. }
            | StackError::MissingConfigError { .. }
            | StackError::SerializationError(_) => {
                "Check local-stack.toml and the command line flags".to_string()
            }
            StackError::FoundationNotFound { .. } => {
                "Point --ext-supabase at a directory containing docker-compose.yml and .env"
                    .to_string()
            }
            StackError::CommandSpawnError { program, .. } => {
                format!("Make sure '{}' is installed and on PATH", program)
            }
            StackError::PhaseFailed { source, .. } => source.recovery_suggestion(),
            StackError::CommandFailed { .. } => {
                "Check that the Docker daemon is running and inspect the command output above"
                    .to_string()
            }
            StackError::NamespaceLocked { .. } => {
                "Wait for the other bootstrap to finish, or remove a stale lock file".to_string()
            }
            StackError::ProbeError { .. } => {
                "Container inspection is best-effort; the run continues as a first run".to_string()
            }
            StackError::IoError(_) => "Check file permissions in the project directory".to_string(),
            StackError::InvalidUtf8 { path, .. } => {
                format!("Re-save '{}' as UTF-8; it was left untouched", path)
            }
            StackError::Aborted { .. } => {
                "Use --ext-supabase PATH for an external Supabase installation".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            StackError::CommandFailed {
                command, stderr, ..
            } => {
                let detail = stderr.lines().rev().find(|l| !l.trim().is_empty());
                match detail {
                    Some(line) => format!("Command failed: {} ({})", command, line.trim()),
                    None => format!("Command failed: {}", command),
                }
            }
            StackError::NamespaceLocked { .. } => {
                "Another local-stack run is already in progress".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failure_is_high_severity() {
        let err = StackError::CommandFailed {
            command: "docker compose up -d".to_string(),
            exit_code: Some(1),
            stderr: "pull access denied\n\n".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Command);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.to_string(), "Command 'docker compose up -d' exited with 1");
        assert!(err.user_friendly_message().contains("pull access denied"));
    }

    #[test]
    fn test_phase_failure_keeps_inner_severity() {
        let inner = StackError::CommandSpawnError {
            program: "docker".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let err = StackError::PhaseFailed {
            phase: "teardown".to_string(),
            details: inner.user_friendly_message(),
            source: Box::new(inner),
        };

        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Command);
        assert!(err.recovery_suggestion().contains("'docker' is installed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_signal_exit_rendering() {
        let err = StackError::CommandFailed {
            command: "docker".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().ends_with("signal"));
        assert_eq!(err.user_friendly_message(), "Command failed: docker");
    }
}
