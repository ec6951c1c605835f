#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::StackConfig;

use crate::domain::model::{Environment, Profile};
use crate::utils::error::{Result, StackError};
use crate::utils::validation::Validate;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 基礎堆疊 (Supabase) 的來源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoundationLocation {
    /// 專案目錄內 clone 下來的 compose 檔
    Internal,
    /// 使用者既有的安裝目錄
    External(PathBuf),
}

/// CLI 與 TOML 合併後，一次執行實際使用的設定
#[derive(Debug, Clone)]
pub struct StackSettings {
    pub project_dir: PathBuf,
    pub profile: Profile,
    pub environment: Environment,
    pub foundation: FoundationLocation,
    pub config: StackConfig,
    pub settle_delay: Duration,
}

impl StackSettings {
    pub fn new(project_dir: impl Into<PathBuf>, config: StackConfig) -> Self {
        let settle_delay = Duration::from_secs(config.foundation.settle_seconds);
        Self {
            project_dir: project_dir.into(),
            profile: Profile::default(),
            environment: Environment::default(),
            foundation: FoundationLocation::Internal,
            config,
            settle_delay,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_foundation(mut self, foundation: FoundationLocation) -> Self {
        self.foundation = foundation;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let config = StackConfig::load_or_default(cli.config_path())?;
        config.validate()?;

        let foundation = match &cli.ext_supabase {
            Some(path) => {
                let absolute = if path.is_absolute() {
                    path.clone()
                } else {
                    std::env::current_dir()?.join(path)
                };
                FoundationLocation::External(absolute)
            }
            None => FoundationLocation::Internal,
        };

        Ok(Self::new(cli.project_dir.clone(), config)
            .with_profile(cli.profile)
            .with_environment(cli.environment)
            .with_foundation(foundation))
    }

    pub fn project_name(&self) -> &str {
        &self.config.project.name
    }

    pub fn is_external_foundation(&self) -> bool {
        matches!(self.foundation, FoundationLocation::External(_))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.project_dir
            .join(format!(".{}.lock", self.config.project.name))
    }

    /// 外部模式下確認安裝目錄、compose 檔與 .env 都存在
    pub fn check_foundation(&self) -> Result<()> {
        match &self.foundation {
            FoundationLocation::Internal => {
                let compose = self.project_dir.join(&self.config.foundation.compose_file);
                if !compose.exists() {
                    return Err(StackError::FoundationNotFound {
                        message: format!(
                            "Supabase compose file not found at {}; clone the Supabase docker tree first",
                            compose.display()
                        ),
                    });
                }
                Ok(())
            }
            FoundationLocation::External(path) => check_external_foundation(path),
        }
    }
}

fn check_external_foundation(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(StackError::FoundationNotFound {
            message: format!("External Supabase installation not found at {}", path.display()),
        });
    }

    for required in ["docker-compose.yml", ".env"] {
        let file = path.join(required);
        if !file.exists() {
            return Err(StackError::FoundationNotFound {
                message: format!("Supabase {} not found at {}", required, file.display()),
            });
        }
    }

    tracing::info!("📦 Found external Supabase installation at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_defaults() {
        let settings = StackSettings::new("/srv/stack", StackConfig::default());
        assert_eq!(settings.project_name(), "localai");
        assert_eq!(settings.settle_delay, Duration::from_secs(10));
        assert_eq!(settings.lock_path(), PathBuf::from("/srv/stack/.localai.lock"));
        assert!(!settings.is_external_foundation());
    }

    #[test]
    fn test_external_foundation_requires_compose_and_env() {
        let dir = TempDir::new().unwrap();
        let settings = StackSettings::new(dir.path(), StackConfig::default())
            .with_foundation(FoundationLocation::External(dir.path().to_path_buf()));

        assert!(settings.check_foundation().is_err());

        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        assert!(settings.check_foundation().is_err());

        std::fs::write(dir.path().join(".env"), "POSTGRES_PASSWORD=x\n").unwrap();
        assert!(settings.check_foundation().is_ok());
    }

    #[test]
    fn test_missing_external_directory() {
        let settings = StackSettings::new(".", StackConfig::default()).with_foundation(
            FoundationLocation::External(PathBuf::from("/definitely/not/here")),
        );
        let err = settings.check_foundation().unwrap_err();
        assert!(matches!(err, StackError::FoundationNotFound { .. }));
    }

    #[test]
    fn test_internal_foundation_requires_compose_file() {
        let dir = TempDir::new().unwrap();
        let settings = StackSettings::new(dir.path(), StackConfig::default());
        assert!(settings.check_foundation().is_err());

        let compose = dir.path().join("supabase/docker");
        std::fs::create_dir_all(&compose).unwrap();
        std::fs::write(compose.join("docker-compose.yml"), "services: {}\n").unwrap();
        assert!(settings.check_foundation().is_ok());
    }
}
