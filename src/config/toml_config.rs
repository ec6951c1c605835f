use crate::utils::error::{Result, StackError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "local-stack.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub project: ProjectConfig,
    pub foundation: FoundationConfig,
    pub probe: ProbeConfig,
    pub directive: DirectiveConfig,
    pub secrets: SecretsConfig,
    /// 有設定時完全取代內建的服務目錄
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// compose 專案名稱，所有容器共用
    pub name: String,
    pub compose_file: String,
    pub private_override: String,
    pub public_override: String,
    pub lock: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "localai".to_string(),
            compose_file: "docker-compose.yml".to_string(),
            private_override: "docker-compose.override.private.yml".to_string(),
            public_override: "docker-compose.override.public.yml".to_string(),
            lock: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoundationConfig {
    pub compose_file: String,
    pub public_override: String,
    pub settle_seconds: u64,
    /// 用來偵測其他 Supabase 安裝的容器名稱前綴
    pub container_prefix: String,
}

impl Default for FoundationConfig {
    fn default() -> Self {
        Self {
            compose_file: "supabase/docker/docker-compose.yml".to_string(),
            public_override: "docker-compose.override.public.supabase.yml".to_string(),
            settle_seconds: 10,
            container_prefix: "supabase-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub container_filter: String,
    pub marker_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            container_filter: "searxng".to_string(),
            marker_path: "/etc/searxng/uwsgi.ini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    pub active: String,
    pub commented: String,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            active: "cap_drop: - ALL".to_string(),
            commented: "# cap_drop: - ALL  # Temporarily commented out for first run".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub settings_file: String,
    pub base_file: String,
    pub placeholder: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            settings_file: "searxng/settings.yml".to_string(),
            base_file: "searxng/settings-base.yml".to_string(),
            placeholder: "ultrasecretkey".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub gateway: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, CatalogServiceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogServiceConfig {
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// profile 名稱 -> 該 profile 下的服務
    pub variants: Option<BTreeMap<String, VariantConfig>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantConfig {
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl StackConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StackError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StackError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PROJECT_NAME})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StackError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_project_name("project.name", &self.project.name)?;
        validation::validate_path("project.compose_file", &self.project.compose_file)?;
        validation::validate_path("project.private_override", &self.project.private_override)?;
        validation::validate_path("project.public_override", &self.project.public_override)?;

        validation::validate_path("foundation.compose_file", &self.foundation.compose_file)?;
        validation::validate_range("foundation.settle_seconds", self.foundation.settle_seconds, 0, 600)?;

        validation::validate_non_empty_string("probe.container_filter", &self.probe.container_filter)?;
        validation::validate_path("probe.marker_path", &self.probe.marker_path)?;

        validation::validate_non_empty_string("directive.active", &self.directive.active)?;
        validation::validate_non_empty_string("directive.commented", &self.directive.commented)?;
        if self.directive.active == self.directive.commented {
            return Err(StackError::ConfigValidationError {
                field: "directive".to_string(),
                message: "Active and commented directive text must differ".to_string(),
            });
        }

        validation::validate_path("secrets.settings_file", &self.secrets.settings_file)?;
        validation::validate_path("secrets.base_file", &self.secrets.base_file)?;
        validation::validate_non_empty_string("secrets.placeholder", &self.secrets.placeholder)?;

        // 目錄本身的驗證在建立 ServiceCatalog 時進行
        Ok(())
    }
}

impl Validate for StackConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
