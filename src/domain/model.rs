use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::error::StackError;

/// 硬體 / 執行環境 profile，每次執行只會有一個生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    #[default]
    Cpu,
    GpuNvidia,
    GpuAmd,
    None,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Profile::Cpu, Profile::GpuNvidia, Profile::GpuAmd, Profile::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Cpu => "cpu",
            Profile::GpuNvidia => "gpu-nvidia",
            Profile::GpuAmd => "gpu-amd",
            Profile::None => "none",
        }
    }

    /// compose 的 `--profile` 參數；`none` 不帶任何 profile
    pub fn compose_flag(&self) -> Option<&'static str> {
        match self {
            Profile::None => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Profile::Cpu),
            "gpu-nvidia" => Ok(Profile::GpuNvidia),
            "gpu-amd" => Ok(Profile::GpuAmd),
            "none" => Ok(Profile::None),
            other => Err(StackError::InvalidConfigValueError {
                field: "profile".to_string(),
                value: other.to_string(),
                reason: "Expected one of: cpu, gpu-nvidia, gpu-amd, none".to_string(),
            }),
        }
    }
}

/// 決定要疊加哪一個 compose override 檔
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    #[default]
    Private,
    Public,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Private => "private",
            Environment::Public => "public",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一個邏輯服務對應的實際 compose 服務與相依的邏輯服務
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub containers: BTreeSet<String>,
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
}

impl ServiceDescriptor {
    pub fn new<I, D>(containers: I, depends_on: D) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            containers: containers.into_iter().map(Into::into).collect(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.depends_on.is_empty()
    }
}

/// 依 profile 選擇不同 descriptor 的條目
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantTable {
    pub variants: BTreeMap<Profile, ServiceDescriptor>,
}

impl VariantTable {
    pub fn new(variants: impl IntoIterator<Item = (Profile, ServiceDescriptor)>) -> Self {
        Self {
            variants: variants.into_iter().collect(),
        }
    }

    /// 回傳實際採用的 profile 與 descriptor。
    /// 表中沒有的 profile 退回 `cpu`；`none` 永遠是空的。
    pub fn select(&self, profile: Profile) -> (Profile, Option<&ServiceDescriptor>) {
        let key = if self.variants.contains_key(&profile) || profile == Profile::None {
            profile
        } else {
            Profile::Cpu
        };

        if key == Profile::None {
            return (key, None);
        }
        (key, self.variants.get(&key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    Service(ServiceDescriptor),
    Variant(VariantTable),
}

/// 使用者要求啟動的服務範圍
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSelection {
    All,
    Named(Vec<String>),
}

impl ServiceSelection {
    /// 空清單代表全部啟動；名稱會去除空白並轉小寫
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| normalize_service_name(n.as_ref()))
            .filter(|n| !n.is_empty())
            .collect();

        if names.is_empty() {
            ServiceSelection::All
        } else {
            ServiceSelection::Named(names)
        }
    }
}

pub fn normalize_service_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// 解析後要啟動的實際服務集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedServiceSet {
    services: BTreeSet<String>,
}

impl ResolvedServiceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: impl Into<String>) -> bool {
        self.services.insert(service.into())
    }

    pub fn contains(&self, service: &str) -> bool {
        self.services.contains(service)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.services.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.services.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ResolvedServiceSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            services: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// 外部指令的輸出處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// 直接串流到目前的 stdout/stderr
    #[default]
    Inherit,
    /// 全部收集，不輸出
    Capture,
    /// 收集後過濾再輸出
    Filtered {
        quiet: bool,
        suppress_orphan_warning: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
            output: OutputMode::Inherit,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    pub fn display(&self) -> String {
        self.argv().join(" ")
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
