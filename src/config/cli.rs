use crate::config::toml_config::DEFAULT_CONFIG_FILE;
use crate::domain::model::{Environment, Profile, ServiceSelection};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "local-stack")]
#[command(about = "Start the foundation stack and the local AI services in order")]
pub struct CliConfig {
    /// Hardware profile for the compose services
    #[arg(long, value_enum, default_value_t = Profile::Cpu)]
    pub profile: Profile,

    /// Which compose override to apply
    #[arg(long, value_enum, default_value_t = Environment::Private)]
    pub environment: Environment,

    /// Path to an existing Supabase installation (enables external mode)
    #[arg(long = "ext-supabase", value_name = "PATH")]
    pub ext_supabase: Option<PathBuf>,

    /// Logical services to start (comma-separated); starts everything when omitted
    #[arg(long, value_delimiter = ',')]
    pub services: Vec<String>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Project root containing the compose files
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Show what would run without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask before replacing running foundation containers
    #[arg(short, long)]
    pub yes: bool,

    /// Execution ID for this run
    #[arg(long)]
    pub execution_id: Option<String>,

    /// Write the execution summary as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl CliConfig {
    pub fn selection(&self) -> ServiceSelection {
        ServiceSelection::from_names(&self.services)
    }

    /// 相對路徑的設定檔以專案目錄為基準
    pub fn config_path(&self) -> PathBuf {
        if self.config.is_absolute() {
            self.config.clone()
        } else {
            self.project_dir.join(&self.config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = CliConfig::parse_from(["local-stack"]);
        assert_eq!(cli.profile, Profile::Cpu);
        assert_eq!(cli.environment, Environment::Private);
        assert_eq!(cli.selection(), ServiceSelection::All);
        assert!(cli.ext_supabase.is_none());
        assert_eq!(cli.config_path(), PathBuf::from("./local-stack.toml"));
    }

    #[test]
    fn test_services_and_profile() {
        let cli = CliConfig::parse_from([
            "local-stack",
            "--profile",
            "gpu-nvidia",
            "--environment",
            "public",
            "--services",
            "N8N,open-webui",
        ]);
        assert_eq!(cli.profile, Profile::GpuNvidia);
        assert_eq!(cli.environment, Environment::Public);
        assert_eq!(
            cli.selection(),
            ServiceSelection::Named(vec!["n8n".to_string(), "open-webui".to_string()])
        );
    }

    #[test]
    fn test_ext_supabase_and_profile_none() {
        let cli = CliConfig::parse_from([
            "local-stack",
            "--profile",
            "none",
            "--ext-supabase",
            "/opt/supabase/docker",
        ]);
        assert_eq!(cli.profile, Profile::None);
        assert_eq!(cli.ext_supabase, Some(PathBuf::from("/opt/supabase/docker")));
    }
}
