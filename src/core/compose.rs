use crate::config::{FoundationLocation, StackSettings};
use crate::domain::model::{CommandSpec, Environment, OutputMode, ResolvedServiceSet};

const DOCKER: &str = "docker";

/// 產生 bootstrap 過程中所有 `docker compose` 指令
///
/// 所有指令共用同一個 `-p <project>`，兩份 compose 樹的容器因此出現在同一個專案底下。
pub struct ComposeCommands<'a> {
    settings: &'a StackSettings,
}

impl<'a> ComposeCommands<'a> {
    pub fn new(settings: &'a StackSettings) -> Self {
        Self { settings }
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "compose".to_string(),
            "-p".to_string(),
            self.settings.project_name().to_string(),
        ]
    }

    fn push_profile(&self, args: &mut Vec<String>) {
        if let Some(flag) = self.settings.profile.compose_flag() {
            args.push("--profile".to_string());
            args.push(flag.to_string());
        }
    }

    fn push_file(args: &mut Vec<String>, file: impl Into<String>) {
        args.push("-f".to_string());
        args.push(file.into());
    }

    /// 停止並移除輔助服務
    pub fn teardown_services(&self) -> CommandSpec {
        let mut args = self.base_args();
        self.push_profile(&mut args);
        Self::push_file(&mut args, &self.settings.config.project.compose_file);
        args.push("down".to_string());

        CommandSpec::new(DOCKER, args).in_dir(&self.settings.project_dir)
    }

    /// 停止並移除基礎堆疊
    pub fn teardown_foundation(&self) -> CommandSpec {
        let mut args = self.base_args();
        match &self.settings.foundation {
            FoundationLocation::Internal => {
                Self::push_file(&mut args, &self.settings.config.foundation.compose_file);
                args.push("down".to_string());
                CommandSpec::new(DOCKER, args).in_dir(&self.settings.project_dir)
            }
            FoundationLocation::External(path) => {
                Self::push_file(&mut args, "docker-compose.yml");
                args.push("down".to_string());
                CommandSpec::new(DOCKER, args).in_dir(path)
            }
        }
    }

    pub fn start_foundation(&self) -> CommandSpec {
        let mut args = self.base_args();
        let public = self.settings.environment == Environment::Public;
        let override_file = &self.settings.config.foundation.public_override;

        match &self.settings.foundation {
            FoundationLocation::Internal => {
                Self::push_file(&mut args, &self.settings.config.foundation.compose_file);
                if public {
                    Self::push_file(&mut args, override_file);
                }
                args.extend(["up".to_string(), "-d".to_string()]);
                CommandSpec::new(DOCKER, args).in_dir(&self.settings.project_dir)
            }
            FoundationLocation::External(path) => {
                Self::push_file(&mut args, "docker-compose.yml");
                if public {
                    // 外部目錄裡沒有覆寫檔，改用本專案的絕對路徑
                    let override_path = absolute(&self.settings.project_dir).join(override_file);
                    if override_path.exists() {
                        Self::push_file(&mut args, override_path.to_string_lossy());
                    } else {
                        tracing::warn!(
                            "⚠️ Public Supabase override not found at {}, starting without it",
                            override_path.display()
                        );
                    }
                }
                args.extend(["up".to_string(), "-d".to_string()]);
                CommandSpec::new(DOCKER, args).in_dir(path)
            }
        }
    }

    /// 啟動輔助服務；`services` 為 `None` 時啟動所有服務
    pub fn start_services(&self, services: Option<&ResolvedServiceSet>) -> CommandSpec {
        let project = &self.settings.config.project;
        let mut args = self.base_args();
        self.push_profile(&mut args);
        Self::push_file(&mut args, &project.compose_file);
        match self.settings.environment {
            Environment::Private => Self::push_file(&mut args, &project.private_override),
            Environment::Public => Self::push_file(&mut args, &project.public_override),
        }
        args.extend(["up".to_string(), "-d".to_string()]);
        if let Some(services) = services {
            args.extend(services.iter().cloned());
        }

        let spec = CommandSpec::new(DOCKER, args).in_dir(&self.settings.project_dir);
        if self.settings.is_external_foundation() {
            spec.with_output(OutputMode::Filtered {
                quiet: true,
                suppress_orphan_warning: true,
            })
        } else {
            spec
        }
    }

    /// `docker ps` 只列出名稱
    pub fn list_containers(name_filter: &str) -> CommandSpec {
        CommandSpec::new(
            DOCKER,
            [
                "ps".to_string(),
                "--filter".to_string(),
                format!("name={}", name_filter),
                "--format".to_string(),
                "{{.Names}}".to_string(),
            ],
        )
        .with_output(OutputMode::Capture)
    }

    pub fn exec_in_container(container: &str, shell_expr: &str) -> CommandSpec {
        CommandSpec::new(DOCKER, ["exec", container, "sh", "-c", shell_expr])
            .with_output(OutputMode::Capture)
    }
}

fn absolute(path: &std::path::Path) -> std::path::PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackConfig;
    use crate::domain::model::Profile;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn settings() -> StackSettings {
        StackSettings::new("/srv/stack", StackConfig::default())
    }

    #[test]
    fn test_teardown_services_with_profile() {
        let settings = settings().with_profile(Profile::GpuNvidia);
        let spec = ComposeCommands::new(&settings).teardown_services();

        assert_eq!(
            spec.display(),
            "docker compose -p localai --profile gpu-nvidia -f docker-compose.yml down"
        );
        assert_eq!(spec.working_dir, Some(PathBuf::from("/srv/stack")));
    }

    #[test]
    fn test_none_profile_omits_flag() {
        let settings = settings().with_profile(Profile::None);
        let commands = ComposeCommands::new(&settings);

        assert!(!commands.teardown_services().has_arg("--profile"));
        assert!(!commands.start_services(None).has_arg("--profile"));
    }

    #[test]
    fn test_internal_foundation_commands() {
        let settings = settings().with_environment(Environment::Public);
        let commands = ComposeCommands::new(&settings);

        assert_eq!(
            commands.teardown_foundation().display(),
            "docker compose -p localai -f supabase/docker/docker-compose.yml down"
        );
        assert_eq!(
            commands.start_foundation().display(),
            "docker compose -p localai -f supabase/docker/docker-compose.yml -f docker-compose.override.public.supabase.yml up -d"
        );

        let private = self::settings();
        assert!(!ComposeCommands::new(&private)
            .start_foundation()
            .has_arg("docker-compose.override.public.supabase.yml"));
    }

    #[test]
    fn test_external_foundation_runs_in_its_directory() {
        let project = TempDir::new().unwrap();
        let external = TempDir::new().unwrap();
        std::fs::write(
            project.path().join("docker-compose.override.public.supabase.yml"),
            "services: {}\n",
        )
        .unwrap();

        let settings = StackSettings::new(project.path(), StackConfig::default())
            .with_environment(Environment::Public)
            .with_foundation(FoundationLocation::External(external.path().to_path_buf()));
        let commands = ComposeCommands::new(&settings);

        let down = commands.teardown_foundation();
        assert_eq!(down.working_dir.as_deref(), Some(external.path()));
        assert_eq!(down.display(), "docker compose -p localai -f docker-compose.yml down");

        let up = commands.start_foundation();
        let override_path = project
            .path()
            .join("docker-compose.override.public.supabase.yml");
        assert!(up.has_arg(&override_path.to_string_lossy()));
        assert_eq!(up.working_dir.as_deref(), Some(external.path()));

        let services = commands.start_services(None);
        assert!(matches!(
            services.output,
            OutputMode::Filtered {
                quiet: true,
                suppress_orphan_warning: true
            }
        ));
    }

    #[test]
    fn test_external_foundation_skips_missing_override() {
        let project = TempDir::new().unwrap();
        let external = TempDir::new().unwrap();
        let settings = StackSettings::new(project.path(), StackConfig::default())
            .with_environment(Environment::Public)
            .with_foundation(FoundationLocation::External(external.path().to_path_buf()));

        let up = ComposeCommands::new(&settings).start_foundation();
        assert_eq!(up.display(), "docker compose -p localai -f docker-compose.yml up -d");
    }

    #[test]
    fn test_start_named_services() {
        let settings = settings();
        let services: ResolvedServiceSet = ["n8n", "caddy", "n8n-import"].into_iter().collect();
        let spec = ComposeCommands::new(&settings).start_services(Some(&services));

        assert_eq!(
            spec.display(),
            "docker compose -p localai --profile cpu -f docker-compose.yml -f docker-compose.override.private.yml up -d caddy n8n n8n-import"
        );
        assert_eq!(spec.output, OutputMode::Inherit);
    }

    #[test]
    fn test_inspection_commands() {
        assert_eq!(
            ComposeCommands::list_containers("searxng").display(),
            "docker ps --filter name=searxng --format {{.Names}}"
        );
        let exec = ComposeCommands::exec_in_container("searxng", "echo found");
        assert_eq!(exec.args, vec!["exec", "searxng", "sh", "-c", "echo found"]);
    }
}
