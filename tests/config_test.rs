use anyhow::Result;
use local_stack::core::resolver::DependencyResolver;
use local_stack::utils::validation::Validate;
use local_stack::{Profile, ServiceCatalog, StackConfig, StackError, StackSettings};
use std::time::Duration;
use tempfile::TempDir;

const CUSTOM_CONFIG: &str = r#"
[project]
name = "lab"
lock = false

[foundation]
settle_seconds = 2

[catalog]
gateway = "proxy"

[catalog.services.proxy]
containers = ["traefik"]

[catalog.services.chat]
containers = ["chat-ui"]
depends_on = ["llm"]

[catalog.services.llm.variants.cpu]
containers = ["llm-cpu"]

[catalog.services.llm.variants.gpu-nvidia]
containers = ["llm-cuda", "llm-warmup"]
"#;

#[test]
fn test_custom_catalog_drives_resolution() -> Result<()> {
    let config = StackConfig::from_toml_str(CUSTOM_CONFIG)?;
    config.validate()?;
    assert!(!config.project.lock);

    let catalog = ServiceCatalog::load(config.catalog.as_ref())?;
    let resolver = DependencyResolver::new(&catalog);

    let resolved = resolver.resolve(&["chat"], Profile::GpuNvidia);
    assert_eq!(resolved.to_vec(), vec!["chat-ui", "llm-cuda", "llm-warmup", "traefik"]);

    // gpu-amd 沒有對應的變體，退回 cpu
    let resolved = resolver.resolve(&["chat"], Profile::GpuAmd);
    assert_eq!(resolved.to_vec(), vec!["chat-ui", "llm-cpu", "traefik"]);

    Ok(())
}

#[test]
fn test_config_file_and_settings() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("local-stack.toml");
    std::fs::write(&path, CUSTOM_CONFIG)?;

    let config = StackConfig::load_or_default(&path)?;
    let settings = StackSettings::new(dir.path(), config);

    assert_eq!(settings.project_name(), "lab");
    assert_eq!(settings.settle_delay, Duration::from_secs(2));
    assert_eq!(settings.lock_path(), dir.path().join(".lab.lock"));

    let missing = StackConfig::load_or_default(dir.path().join("absent.toml"))?;
    assert_eq!(missing.project.name, "localai");

    Ok(())
}

#[test]
fn test_broken_toml_is_a_validation_error() {
    let broken = StackConfig::from_toml_str("[project\nname = 1");
    assert!(matches!(broken, Err(StackError::ConfigValidationError { .. })));
}

#[test]
fn test_self_dependency_in_catalog_is_rejected() {
    let config = StackConfig::from_toml_str(
        "[catalog.services.loop]\ncontainers = [\"loop\"]\ndepends_on = [\"loop\"]\n",
    )
    .unwrap();

    let err = ServiceCatalog::load(config.catalog.as_ref()).unwrap_err();
    assert!(matches!(err, StackError::ConfigValidationError { .. }));
}
