use clap::Parser;
use local_stack::adapters::{DockerInspector, LocalStorage, ProcessRunner};
use local_stack::core::phase_sequence::PhaseStatus;
use local_stack::core::probe::RuntimeStateProbe;
use local_stack::core::{CommandRunner, ContainerInspector};
use local_stack::utils::error::{ErrorSeverity, StackError};
use local_stack::utils::logger;
use local_stack::{BootstrapSequencer, CliConfig, ServiceCatalog, StackSettings};
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting local-stack");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        report_failure(&e);
        let exit_code = exit_code_for(e.severity());
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<(), StackError> {
    let settings = StackSettings::from_cli(&cli)?;
    let catalog = ServiceCatalog::load(settings.config.catalog.as_ref())?;
    let selection = cli.selection();

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new());
    let inspector: Arc<dyn ContainerInspector> = Arc::new(DockerInspector::new(Arc::clone(&runner)));
    let storage = Arc::new(LocalStorage::new(settings.project_dir.clone()));

    // 生成執行 ID
    let execution_id = cli
        .execution_id
        .clone()
        .unwrap_or_else(|| format!("bootstrap_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));
    let sequencer = BootstrapSequencer::new(
        settings,
        catalog,
        Arc::clone(&runner),
        Arc::clone(&inspector),
        storage,
    );

    if cli.dry_run {
        if let Err(e) = sequencer.settings().check_foundation() {
            tracing::warn!("⚠️ {}", e);
        }
        display_plan(&sequencer, &selection, &execution_id)?;
        return Ok(());
    }

    sequencer.settings().check_foundation()?;

    if !sequencer.settings().is_external_foundation() && !cli.yes {
        confirm_internal_foundation(inspector.as_ref(), sequencer.settings()).await?;
    }

    let report = sequencer.run(&selection, execution_id).await?;

    if let Some(path) = &cli.summary {
        let json = serde_json::to_string_pretty(&report.summary)?;
        std::fs::write(path, json)?;
        tracing::info!("📊 Execution summary written to {}", path.display());
    }

    display_results(&report);
    report.into_result().map(|_| ())
}

/// 偵測到其他 Supabase 容器時先詢問，避免覆蓋外部安裝
async fn confirm_internal_foundation(
    inspector: &dyn ContainerInspector,
    settings: &StackSettings,
) -> Result<(), StackError> {
    let probe = RuntimeStateProbe::new(inspector, settings.config.probe.marker_path.clone());
    let running = probe
        .running_containers(&settings.config.foundation.container_prefix)
        .await;
    if running.is_empty() {
        return Ok(());
    }

    println!();
    println!("⚠️  WARNING: Detected running Supabase containers from another installation:");
    for container in &running {
        println!("   - {}", container);
    }
    println!();
    println!("If you intended to use an external Supabase, add --ext-supabase PATH");
    print!("Continue with internal Supabase setup? (y/N): ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(()),
        _ => Err(StackError::Aborted {
            message: "internal Supabase setup declined".to_string(),
        }),
    }
}

fn display_plan<S: local_stack::core::Storage + 'static>(
    sequencer: &BootstrapSequencer<S>,
    selection: &local_stack::ServiceSelection,
    execution_id: &str,
) -> Result<(), StackError> {
    let plan = sequencer.plan(selection);

    println!("🔍 Dry run: {}", execution_id);
    println!("  Project: {}", plan.project);
    println!("  Profile: {}", plan.profile);
    println!("  Environment: {}", plan.environment);
    match &plan.services {
        None => println!("  Services: all"),
        Some(services) if services.is_empty() => println!("  Services: none (nothing will be started)"),
        Some(services) => println!("  Services: {}", services.join(", ")),
    }
    if !plan.unknown_services.is_empty() {
        println!("  Unknown (skipped): {}", plan.unknown_services.join(", "));
    }
    println!("  Settle wait: {:?}", sequencer.settings().settle_delay);
    println!("  Commands:");
    for (index, command) in plan.commands.iter().enumerate() {
        println!("    {}. {}", index + 1, command);
    }

    tracing::debug!("Plan: {}", serde_json::to_string(&plan)?);
    Ok(())
}

fn display_results(report: &local_stack::BootstrapReport) {
    println!();
    println!("📋 Bootstrap results ({}):", report.execution_id);
    for result in &report.results {
        let icon = match result.status {
            PhaseStatus::Completed => "✅",
            PhaseStatus::Degraded => "⚠️",
            PhaseStatus::Failed => "❌",
        };
        match &result.message {
            Some(message) => println!(
                "  {} {} ({:?}) - {}",
                icon, result.phase_name, result.duration, message
            ),
            None => println!("  {} {} ({:?})", icon, result.phase_name, result.duration),
        }
    }

    if report.succeeded() {
        println!("✅ Local stack started successfully!");
    }
}

fn report_failure(e: &StackError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Bootstrap failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}

fn exit_code_for(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
