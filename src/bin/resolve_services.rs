use anyhow::Context;
use clap::Parser;
use local_stack::core::resolver::DependencyResolver;
use local_stack::utils::logger;
use local_stack::{Profile, ServiceCatalog, ServiceSelection, StackConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resolve-services")]
#[command(about = "Print the compose services a selection of logical services expands to")]
struct Args {
    /// Logical service names; the whole catalog when omitted
    #[arg(value_delimiter = ',')]
    services: Vec<String>,

    /// Hardware profile used to pick variants
    #[arg(long, value_enum, default_value_t = Profile::Cpu)]
    profile: Profile,

    /// TOML file with a [catalog] section to use instead of the built-in catalog
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print JSON instead of one name per line
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => StackConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => StackConfig::default(),
    };
    let catalog = ServiceCatalog::load(config.catalog.as_ref()).context("Invalid service catalog")?;

    let (services, unknown, gateway_injected) = match ServiceSelection::from_names(&args.services) {
        ServiceSelection::All => (catalog.all_concrete(args.profile), Vec::new(), false),
        ServiceSelection::Named(names) => {
            let report = DependencyResolver::new(&catalog).resolve_with_report(&names, args.profile);
            (report.services, report.unknown, report.gateway_injected)
        }
    };

    if args.json {
        let output = serde_json::json!({
            "profile": args.profile,
            "services": services,
            "unknown": unknown,
            "gateway_injected": gateway_injected,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for service in services.iter() {
            println!("{}", service);
        }
        for name in &unknown {
            eprintln!("unknown service: {}", name);
        }
    }

    Ok(())
}
