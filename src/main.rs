use anyhow::Context;
use lxc_subnet_router::cli::{ConfigDiscovery, Invocation, parse_args};
use lxc_subnet_router::executor::HostExecutor;
use lxc_subnet_router::provision::{self, ProvisionReport, Provisioner};
use lxc_subnet_router::router::RouterConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lxc_subnet_router=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> anyhow::Result<()> {
    // Parse and validate everything before touching the system
    let config = match parse_args(std::env::args_os().skip(1))? {
        Invocation::Help(usage) => {
            println!("{}", usage);
            return Ok(());
        }
        Invocation::Run(raw) => raw.into_config()?,
    };
    debug!("Validated configuration: {:?}", config);

    provision::ensure_root()?;

    let settings = ConfigDiscovery::discover_settings().context("Failed to load settings")?;

    let provisioner = Provisioner::new(HostExecutor::new(), settings);
    let report = provisioner.run(&config).await?;

    print_summary(&config, &report);
    Ok(())
}

fn print_summary(config: &RouterConfig, report: &ProvisionReport) {
    info!("Provisioning finished");

    println!();
    println!("Container {} is set up as a Tailscale subnet router.", report.container_id);
    println!(
        "  Advertised route: {}{}",
        report.advertised,
        if config.auto_detect() { " (auto-detected)" } else { "" }
    );
    if let Some(backup) = &report.config_backup {
        println!("  LXC config backup: {}", backup.display());
    }
    match report.backend_state.as_deref() {
        Some(state) => println!("  Tailscale backend: {}", state),
        None => println!("  Tailscale backend: unknown"),
    }
    println!();
    println!("Approve the advertised route in the Tailscale admin console if it is not auto-approved.");
}
