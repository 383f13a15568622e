use clap::Parser;
use recon_probe::config::resolve_discriminators;
use recon_probe::config::toml_config::TomlConfig;
use recon_probe::core::SchedulerSettings;
use recon_probe::utils::{logger, validation::Validate};
use recon_probe::{build_family, LocalStorage, ProbeEngine, ProbeError, ReportWriter};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "toml-probe")]
#[command(about = "Run a probe plan described in a TOML file")]
struct Args {
    /// Path to TOML plan file
    #[arg(short, long, default_value = "probe-plan.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the plan's target
    #[arg(long)]
    target: Option<String>,

    /// Dry run - show what would be probed without issuing requests
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based probe run");
    tracing::info!("📁 Loading plan from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load plan file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(target) = &args.target {
        config.plan.target = target.clone();
        tracing::info!("🔧 Target overridden to: {}", target);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Plan loaded and validated successfully");

    let storage = LocalStorage::new(".".to_string());
    let discriminators = match resolve_discriminators(
        &storage,
        config.discriminators(),
        config.family.wordlist.as_deref(),
        config.family.kind,
    )
    .await
    {
        Ok(discriminators) => discriminators,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.severity().exit_code());
        }
    };

    display_plan_summary(&config, discriminators.len(), &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No requests will be issued");
        perform_dry_run(&config, &discriminators);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&config, &discriminators, storage, monitor_enabled).await {
        Ok(path) => {
            tracing::info!("✅ Probe run completed successfully!");
            println!("✅ Probe run completed successfully!");
            println!("📁 Report saved to: {}", path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Probe run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

async fn run(
    config: &TomlConfig,
    discriminators: &[String],
    storage: LocalStorage,
    monitor_enabled: bool,
) -> Result<String, ProbeError> {
    let kit = build_family(config.family.kind, &config.family_options())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current wave");
            on_interrupt.cancel();
        }
    });

    let engine = ProbeEngine::new_with_monitoring(config, monitor_enabled).with_cancellation(cancel);
    let report = engine
        .run(
            &config.plan.target,
            discriminators,
            kit.capability.clone(),
            kit.rule.as_ref(),
        )
        .await?;

    let format = config.output_format();
    let path = config
        .output_path()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.{}", config.plan.name, format.extension()));

    ReportWriter::new(storage, format).write(&report, &path).await?;
    Ok(path)
}

fn display_plan_summary(config: &TomlConfig, probes: usize, args: &Args) {
    println!("📋 Plan Summary:");
    println!("  Plan: {}", config.plan.name);
    if let Some(description) = &config.plan.description {
        println!("  Description: {}", description);
    }
    println!("  Target: {}", config.plan.target);
    println!("  Family: {}", config.family.kind);
    println!("  Probes: {}", probes);
    println!(
        "  Waves: {} x {} (timeout {} ms, delay {} ms)",
        probes.div_ceil(config.wave_size().max(1)),
        config.wave_size(),
        config.probe_timeout_ms(),
        config.inter_wave_delay_ms()
    );
    println!("  Format: {:?}", config.output_format());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig, discriminators: &[String]) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Endpoint:");
    match config
        .family
        .endpoint
        .as_deref()
        .or_else(|| config.family.kind.default_endpoint())
    {
        Some(endpoint) => println!("  {}", endpoint),
        None => println!(
            "  Direct requests to the target over {}",
            config.family.scheme.as_deref().unwrap_or("https")
        ),
    }

    println!();
    println!("🎯 Discriminators:");
    for (wave, chunk) in discriminators.chunks(config.wave_size().max(1)).enumerate() {
        println!("  Wave {}: {}", wave + 1, chunk.join(", "));
    }

    println!();
    println!("✅ Dry run completed - plan looks good!");
}
