use clap::Parser;
use recon_probe::adapters::report_writer::render;
use recon_probe::config::resolve_discriminators;
use recon_probe::utils::{logger, validation::Validate};
use recon_probe::{build_family, CliConfig, LocalStorage, ProbeEngine, ProbeError, ReportWriter};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting recon-probe CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    if let Err(e) = run(&config).await {
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

    Ok(())
}

async fn run(config: &CliConfig) -> Result<(), ProbeError> {
    let storage = LocalStorage::new(".".to_string());
    let kit = build_family(config.family, &config.family_options())?;
    let discriminators = resolve_discriminators(
        &storage,
        &config.discriminators,
        config.wordlist.as_deref(),
        config.family,
    )
    .await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing the current wave");
            on_interrupt.cancel();
        }
    });

    let engine = ProbeEngine::new_with_monitoring(config, config.monitor).with_cancellation(cancel);
    let report = engine
        .run(
            &config.target,
            &discriminators,
            kit.capability.clone(),
            kit.rule.as_ref(),
        )
        .await?;

    match &config.output {
        Some(path) => {
            ReportWriter::new(storage, config.format)
                .write(&report, path)
                .await?;
            println!("✅ Probe run completed: {} result(s)", report.total_issued);
            println!("📁 Report saved to: {}", path);
        }
        None => {
            let data = render(&report, config.format)?;
            println!("{}", String::from_utf8_lossy(&data));
        }
    }

    Ok(())
}
