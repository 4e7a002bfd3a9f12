use carsales_price_history::core::engine::{write_page, write_report};
use carsales_price_history::domain::ports::ListingPage;
use carsales_price_history::utils::error::{EnrichError, ErrorSeverity};
use carsales_price_history::utils::{logger, validation::Validate};
use carsales_price_history::{CliConfig, EnrichmentEngine, HtmlPage, RunToggle};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting carsales-price-history");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Enrichment failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<(), EnrichError> {
    cli.validate()?;
    let config = cli.load_config()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    let request = cli.page_request()?;
    let mut engine = EnrichmentEngine::from_config(config)?;
    let mut page = engine.load_page(&request).await?;

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No insights requests will be made");
        print_dry_run(&page);
        return Ok(());
    }

    // Ctrl-C 暫停：停止處理剩餘刊登，已加入的片段保留並輸出；再按一次直接結束
    let toggle = RunToggle::new();
    let token = toggle.resume();
    let ctrl_c_toggle = toggle.clone();
    tokio::spawn(async move {
        let interrupted_again = ctrl_c_toggle
            .pause_on_interrupt(|| async { tokio::signal::ctrl_c().await.is_ok() })
            .await;
        if interrupted_again {
            tracing::warn!("🛑 Interrupted again, exiting without writing output");
            std::process::exit(130);
        }
    });

    let report = engine.run(&mut page, &token).await;
    toggle.shutdown();

    write_page(&page, cli.output.as_deref()).await?;
    if let Some(path) = &cli.report {
        write_report(&report, path).await?;
    }

    for failure in &report.failures {
        eprintln!("⚠️  {}: {}", failure.identifier, failure.message);
    }
    if report.cancelled {
        eprintln!("⏸️ Paused. Run again on the output to continue with the remaining listings.");
    }
    eprintln!(
        "✅ {} of {} listings enriched ({} already done, {} without history)",
        report.attached,
        report.discovered,
        report.skipped_already_enriched,
        report.without_history
    );

    Ok(())
}

fn print_dry_run(page: &HtmlPage) {
    let listings = page.discover();
    println!("📋 {} page, {} listings", page.page_type(), listings.len());
    for listing in listings {
        match page.extract_identifier(listing) {
            Some(identifier) if page.is_already_enriched(listing, &identifier) => {
                println!("  {} (already enriched)", identifier);
            }
            Some(identifier) => println!("  {}", identifier),
            None => println!("  (skipped: no identifier)"),
        }
    }
}
