mod config;
mod engine;
mod execution;
mod insight;
mod market;
mod monitoring;
mod report;
mod scan;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use config::{Config, EnvConfig};
use execution::budget::BudgetLedger;
use execution::planner::PurchasePlanner;
use execution::store::TransactionStore;
use execution::types::TransactionStatus;
use market::http::HttpProducer;
use monitoring::logger::CsvLogger;
use scan::ScanOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // `spreadscout ask <question>` answers from the canned help table and
    // exits without scanning.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("ask") {
        println!("{}", insight::respond(&args[1..].join(" ")));
        return Ok(());
    }

    tracing::info!("🔎 Spreadscout starting...");

    // Load configuration
    tracing::info!("Loading configuration...");
    let mut config = Config::load("config.toml")?;
    let env_config = EnvConfig::load()?;
    env_config.apply(&mut config);

    tracing::info!("Minimum ROI: {}%", config.scan.min_roi);
    tracing::info!(
        "{} platforms, {} products configured",
        config.platforms.len(),
        config.scan.products.len()
    );
    tracing::info!("Auto-purchase: {}", config.risk.auto_purchase_enabled);

    // Initialize database
    tracing::info!("Opening database: {}", config.system.database_path);
    let store = TransactionStore::new(&config.system.database_path)?;
    let pending = store.get_by_status(TransactionStatus::Pending)?;
    tracing::info!(
        "Pending transactions from earlier runs: {} ({} created today)",
        pending.len(),
        store.count_today()?
    );

    // One scan pass over the configured product list
    let producer = Arc::new(HttpProducer::new(config.platforms.clone()));
    let orchestrator = ScanOrchestrator::new(&config, producer);
    let (scan_report, opportunities) = orchestrator.run_detailed().await;

    tracing::info!(
        "📊 Scan complete: {} observations, {} opportunities, {} fetch failures",
        scan_report.total_observations,
        scan_report.total_opportunities,
        scan_report.fetch_failures
    );
    if scan_report.unknown_currency_skips > 0 {
        tracing::warn!(
            "{} pairs skipped on unknown currency; check the [rates] table",
            scan_report.unknown_currency_skips
        );
    }
    if let Some(best) = &scan_report.best_opportunity {
        tracing::info!(
            "🏆 Best: '{}' {} -> {} | profit ${:.2} | ROI {:.1}% | risk {:?}",
            best.product_name,
            best.source_platform,
            best.target_platform,
            best.net_profit,
            best.roi_percentage,
            best.risk_level
        );
    }
    tracing::info!(
        "💵 Total potential profit (theoretical upper bound): ${:.2}",
        scan_report.total_potential_profit
    );
    tracing::info!("{}", insight::recommendation(&scan_report));

    // Optional CSV sink
    if config.monitoring.csv_logging {
        let logger = CsvLogger::new(config.monitoring.csv_log_path.clone())?;
        for opportunity in &opportunities {
            logger.log_opportunity(opportunity)?;
        }
        logger.log_event(&format!(
            "scan complete: {} products, {} opportunities",
            scan_report.products_scanned, scan_report.total_opportunities
        ))?;
        tracing::info!(
            "Logged {} opportunities to {}",
            opportunities.len(),
            config.monitoring.csv_log_path
        );
    }

    // Optional auto-purchase pass over the ranked list
    if config.risk.auto_purchase_enabled {
        let today = Utc::now().date_naive();
        let mut ledger = BudgetLedger::new(
            today,
            config.risk.daily_budget_usd,
            config.risk.max_investment_per_product_usd,
            true,
        );
        // Pick up what earlier runs already committed today.
        ledger.record(store.spent_today()?);

        let planner = PurchasePlanner::new(config.risk.min_confidence);
        let mut approved = 0;
        for opportunity in &opportunities {
            match planner.decide(opportunity, &mut ledger, today) {
                Ok(tx) => {
                    store.insert(&tx)?;
                    approved += 1;
                }
                Err(decline) => {
                    tracing::debug!("'{}' not purchased: {}", opportunity.product_name, decline);
                }
            }
        }
        tracing::info!(
            "🤖 {} purchases queued, ${:.2} committed today, ${:.2} of the budget remaining",
            approved,
            ledger.spent(),
            ledger.remaining()
        );
    }

    // Machine-readable report for downstream consumers
    println!("{}", serde_json::to_string_pretty(&scan_report)?);

    Ok(())
}
