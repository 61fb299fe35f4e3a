mod cli;

use cartwright::{batch, config};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use cli::{Cli, Commands};
use cw_av::{AudioTranscodeRunner, FfmpegTranscoder, IngestWatcher, ToolRegistry};
use cw_core::{AssetId, TimerMarkerSet};
use cw_inventory::{HttpInventoryClient, InventoryApi};
use cw_pipeline::{
    BatchPolicy, BatchReport, Confirmer, CueTrimPipeline, CueTrimPlanner, DeclineAll, JobStage,
    ProgressSender, Step, TrimDecision,
};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

/// Exit status when a failed metadata push stopped the batch.
const EXIT_ABORTED: u8 = 2;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cartwright=trace,cw_pipeline=trace,cw_av=debug,cw_inventory=debug,cw_core=debug"
                .to_string()
        } else {
            "cartwright=info,cw_pipeline=info,cw_av=info,cw_inventory=info,cw_core=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Trim {
            ids,
            from_file,
            dry_run,
            continue_on_reject,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            require_inventory(&config)?;
            let ids = batch::collect_ids(&ids, from_file.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(trim(config, ids, dry_run, continue_on_reject))
        }
        Commands::Plan {
            ids,
            from_file,
            json,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            require_inventory(&config)?;
            let ids = batch::collect_ids(&ids, from_file.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(plan(config, ids, json))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckTools => {
            check_tools(cli.config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("cartwright {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn require_inventory(config: &config::Config) -> Result<()> {
    if config.inventory.base_url.is_empty() {
        anyhow::bail!("No inventory server configured; set inventory.base_url in the config file");
    }
    Ok(())
}

/// Reads `y`/`N` answers from the terminal.
struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, asset: &AssetId, step: Step, detail: &str) -> bool {
        let prompt = format!("{asset}: {step}: {detail}? [y/N] ");
        tokio::task::spawn_blocking(move || {
            use std::io::Write;

            eprint!("{prompt}");
            let _ = std::io::stderr().flush();

            let mut answer = String::new();
            if std::io::stdin().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

async fn trim(
    config: config::Config,
    ids: Vec<AssetId>,
    dry_run: bool,
    continue_on_reject: bool,
) -> Result<ExitCode> {
    let tools = ToolRegistry::discover(&config.tools);
    let transcoder =
        FfmpegTranscoder::from_registry(&tools).context("ffmpeg is required for trimming")?;
    tracing::debug!("Using transcoder at {:?}", transcoder.program());

    let runner = AudioTranscodeRunner::new(
        Arc::new(transcoder),
        IngestWatcher::from_config(&config.ingest),
    );
    let inventory: Arc<dyn InventoryApi> = Arc::new(HttpInventoryClient::new(&config.inventory));

    let mut policy = BatchPolicy::from_config(&config.pipeline);
    if continue_on_reject {
        policy = policy.with_rejection(config::RejectionPolicy::Continue);
    }

    let progress = ProgressSender::new(|e| {
        if e.stage.is_terminal() {
            println!("[{:>3.0}%] {}: {}", e.percent(), e.asset, e.stage);
        }
    });

    let mut pipeline = CueTrimPipeline::new(inventory, runner, config.audio.clone(), &config.pipeline)
        .with_policy(policy)
        .with_progress(progress);

    if dry_run {
        let confirmer: Arc<dyn Confirmer> = if std::io::stdin().is_terminal() {
            Arc::new(StdinConfirmer)
        } else {
            tracing::info!("stdin is not a terminal; dry run declines every change");
            Arc::new(DeclineAll)
        };
        pipeline = pipeline.with_dry_run(confirmer);
        println!("[DRY RUN] Every change will be confirmed first\n");
    }

    let report = pipeline.run(&ids).await;
    print_report(&report);

    if report.is_aborted() {
        Ok(ExitCode::from(EXIT_ABORTED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_report(report: &BatchReport) {
    println!();
    for job in &report.outcomes {
        match &job.stage {
            JobStage::Completed => println!(
                "  ✓ {}  trimmed {} ms -> {}",
                job.asset_id,
                job.cue_offset_ms,
                job.adjusted_markers
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_default()
            ),
            JobStage::Skipped(reason) => println!("  - {}  {}", job.asset_id, reason),
            JobStage::Failed { at, reason } => {
                println!("  ✗ {}  {} failed: {}", job.asset_id, at, reason)
            }
            other => println!("  ? {}  {}", job.asset_id, other),
        }
    }

    if !report.not_processed.is_empty() {
        println!("\nNot processed:");
        for id in &report.not_processed {
            println!("  {}", id);
        }
    }

    println!("\n{}", report);
}

#[derive(Serialize)]
struct PlanEntry {
    asset: AssetId,
    current: Option<TimerMarkerSet>,
    cue_offset_ms: Option<i64>,
    planned: Option<TimerMarkerSet>,
    error: Option<String>,
}

async fn plan(config: config::Config, ids: Vec<AssetId>, json: bool) -> Result<()> {
    let inventory = HttpInventoryClient::new(&config.inventory);
    let planner = CueTrimPlanner::new(config.pipeline.negative_markers);

    let mut entries = Vec::with_capacity(ids.len());
    for asset in ids {
        let mut entry = PlanEntry {
            asset: asset.clone(),
            current: None,
            cue_offset_ms: None,
            planned: None,
            error: None,
        };

        match inventory.fetch(&asset).await {
            Ok(record) => {
                let markers = record.markers();
                match planner.plan(&markers) {
                    Ok(TrimDecision::Trim {
                        cue_offset_ms,
                        adjusted,
                    }) => {
                        entry.cue_offset_ms = Some(cue_offset_ms);
                        entry.planned = Some(adjusted);
                    }
                    Ok(TrimDecision::NoTrimNeeded) => {}
                    Err(e) => entry.error = Some(e.to_string()),
                }
                entry.current = Some(markers);
            }
            Err(e) => entry.error = Some(e.to_string()),
        }

        entries.push(entry);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.asset);
        if let Some(ref error) = entry.error {
            println!("  error: {}", error);
        }
        let Some(ref current) = entry.current else {
            continue;
        };
        match (&entry.cue_offset_ms, &entry.planned) {
            (Some(cue), Some(planned)) => {
                println!("  trim {} ms", cue);
                for name in cw_core::MarkerName::ALL {
                    if current.contains(name) || planned.contains(name) {
                        println!(
                            "    {:<10} {:>8} -> {:>8}",
                            name.as_str(),
                            show(current.get(name)),
                            show(planned.get(name))
                        );
                    }
                }
            }
            _ if entry.error.is_none() => println!("  no cue point; nothing to do"),
            _ => {}
        }
    }

    Ok(())
}

fn show(millis: Option<i64>) -> String {
    millis.map(|m| m.to_string()).unwrap_or_else(|| "-".into())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Trimming needs ffmpeg.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!(
                "  Inventory: {}{}",
                config.inventory.base_url.trim_end_matches('/'),
                config.inventory.api_path
            );
            println!("  Client id: {}", config.inventory.client_id);
            println!("  Audio root: {}", config.audio.root.display());
            println!("  Import dir: {}", config.audio.import_dir.display());
            println!("  Temp dir: {}", config.audio.temp_dir.display());
            println!("  Ingest timeout: {}s", config.ingest.timeout_secs);
            println!("  On rejection: {:?}", config.pipeline.on_rejection);
            println!("  Negative markers: {:?}", config.pipeline.negative_markers);

            let warnings = config.validate();
            if !warnings.is_empty() {
                println!("\nWarnings:");
                for w in warnings {
                    println!("  ! {}", w);
                }
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Audio root: {}", config.audio.root.display());
            println!("  Import dir: {}", config.audio.import_dir.display());
            println!("  Temp dir: {}", config.audio.temp_dir.display());
        }
    }

    Ok(())
}
