// src/lib.rs

pub mod build;
pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod reload;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::{Scheduler, Trigger};
use crate::classify::Classifier;
use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::ConfigFile;
use crate::engine::{Runtime, RuntimeEvent};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::{DiskStore, OutputStore};
use crate::pipeline::Registry;
use crate::reload::{Broadcaster, NullTransport};
use crate::types::AssetCategory;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - classifier / pipeline registry / output store / scheduler
/// - clean + initial full rebuild
/// - file watchers and the reload broadcaster
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_config(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let project_root = config_root_dir(&config_path);
    let source_root = project_root.join(&cfg.project.source_root);
    let output_root = project_root.join(&cfg.project.output_root);

    let store: Arc<dyn OutputStore> = Arc::new(DiskStore::new(output_root));

    if matches!(args.command, Some(Command::Clean)) {
        store.clean()?;
        info!("output root cleaned");
        return Ok(());
    }

    let classifier = Classifier::from_config(&cfg)?;
    let registry = Registry::from_config(&cfg)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut scheduler = Scheduler::new(
        classifier,
        registry,
        fs,
        Arc::clone(&store),
        source_root.clone(),
    );

    // clean → full rebuild, before any watching starts.
    store.clean()?;
    let report = scheduler.schedule(Trigger::FullRebuild)?;
    if report.all_failed() {
        for failure in report.failures() {
            debug!(path = %failure.task.source_path, "initial build failure");
        }
        return Err(anyhow!("initial full build failed entirely").into());
    }

    if args.once {
        info!("--once: initial build done, not watching");
        return Ok(());
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher_handle = watch::spawn_watchers(
        source_root,
        cfg.watch_roots(),
        Duration::from_millis(cfg.watch.debounce_ms),
        cfg.watch.resubscribe_attempts,
        rt_tx.clone(),
    )?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // The CLI has no client connections of its own; a server embedding the
    // runtime supplies its transport (e.g. `reload::ChannelTransport`)
    // instead of the no-op one. The initial build is deliberately not
    // announced: clients can only connect after this point.
    let broadcaster = Broadcaster::new(Arc::new(NullTransport));

    let runtime = Runtime::new(scheduler, broadcaster, rt_rx);
    runtime.run().await
}

fn load_config(config_path: &Path) -> Result<ConfigFile> {
    if config_path.exists() {
        return load_and_validate(config_path);
    }

    // No config file: the built-in layout covers the conventional project
    // structure out of the box.
    debug!(path = ?config_path, "config file not found; using built-in defaults");
    ConfigFile::try_from(config::RawConfigFile::default())
}

/// Figure out a sensible project root.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print the resolved pipeline per category.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    let registry = Registry::from_config(cfg)?;

    println!("assetwatch dry-run");
    println!("  source_root = {}", cfg.project.source_root);
    println!("  output_root = {}", cfg.project.output_root);
    println!("  debounce_ms = {}", cfg.watch.debounce_ms);
    println!();

    for category in AssetCategory::ALL {
        let layout = cfg.category_layout(category);
        let pipeline = registry.pipeline(category)?;
        println!("  [{category}]");
        println!("      watch root: {}", layout.root);
        println!("      patterns: {:?}", layout.patterns);
        if layout.output.is_empty() {
            println!("      output: <output root>");
        } else {
            println!("      output: {}", layout.output);
        }
        let steps = pipeline.step_names();
        if steps.is_empty() {
            println!("      steps: passthrough copy");
        } else {
            println!("      steps: {}", steps.join(" -> "));
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
