//! `scrape` command: restore, collect, persist, export.
//!
//! The acquisition loop runs until it finishes or Ctrl-C arrives. Either way
//! the state is checkpointed once more and the dataset is written, so an
//! interrupted run loses nothing it had collected.

use std::future::Future;
use std::path::PathBuf;

use anyhow::Context;
use carlist_core::AppConfig;
use carlist_scraper::{
    run_acquisition_with_progress, AcquisitionConfig, AcquisitionReport, CheckpointStore,
    ClientConfig, ListingClient, PageSource, ProxyPool,
};
use indicatif::{ProgressBar, ProgressStyle};

use crate::export::export_records;
use crate::summary::print_summary;
use crate::ScrapeArgs;

/// Resolves when the process receives Ctrl-C. If the handler cannot be
/// installed the run simply cannot be interrupted.
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

fn log_report(report: &AcquisitionReport) {
    for locale in &report.per_locale {
        tracing::debug!(
            locale = %locale.locale,
            added = locale.added,
            sub_target = locale.sub_target,
            "locale total"
        );
    }
    tracing::info!(
        added = report.records_added,
        pages_fetched = report.pages_fetched,
        pages_skipped = report.pages_skipped,
        pages_failed = report.pages_failed,
        cards_rejected = report.cards_rejected,
        target_reached = report.target_reached,
        "run complete"
    );
}

/// Bar over the target record count, labelled with the current city.
fn target_progress_bar(target: usize) -> ProgressBar {
    let bar = ProgressBar::new(target as u64);
    let style = ProgressStyle::with_template("{msg:>6} [{bar:40}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

/// What a scrape ended with.
#[derive(Debug)]
pub(crate) struct ScrapeOutcome {
    pub interrupted: bool,
    pub checkpoint_saved: bool,
    /// CSV written, or `None` when nothing had been collected.
    pub exported: Option<PathBuf>,
}

pub(crate) async fn run_scrape(mut config: AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    if let Some(target) = args.target {
        config.target_count = target;
    }

    let proxies = ProxyPool::load(&config.proxies_path);
    let mut client = ListingClient::new(ClientConfig::from_app_config(&config), proxies)
        .context("failed to build HTTP client")?;

    let progress = target_progress_bar(config.target_count);
    let outcome = scrape_until(&config, args, &mut client, &progress, interrupt_signal()).await?;
    if !outcome.checkpoint_saved {
        tracing::warn!(
            path = %config.checkpoint_path.display(),
            "final checkpoint was not written"
        );
    }
    if let Some(path) = &outcome.exported {
        println!("{}", path.display());
    }
    if outcome.interrupted {
        tracing::info!("run was interrupted; rerun to resume from the checkpoint");
    }
    Ok(())
}

/// Restores the checkpoint, runs the loop against `source` until it finishes
/// or `shutdown` resolves, then saves once and exports. `progress` is cleared
/// once the loop stops.
pub(crate) async fn scrape_until<S, F>(
    config: &AppConfig,
    args: &ScrapeArgs,
    source: &mut S,
    progress: &ProgressBar,
    shutdown: F,
) -> anyhow::Result<ScrapeOutcome>
where
    S: PageSource,
    F: Future<Output = ()>,
{
    let store = CheckpointStore::new(&config.checkpoint_path);
    let mut state = store.load();
    let acquisition = AcquisitionConfig::from_app_config(config);

    tracing::info!(
        target = config.target_count,
        restored = state.records.len(),
        locales = acquisition.locales.len(),
        base_url = %config.base_url,
        "starting scrape"
    );

    let interrupted = {
        let run =
            run_acquisition_with_progress(&acquisition, source, Some(&store), &mut state, progress);
        tokio::select! {
            report = run => {
                log_report(&report);
                false
            }
            () = shutdown => {
                tracing::warn!("interrupted; saving progress");
                true
            }
        }
    };

    progress.finish_and_clear();

    let checkpoint_saved = store.save_best_effort(&mut state);

    if state.records.is_empty() {
        tracing::warn!("no records collected; skipping export");
        return Ok(ScrapeOutcome {
            interrupted,
            checkpoint_saved,
            exported: None,
        });
    }

    print_summary(&state.records);
    let path = export_records(
        state.records,
        args.export.dedup,
        args.export.output.as_deref(),
        &config.output_dir,
    )?;

    Ok(ScrapeOutcome {
        interrupted,
        checkpoint_saved,
        exported: Some(path),
    })
}
