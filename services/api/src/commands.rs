//! Command-line runners for the pipeline stages. Each one loads the
//! configuration, assembles the controller and renders the stage report.

use crate::infra::{build_controller, SqliteStagingStore};
use clap::Args;
use renewal_gate::config::AppConfig;
use renewal_gate::error::AppError;
use renewal_gate::pipeline::correlate::similar::near_matches;
use renewal_gate::pipeline::{
    CorrelationRun, NormalizationRun, OutcomeState, PipelineController, ValidationRun, WoqRecord,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct FeedArgs {
    /// Path to the CSV feed
    pub(crate) feed: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CorrelateArgs {
    /// Print close order numbers for this probe after correlating
    #[arg(long)]
    pub(crate) probe: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Override the configured export directory
    #[arg(long)]
    pub(crate) destination: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Path to the renewal CSV feed
    pub(crate) renewal_feed: PathBuf,
    /// Path to the work-order-query CSV feed
    pub(crate) woq_feed: PathBuf,
    /// Override the configured export directory
    #[arg(long)]
    pub(crate) destination: Option<PathBuf>,
}

fn controller() -> Result<Arc<PipelineController<SqliteStagingStore>>, AppError> {
    let config = AppConfig::load()?;
    build_controller(&config)
}

pub(crate) fn run_validate(args: FeedArgs) -> Result<(), AppError> {
    let controller = controller()?;
    let report = controller.validate_renewals(&args.feed);
    if !report.success {
        println!("Validation failed: {}", report.message);
        return Ok(());
    }

    println!("Validation: {}", report.message);
    if let Some(run) = &report.payload {
        render_validation(run);
    }
    Ok(())
}

pub(crate) fn run_normalize(args: FeedArgs) -> Result<(), AppError> {
    let controller = controller()?;
    let report = controller.normalize_woq(&args.feed);
    if !report.success {
        println!("Normalization failed: {}", report.message);
        return Ok(());
    }

    println!("Normalization: {}", report.message);
    if let Some(run) = &report.payload {
        render_normalization(run);
    }
    Ok(())
}

pub(crate) fn run_correlate(args: CorrelateArgs) -> Result<(), AppError> {
    let controller = controller()?;
    let report = controller.correlate();
    if !report.success {
        println!("Correlation failed: {}", report.message);
        return Ok(());
    }

    println!("Correlation: {}", report.message);
    if let Some(run) = &report.payload {
        render_correlation(run);
        if let Some(probe) = &args.probe {
            render_near_matches(probe, run);
        }
    }
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let controller = controller()?;
    let report = controller.export_rpa(args.destination.as_deref());
    if !report.success {
        println!("Export failed: {}", report.message);
        return Ok(());
    }

    println!("Export: {}", report.message);
    Ok(())
}

pub(crate) fn run_full(args: RunArgs) -> Result<(), AppError> {
    let RunArgs {
        renewal_feed,
        woq_feed,
        destination,
    } = args;
    let controller = controller()?;

    println!("Renewal gate run");

    let validation = controller.validate_renewals(&renewal_feed);
    if !validation.success {
        println!("\nValidation failed: {}", validation.message);
        return Ok(());
    }
    println!("\nValidation: {}", validation.message);
    if let Some(run) = &validation.payload {
        render_validation(run);
    }

    let normalization = controller.normalize_woq(&woq_feed);
    if !normalization.success {
        println!("\nNormalization failed: {}", normalization.message);
        return Ok(());
    }
    println!("\nNormalization: {}", normalization.message);
    if let Some(run) = &normalization.payload {
        render_normalization(run);
    }

    let correlation = controller.correlate();
    if !correlation.success {
        println!("\nCorrelation failed: {}", correlation.message);
        return Ok(());
    }
    println!("\nCorrelation: {}", correlation.message);
    if let Some(run) = &correlation.payload {
        render_correlation(run);
    }

    let export = controller.export_rpa(destination.as_deref());
    if !export.success {
        println!("\nExport failed: {}", export.message);
        return Ok(());
    }
    println!("\nExport: {}", export.message);
    Ok(())
}

pub(crate) fn run_status() -> Result<(), AppError> {
    let controller = controller()?;

    match controller.last_validation() {
        Some(snapshot) => {
            let verdict = if snapshot.success { "succeeded" } else { "failed" };
            println!(
                "Last validation of {} at {} {}",
                snapshot.source,
                snapshot.at.format("%Y-%m-%d %H:%M:%S"),
                verdict
            );
            println!("- {}", snapshot.message);
            println!(
                "- {} lines in {} groups | {} correct ({:.2}%)",
                snapshot.stats.total_lines,
                snapshot.stats.groups,
                snapshot.stats.correct_lines,
                snapshot.stats.success_rate_pct()
            );
        }
        None => println!("No validation run recorded"),
    }

    let history = controller.validation_history();
    if history.is_empty() {
        println!("\nHistory: empty");
    } else {
        println!("\nHistory ({} runs kept)", history.len());
        for run in &history {
            println!(
                "- {} {} | {:.2}% of {} lines",
                run.at.format("%Y-%m-%d %H:%M"),
                run.source,
                run.success_rate_pct,
                run.stats.total_lines
            );
        }
    }
    Ok(())
}

pub(crate) fn run_clear() -> Result<(), AppError> {
    let controller = controller()?;
    let report = controller.clear_state();
    if !report.success {
        println!("Clear failed: {}", report.message);
        return Ok(());
    }

    println!("{}", report.message);
    Ok(())
}

fn render_validation(run: &ValidationRun) {
    println!(
        "- {} lines in {} groups | {} correct, {} incorrect",
        run.stats.total_lines, run.stats.groups, run.stats.correct_lines, run.stats.incorrect_lines
    );
    println!("- Success rate: {:.2}%", run.stats.success_rate_pct());
    if let Some(warning) = &run.persistence_warning {
        println!("- Warning: {warning}");
    }

    let flagged: Vec<_> = run
        .lines
        .iter()
        .filter(|line| line.outcome.state != OutcomeState::Correct)
        .collect();
    if flagged.is_empty() {
        println!("- Review queue: empty");
    } else {
        println!("\nLines needing review");
        for line in flagged {
            println!(
                "- {} {} [{}]: {}",
                line.line.order_no,
                line.line.reference,
                line.outcome.state.label(),
                line.outcome.observations
            );
        }
    }
}

fn render_normalization(run: &NormalizationRun) {
    println!("- {} records ({} closed)", run.total, run.closed_count);
    if let Some(warning) = &run.persistence_warning {
        println!("- Warning: {warning}");
    }
    if !run.diagnostics.is_empty() {
        println!("\nDiagnostics");
        for note in &run.diagnostics {
            println!("- {note}");
        }
    }
}

fn render_correlation(run: &CorrelationRun) {
    let stats = &run.stats;
    println!(
        "- {} records | {} closed, {} pending",
        stats.total, stats.closed, stats.pending
    );
    println!(
        "- {} eligible, {} unmatched | cross rate {:.2}%",
        stats.eligible, stats.unmatched, stats.cross_rate_pct
    );
}

fn render_near_matches(probe: &str, run: &CorrelationRun) {
    let woq: Vec<WoqRecord> = run.records.iter().map(|record| record.woq.clone()).collect();
    let matches = near_matches(probe, &woq);
    if matches.is_empty() {
        println!("\nNo near matches for '{probe}'");
    } else {
        println!("\nNear matches for '{probe}'");
        for candidate in matches {
            println!("- {} (ratio {:.2})", candidate.order_no, candidate.ratio);
        }
    }
}
