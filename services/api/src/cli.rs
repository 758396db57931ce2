use crate::commands::{
    run_clear, run_correlate, run_export, run_full, run_normalize, run_status, run_validate,
    CorrelateArgs, ExportArgs, FeedArgs, RunArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use renewal_gate::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Renewal Gate",
    about = "Validate renewal feeds and stage RPA-ready exports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Validate a renewal feed and stage its correct lines
    Validate(FeedArgs),
    /// Normalize a work-order-query feed and stage its records
    Normalize(FeedArgs),
    /// Correlate the staged feeds and print crossing statistics
    Correlate(CorrelateArgs),
    /// Export RPA-eligible rows to a timestamped artifact
    Export(ExportArgs),
    /// Run validate, normalize, correlate and export in one pass
    Run(RunArgs),
    /// Show the last validation run and the kept history
    Status,
    /// Clear run state and truncate staging
    Clear,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Validate(args) => run_validate(args),
        Command::Normalize(args) => run_normalize(args),
        Command::Correlate(args) => run_correlate(args),
        Command::Export(args) => run_export(args),
        Command::Run(args) => run_full(args),
        Command::Status => run_status(),
        Command::Clear => run_clear(),
    }
}
