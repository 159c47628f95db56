use crate::commands::{run_status, run_submit, StatusArgs, SubmitArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use siteline::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "siteline",
    about = "Serve and exercise the business-hours and lead intake backend",
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
    /// Print the open/closed status for now or a given local time
    Status(StatusArgs),
    /// Send one lead to the configured intake endpoint
    Submit(SubmitArgs),
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
        Command::Status(args) => run_status(args),
        Command::Submit(args) => run_submit(args).await,
    }
}
