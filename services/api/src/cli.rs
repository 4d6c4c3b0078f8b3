use crate::commands::{run_chat, run_inquiry, ChatArgs, InquiryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mapleleaf_rentals::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "MapleLeaf Rentals",
    about = "Run the MapleLeaf Rentals backend or drive its workflows from the command line",
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
    /// Walk the five-step rental inquiry and submit it to the intake webhook
    Inquiry(InquiryArgs),
    /// Capture a lead and ask the rental assistant one question
    Chat(ChatArgs),
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
        Command::Inquiry(args) => run_inquiry(args).await,
        Command::Chat(args) => run_chat(args).await,
    }
}
