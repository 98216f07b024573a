mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::app_server::AppServerArgs;
use commands::paths::PathArgs;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[command(name = "byoserve")]
#[command(author, version, about = "Serve a model behind nginx inside a container", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reverse proxy and the application server (container entry point)
    Serve(ServeArgs),

    /// Run the application server alone (started by `serve`)
    AppServer(AppServerArgs),

    /// Print the resolved configuration
    Config {
        #[command(flatten)]
        paths: PathArgs,
    },
}

// Each command builds its own runtime: `serve` only waits on signals, while
// `app-server` sizes its thread pools from the command line.
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args),
        Commands::AppServer(args) => commands::app_server::execute(args),
        Commands::Config { paths } => commands::config::execute(paths),
    }
}
