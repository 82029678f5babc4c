use clap::{Parser, Subcommand};
use covered_income::api::{CalcArgs, render_report, run_http_server};
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "covered-income",
    about = "Covered-call income calculator with dividend reinvestment projection"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard and JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print the income metrics and 12-month projection as JSON
    Report(CalcArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = run_http_server(port).await {
                error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Report(args) => match render_report(args) {
            Ok(report) => println!("{report}"),
            Err(msg) => {
                error!("{msg}");
                std::process::exit(1);
            }
        },
    }
}
