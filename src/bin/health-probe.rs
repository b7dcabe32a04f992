use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use health_shim::http::{CHECK_ALIVE_PATH, CHECK_READY_PATH};

#[derive(Parser)]
#[command(name = "health-probe")]
#[command(about = "Query a running health shim; exits 0 only on HTTP 200", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8877")]
    url: String,

    /// Give up after this many seconds.
    #[arg(short, long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check liveness
    Alive,
    /// Check readiness
    Ready,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let path = match cli.command {
        Commands::Alive => CHECK_ALIVE_PATH,
        Commands::Ready => CHECK_READY_PATH,
    };
    let url = format!("{}{}", cli.url.trim_end_matches('/'), path);

    match check(&url, Duration::from_secs(cli.timeout_secs)).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn check(url: &str, timeout: Duration) -> Result<bool, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let res = client.get(url).send().await?;

    let status = res.status();
    let text = res.text().await?;
    print!("{}", text);

    Ok(status == reqwest::StatusCode::OK)
}
