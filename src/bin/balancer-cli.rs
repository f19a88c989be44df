use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "balancer-cli")]
#[command(about = "Management CLI for the TCP load balancer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token, when the admin surface requires one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe a backend and register it if healthy
    Add { identity: String },
    /// Unregister a backend
    Remove { identity: String },
    /// List registered backends in rotation order
    List,
    /// Restart the health sweep with a new cooldown
    Cooldown { seconds: u64 },
    /// Show balancer status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let request = match &cli.command {
        Commands::Add { identity } => client
            .get(format!("{}/add", cli.url))
            .query(&[("identity", identity)]),
        Commands::Remove { identity } => client
            .get(format!("{}/remove", cli.url))
            .query(&[("identity", identity)]),
        Commands::List => client.get(format!("{}/list", cli.url)),
        Commands::Cooldown { seconds } => client
            .get(format!("{}/cooldown", cli.url))
            .query(&[("seconds", seconds)]),
        Commands::Status => client.get(format!("{}/status", cli.url)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
