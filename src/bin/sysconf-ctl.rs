use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use sysconf_daemon::ipc::{INTROSPECTABLE_INTERFACE, SERVICE_INTERFACE};

#[derive(Parser)]
#[command(name = "sysconf-ctl")]
#[command(about = "Control CLI for the sysconf daemon gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8781")]
    url: String,

    /// Bearer key, when the gateway requires one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show daemon status
    Status,
    /// Print the introspection document
    Introspect,
    /// Re-read the configuration file
    Reload,
    /// Write the current configuration to the daemon log
    LogConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let (interface, member) = match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            let json: Value = check(res).await?.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }
        Commands::Introspect => (INTROSPECTABLE_INTERFACE, "Introspect"),
        Commands::Reload => (SERVICE_INTERFACE, "ReloadConfig"),
        Commands::LogConfig => (SERVICE_INTERFACE, "LogConfig"),
    };

    let res = client
        .post(format!("{}/bus/call", cli.url))
        .headers(headers)
        .json(&json!({ "interface": interface, "member": member }))
        .send()
        .await?;
    let json: Value = check(res).await?.json().await?;

    match json.get("reply").and_then(Value::as_str) {
        Some(text) => println!("{}", text),
        None => println!("{} done", member),
    }
    Ok(())
}

async fn check(res: reqwest::Response) -> Result<reqwest::Response, Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    Err(format!("gateway returned status {}: {}", status, text).into())
}
