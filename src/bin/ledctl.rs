use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "ledctl")]
#[command(about = "Management CLI for the LED relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the LED on
    On,
    /// Turn the LED off
    Off,
    /// Show LED state and subscriber count
    Status,
    /// Print state updates as they are pushed
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::On => {
            let res = client.post(format!("{}/led/on", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Off => {
            let res = client.post(format!("{}/led/off", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/led", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Watch => watch(base).await?,
    }

    Ok(())
}

async fn watch(base: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ws_url = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}/ws", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}/ws", rest)
    } else {
        format!("{}/ws", base)
    };

    let (mut stream, _) = connect_async(ws_url.as_str()).await?;
    eprintln!("Watching {}", ws_url);

    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => println!("{}", text.as_str()),
            Message::Close(_) => break,
            _ => {}
        }
    }

    eprintln!("Connection closed");
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
