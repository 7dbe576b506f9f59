use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "powchain-cli")]
#[command(about = "CLI client for the powchain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// List every block
    Blocks,
    /// Show the latest block height and hash
    Head,
    /// Ask the node to validate its chain
    Validate,
}

#[derive(Serialize)]
struct TxIn {
    sender: String,
    recipient: String,
    amount: u64,
}

fn endpoint(node: &str, path: &str) -> String {
    format!("{}/{}", node.trim_end_matches('/'), path)
}

async fn print_response(res: Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    debug!("status: {status}");
    if !status.is_success() {
        anyhow::bail!("node returned {status}: {body}");
    }
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let res = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => {
            let tx = TxIn {
                sender,
                recipient,
                amount,
            };
            client
                .post(endpoint(&cli.node, "transactions"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Blocks => client.get(endpoint(&cli.node, "blocks")).send().await?,
        Command::Head => client.get(endpoint(&cli.node, "chain/head")).send().await?,
        Command::Validate => {
            client
                .get(endpoint(&cli.node, "chain/validate"))
                .send()
                .await?
        }
    };
    print_response(res).await
}
