//! # tally
//!
//! Command line front end for the receipt service.
//!
//! ## Usage
//! ```bash
//! tally user add borys
//! tally create --user 1 --file receipt.json
//! tally show --user 1 5b0c2f7e-…
//! tally view 5b0c2f7e-… --width 40
//! tally list --user 1 --from 2024-05-01 --to 2024-05-31 --min-total 100 --payment-type cash
//! ```
//!
//! Configuration comes from `TALLY_*` environment variables, optionally
//! loaded from a `.env` file. Receipts are printed as JSON on stdout; logs
//! go to stderr.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tally_core::{ReceiptFilterParams, UserId};
use tally_service::{CreateReceiptRequest, ReceiptResponse, ReceiptService, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Create, list and print sales receipts", version, long_about = None)]
struct Cli {
    /// Database file; overrides TALLY_DATABASE_PATH
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// User management
    #[command(subcommand)]
    User(UserCmds),

    /// Create a receipt from a JSON request body
    #[command(arg_required_else_help = true)]
    Create {
        #[arg(long, help = "Owner user id", value_parser = clap::value_parser!(i64).range(1..))]
        user: UserId,
        #[arg(long, help = "Request body: {\"lineItems\": [...], \"payment\": {...}}. Use - for stdin.")]
        file: PathBuf,
    },

    /// Show one of your receipts as JSON
    #[command(arg_required_else_help = true)]
    Show {
        #[arg(long, help = "Requesting user id")]
        user: UserId,
        receipt_id: String,
    },

    /// Print a receipt as text (public view)
    #[command(arg_required_else_help = true)]
    View {
        receipt_id: String,
        #[arg(long, short = 'w', help = "Line width, 11 to 99")]
        width: Option<usize>,
    },

    /// List your receipts, newest first
    #[command(arg_required_else_help = true)]
    List(ListArgs),
}

#[derive(Debug, Subcommand)]
enum UserCmds {
    /// Register a user
    #[command(arg_required_else_help = true)]
    Add { username: String },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long, help = "Owner user id")]
    user: UserId,
    #[arg(long, help = "Earliest creation time (YYYY-MM-DD or RFC 3339), inclusive")]
    from: Option<String>,
    #[arg(long, help = "Latest creation time (YYYY-MM-DD or RFC 3339), inclusive")]
    to: Option<String>,
    #[arg(long, help = "Minimum total, e.g. 100.00")]
    min_total: Option<String>,
    #[arg(long, help = "cash or cashless")]
    payment_type: Option<String>,
    #[arg(long)]
    skip: Option<i64>,
    #[arg(long)]
    limit: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    tally_service::init_tracing();

    let cli = Cli::parse();

    let mut config = ServiceConfig::load()?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    debug!(?config, "Loaded configuration");

    let service = ReceiptService::from_config(&config).await?;
    let result = run(&service, cli.command).await;
    service.database().close().await;
    result
}

async fn run(service: &ReceiptService, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::User(UserCmds::Add { username }) => {
            let user = service.register_user(&username).await?;
            print_json(&user_json(&user))?;
        }
        Commands::Create { user, file } => {
            let body = read_body(&file)?;
            let request: CreateReceiptRequest =
                serde_json::from_str(&body).context("Invalid receipt request body")?;
            let receipt = service.create_receipt_from(user, &request).await?;
            print_json(&ReceiptResponse::from(&receipt))?;
        }
        Commands::Show { user, receipt_id } => match service.get_receipt(&receipt_id, user).await? {
            Some(receipt) => print_json(&ReceiptResponse::from(&receipt))?,
            None => bail!("Receipt not found: {}", receipt_id),
        },
        Commands::View { receipt_id, width } => {
            match service.view_receipt_text(&receipt_id, width).await? {
                Some(text) => println!("{}", text),
                None => bail!("Receipt not found: {}", receipt_id),
            }
        }
        Commands::List(args) => {
            let params = ReceiptFilterParams {
                start_date: args.from,
                end_date: args.to,
                min_total: args.min_total,
                payment_type: args.payment_type,
            };
            let receipts = service
                .list_receipts(args.user, &params, args.skip, args.limit)
                .await?;
            let response: Vec<ReceiptResponse> =
                receipts.iter().map(ReceiptResponse::from).collect();
            print_json(&response)?;
        }
    }
    Ok(())
}

fn read_body(file: &Path) -> anyhow::Result<String> {
    if file.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    fs::read_to_string(file).with_context(|| format!("Cannot read {}", file.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn user_json(user: &tally_db::User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "username": user.username,
        "createdAt": user.created_at.to_rfc3339(),
    })
}
