// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::commands::{
    OutputFormat, clean_command, dashboard_command, query_command, run_command, upload_command,
};
use cmd::common::ShipContext;
use diagnostics::*;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "carepond")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Warehouse credential file (overrides CAREPOND_CREDENTIALS)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw sources into analytics tables
    Clean,
    /// Upload the cleaned tables into the warehouse
    Upload,
    /// Clean, then upload
    Run,
    /// Execute SQL against the warehouse
    Query {
        /// SQL statement
        sql: String,
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Interactive dashboard session on stdin/stdout
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();
    log_info!("carepond starting");

    let cli = Cli::parse();
    let ctx = ShipContext::new(cli.config, cli.credentials);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = match &cli.command {
        Commands::Clean => clean_command(&ctx, &mut out).await.map(|_| ()),
        Commands::Upload => upload_command(&ctx, &mut out).map(|_| ()),
        Commands::Run => run_command(&ctx, &mut out).await,
        Commands::Query { sql, format } => query_command(&ctx, sql, *format, &mut out),
        Commands::Dashboard => dashboard_command(&ctx, std::io::stdin().lock(), &mut out),
    };
    out.flush()?;

    if let Err(e) = &result {
        let message = format!("{e:#}");
        log_error!("carepond failed: {error}", error: message.as_str());
    }
    result
}
