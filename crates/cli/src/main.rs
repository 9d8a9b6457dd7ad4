// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rl - remotelist CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod error;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, demo, list};

use crate::client::{DaemonClient, DEFAULT_ADDR};
use crate::error::RlError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "rl", version, about = "remotelist - durable named integer lists")]
struct Cli {
    /// Daemon address
    #[arg(long, global = true, env = "RL_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a value to the end of a list, creating the list if needed
    Append {
        /// List name
        list: String,
        /// Value to append
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Remove and print the last value of a list
    Remove {
        /// List name
        list: String,
    },
    /// Print the value at a position in a list
    Get {
        /// List name
        list: String,
        /// Zero-based position
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },
    /// Print the number of values in a list
    Size {
        /// List name
        list: String,
    },
    /// Show daemon status
    Status,
    /// Take a snapshot now and truncate the log
    Snapshot,
    /// Check that the daemon is reachable
    Ping,
    /// Stop the daemon
    Shutdown,
    /// Run the example scenario against the daemon
    Demo(demo::DemoArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<RlError>() {
                Some(rl) => eprint!("{}", rl),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let addr = cli.addr;
    let format = cli.format;

    let mut client = DaemonClient::connect(&addr)
        .await
        .map_err(|e| RlError::from_client(e, &addr))?;

    let result = match cli.command {
        Commands::Append { list, value } => list::append(&mut client, &list, value, format).await,
        Commands::Remove { list } => list::remove(&mut client, &list, format).await,
        Commands::Get { list, index } => list::get(&mut client, &list, index, format).await,
        Commands::Size { list } => list::size(&mut client, &list, format).await,
        Commands::Status => daemon::status(&mut client, format).await,
        Commands::Snapshot => daemon::snapshot(&mut client, format).await,
        Commands::Ping => daemon::ping(&mut client).await,
        Commands::Shutdown => daemon::shutdown(&mut client).await,
        Commands::Demo(args) => demo::handle(&mut client, args).await,
    };

    result.map_err(|e| RlError::from_client(e, &addr).into())
}
