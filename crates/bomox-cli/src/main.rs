// SPDX-License-Identifier: MIT

use anyhow::Result;
use bomox_core::{melbourne_olympic_park, FeedFormat, Observations};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feed URL ending in .json or .axf. Defaults to the latest
    /// observations from Melbourne (Olympic Park).
    #[arg(short, long, env = "BOM_FEED_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a temperature/humidity chart to a PNG file
    Plot {
        /// 1 = stacked panels, 2 = twin-axis overlay (default)
        #[arg(short, long)]
        mode: Option<u8>,
        #[arg(short, long, default_value = "observations.png")]
        output: PathBuf,
    },
    /// Print the station header and copyright notice
    Info,
    /// Print the newest observations as CSV-style rows
    Dump {
        /// Number of rows to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let cli = Cli::parse();
    let url = cli
        .url
        .unwrap_or_else(|| melbourne_olympic_park().url(FeedFormat::Json));

    let observations = Observations::from_url(&url)?;

    match &cli.command {
        Commands::Plot { mode, output } => {
            observations.plot(*mode, output)?;
            println!("Plot written to {}", output.display());
        }
        Commands::Info => {
            println!(
                "Header:\n{}",
                serde_json::to_string_pretty(observations.header())?
            );
            println!(
                "Notice:\n{}",
                serde_json::to_string_pretty(observations.notice())?
            );
            if let Some(time) = observations.latest_time() {
                println!("Latest observation: {}", time);
            }
        }
        Commands::Dump { limit } => {
            let data = observations.data();
            println!("{}", data.columns().join(","));
            for index in 0..data.len().min(*limit) {
                if let Some(row) = data.row(index) {
                    let cells: Vec<String> = row.iter().map(|value| cell_text(value)).collect();
                    println!("{}", cells.join(","));
                }
            }
        }
    }

    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
