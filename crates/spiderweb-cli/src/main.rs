// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Spiderweb node process driver.
//!
//! Starts one configured [`spiderweb::Node`] and keeps it running
//! until interrupted. This is a thin process shell, not the
//! interactive publish/subscribe console — that surface is out of
//! scope for this crate.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (node id required)
//! spiderweb-cli --node-id alice
//!
//! # From a config file
//! spiderweb-cli --config node.toml
//!
//! # Write an example config file
//! spiderweb-cli gen-config --output node.toml
//! ```

use clap::{Parser, Subcommand};
use spiderweb::{Node, NodeConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "spiderweb-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node identifier, used when no config file is given
    #[arg(long)]
    node_id: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an example configuration file and exit
    GenConfig {
        #[arg(short, long, default_value = "spiderweb.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(Commands::GenConfig { output }) = args.command {
        return cmd_gen_config(output);
    }

    let config = if let Some(path) = args.config {
        info!("loading config from {:?}", path);
        NodeConfig::from_file(&path)?
    } else {
        let node_id = args
            .node_id
            .ok_or("either --config or --node-id is required")?;
        NodeConfig {
            node_id,
            ..Default::default()
        }
    };

    info!("+----------------------------------------------------+");
    info!("|       Spiderweb node v{}                        |", env!("CARGO_PKG_VERSION"));
    info!("+----------------------------------------------------+");
    info!("|  Node id: {:40} |", config.node_id);
    info!("|  Payload: {:40} |", config.multicast_payload_addr);
    info!("|  Control: {:40} |", config.multicast_control_addr);
    info!("|  Fetch:   {:40} |", config.fetch_bind_addr);
    info!("+----------------------------------------------------+");

    let node = Node::new(config)?;
    node.start()?;

    let shutdown_node = node.clone();
    ctrlc::set_handler(move || {
        info!("shutdown signal received, stopping node...");
        let _ = shutdown_node.stop();
        std::process::exit(0);
    })?;

    info!("node running, press Ctrl+C to stop");
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = NodeConfig {
        node_id: "example-node".into(),
        ..Default::default()
    };
    let toml_str = toml::to_string_pretty(&config)?;
    let content = format!("# Spiderweb node configuration\n# Generated by spiderweb-cli gen-config\n\n{}", toml_str);
    std::fs::write(&output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}
