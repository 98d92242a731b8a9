// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sitegate_config::{load_config, load_config_with_file, SitegateConfig};
use sitegate_core::SiteId;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sitegate", version, about = "Resolve site access from directory group membership", long_about = None)]
struct Args {
	/// Configuration file (defaults to /etc/sitegate/sitegate.toml)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Log filter used when RUST_LOG is unset; overrides the configured level
	#[arg(long, global = true)]
	log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the ordered permission directives built from configuration
	Directives,

	/// Print the entitlement settings available for the given sites
	Slots {
		/// Site id; repeat for several sites
		#[arg(long = "site", required = true)]
		sites: Vec<SiteId>,
	},

	/// Look a user up in the directory and print their access
	Resolve {
		/// Login name matched against the configured user id field
		login: String,
	},

	/// Resolve access for a user record stored as JSON
	ResolveRecord {
		/// JSON object with a `dn` and the user's attributes
		path: PathBuf,
	},
}

fn init_tracing(default_filter: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
	let registry = tracing_subscriber::registry().with(filter);

	if json {
		registry
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		registry
			.with(fmt::layer().with_target(false).with_writer(std::io::stderr))
			.init();
	}
}

fn load(args: &Args) -> Result<SitegateConfig> {
	match &args.config {
		Some(path) => load_config_with_file(path)
			.with_context(|| format!("failed to load configuration from {}", path.display())),
		None => load_config().context("failed to load configuration"),
	}
}

fn print_json(value: &impl Serialize) -> Result<()> {
	let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
	println!("{json}");
	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	let config = load(&args)?;

	let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
	init_tracing(level, args.json_logs);

	match &args.command {
		Command::Directives => print_json(&commands::directives(&config)),
		Command::Slots { sites } => print_json(&commands::slots(&config, sites)),
		Command::Resolve { login } => print_json(&commands::resolve_login(&config, login).await?),
		Command::ResolveRecord { path } => {
			print_json(&commands::resolve_record(&config, path).await?)
		}
	}
}
