// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workboard command-line binary.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workboard_config::{LogFormat, LoggingConfig, WorkboardConfig};
use workboard_membership::Stores;

mod bootstrap;
mod cli;
mod commands;
mod version;

use cli::{Cli, Command};
use commands::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	// Handle subcommands that need neither config nor database
	if let Command::Version = cli.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let mut config = match &cli.config {
		Some(path) => workboard_config::load_config_with_file(path),
		None => workboard_config::load_config(),
	}
	.context("failed to load configuration")?;
	apply_log_overrides(&mut config.logging, &cli);
	init_tracing(&config.logging);

	tracing::info!(database = %config.database.url, "starting workboard");

	let pool = workboard_db::create_pool(&config.database.url, config.database.max_connections)
		.await
		.context("failed to open database")?;
	workboard_db::run_migrations(&pool)
		.await
		.context("failed to run migrations")?;

	if let Command::Migrate = cli.command {
		print_json(&serde_json::json!({ "migrated": true }))?;
		return Ok(());
	}

	seed(&pool, &config).await?;

	let app = App::new(&Stores::sqlite(pool));
	let output = app.execute(cli.command, &cli.actor).await?;
	print_json(&output)
}

async fn seed(pool: &sqlx::SqlitePool, config: &WorkboardConfig) -> anyhow::Result<()> {
	if let Some(admin) = &config.bootstrap.admin {
		bootstrap::seed_admin(pool, admin)
			.await
			.context("failed to seed bootstrap admin")?;
	}
	Ok(())
}

fn apply_log_overrides(logging: &mut LoggingConfig, cli: &Cli) {
	if let Some(level) = &cli.log_level {
		logging.level = level.clone();
	}
	if cli.json_logs {
		logging.format = LogFormat::Json;
	}
}

/// Logs go to stderr so stdout stays parseable JSON.
fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
			.init(),
		LogFormat::Compact => registry
			.with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
			.init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
			.init(),
	}
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
	let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
	println!("{rendered}");
	Ok(())
}
