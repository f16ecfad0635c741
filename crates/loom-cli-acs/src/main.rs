// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! `loom-acs`: ask ACS for authorization decisions from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use loom_server_acs::{config, AcsClient, AcsError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "loom_acs=info,loom_server_acs=info";

/// Exit status for a decision other than PERMIT.
const EXIT_DENIED: u8 = 1;
/// Exit status when no decision could be obtained.
const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(
	name = "loom-acs",
	about = "Query an ACS policy-evaluation service",
	version
)]
struct Cli {
	/// Path to a TOML config file
	#[arg(long, global = true, env = "LOOM_ACS_CONFIG")]
	config: Option<PathBuf>,

	/// Log output format (logs go to stderr)
	#[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
	log_format: LogFormat,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Evaluate an HTTP-style request for a subject
	Check(CheckArgs),

	/// Show the attributes ACS holds for a subject
	Subject {
		/// Subject identifier
		subject: String,
	},

	/// Acquire a UAA token and show its deadlines
	Token,
}

#[derive(Debug, Clone, Args)]
struct CheckArgs {
	/// HTTP method, used as the action
	#[arg(long, short = 'm')]
	method: String,

	/// Request path, used as the resource identifier
	#[arg(long, short = 'p')]
	path: String,

	/// Subject identifier (usually the user name)
	#[arg(long, short = 's')]
	subject: String,

	/// Token scope; repeat for several. Scopes matching the group pattern are
	/// sent as group attributes.
	#[arg(long = "scope")]
	scopes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
	Pretty,
	Compact,
	Json,
}

fn init_logging(format: LogFormat) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr);

	match format {
		LogFormat::Pretty => builder.pretty().init(),
		LogFormat::Compact => builder.compact().init(),
		LogFormat::Json => builder.json().init(),
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.log_format);

	match run(cli).await {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::from(EXIT_ERROR)
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
	let config = config::load_config(cli.config).context("failed to load configuration")?;
	let client = AcsClient::new(config)?;

	match cli.command {
		Command::Check(args) => check(&client, args).await,
		Command::Subject { subject } => {
			let attributes = client.get_subject_attributes(&subject).await?;
			println!("{}", serde_json::to_string_pretty(&attributes)?);
			Ok(ExitCode::SUCCESS)
		}
		Command::Token => {
			client.token_cache().acquire().await?;
			let token = client
				.token_cache()
				.snapshot()
				.context("token cache is empty after acquire")?;
			let output = serde_json::json!({
				"expireAt": format_millis(token.expire_at()),
				"renewAt": format_millis(token.renew_at()),
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
			Ok(ExitCode::SUCCESS)
		}
	}
}

async fn check(client: &AcsClient, args: CheckArgs) -> anyhow::Result<ExitCode> {
	let request = http::Request::builder()
		.method(args.method.as_str())
		.uri(args.path.as_str())
		.body(())
		.with_context(|| format!("invalid request {} {}", args.method, args.path))?;
	let scopes = (!args.scopes.is_empty()).then_some(args.scopes.as_slice());

	debug!(method = %args.method, path = %args.path, "checking access");

	match client
		.authorize_http_request(&request, &args.subject, scopes)
		.await
	{
		Ok(verdict) => {
			println!("{}", serde_json::to_string_pretty(&verdict)?);
			Ok(ExitCode::SUCCESS)
		}
		Err(AcsError::Denied(verdict)) => {
			info!(effect = %verdict.effect, "access denied");
			println!("{}", serde_json::to_string_pretty(&verdict)?);
			Ok(ExitCode::from(EXIT_DENIED))
		}
		Err(e) => Err(e.into()),
	}
}

fn format_millis(ms: u64) -> String {
	i64::try_from(ms)
		.ok()
		.and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
		.map(|t| t.to_rfc3339())
		.unwrap_or_else(|| ms.to_string())
}
