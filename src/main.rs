use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chlg_cli::changelog::{init_changelog, insert_entry, render_entry};
use chlg_cli::config::{EntrySettings, discover_configs, load_settings, merge_configs, user_config_path};

#[derive(Parser)]
#[command(name = "chlg")]
#[command(
	author,
	version,
	about = "CLI tool for inserting entries into changelogs"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Insert an entry under a section of the unreleased version
	Insert {
		/// Changelog filename
		#[arg(short, long, value_name = "FILE")]
		file: Option<PathBuf>,

		/// Print the updated changelog instead of writing it
		#[arg(long)]
		dry_run: bool,

		/// Section heading to insert under, e.g. "Added"
		section: String,

		/// Entry text; multiple words are joined with spaces
		#[arg(required = true, num_args = 1..)]
		message: Vec<String>,
	},
	/// Create a skeleton changelog
	Init {
		/// Changelog filename
		#[arg(short, long, value_name = "FILE")]
		file: Option<PathBuf>,

		/// Overwrite an existing changelog
		#[arg(long)]
		force: bool,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display config files in cascade order and the effective settings
	Show,
	/// Check all config files for errors without changing anything
	Validate,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("chlg: {e:?}");
			ExitCode::FAILURE
		}
	}
}

/// Install a stderr subscriber when `-v` is given or `RUST_LOG` is set.
fn init_tracing(verbose: u8) {
	let filter = match std::env::var("RUST_LOG") {
		Ok(filter) => filter,
		Err(_) => match verbose {
			0 => return,
			1 => "warn,chlg=info,chlg_cli=info".to_string(),
			2 => "warn,chlg=debug,chlg_cli=debug".to_string(),
			_ => "warn,chlg=trace,chlg_cli=trace".to_string(),
		},
	};

	tracing_subscriber::registry()
		.with(EnvFilter::new(filter))
		.with(
			fmt::layer()
				.with_target(verbose >= 2)
				.with_writer(std::io::stderr)
				.compact(),
		)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	match cli.command {
		Commands::Insert {
			file,
			dry_run,
			section,
			message,
		} => handle_insert(file, dry_run, &section, &message.join(" ")),
		Commands::Init { file, force } => handle_init(file, force),
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
	}
}

fn current_settings(file: Option<PathBuf>) -> Result<EntrySettings> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let mut settings = load_settings(&cwd).context("Failed to load configuration")?;

	if let Some(file) = file {
		settings.file = file;
	}

	Ok(settings)
}

fn handle_insert(file: Option<PathBuf>, dry_run: bool, section: &str, message: &str) -> Result<ExitCode> {
	let settings = current_settings(file)?;

	if dry_run {
		let stdout = std::io::stdout();
		let mut out = stdout.lock();
		render_entry(&settings, section, message, &mut out)
			.with_context(|| format!("Failed to render {}", settings.file.display()))?;
		out.flush().context("Failed to write to stdout")?;
		return Ok(ExitCode::SUCCESS);
	}

	insert_entry(&settings, section, message)
		.with_context(|| format!("Failed to insert entry into {}", settings.file.display()))?;

	Ok(ExitCode::SUCCESS)
}

fn handle_init(file: Option<PathBuf>, force: bool) -> Result<ExitCode> {
	let settings = current_settings(file)?;

	init_changelog(&settings.file, force).map_err(|e| match e {
		chlg_cli::ChlgError::AlreadyExists { .. } => {
			anyhow::anyhow!("{e}. Use --force to overwrite.")
		}
		other => anyhow::Error::new(other),
	})?;

	println!("Created {}", settings.file.display());
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (in cascade order):\n");

		for loaded in &configs {
			println!("# Source: {}", loaded.path.display());
			println!("# root: {}", loaded.config.root);
			if let Some(ref file) = loaded.config.file {
				println!("  file: {}", file.display());
			}
			if let Some(ref pattern) = loaded.config.unreleased_pattern {
				println!("  unreleased-pattern: {}", pattern);
			}
			if let Some(ref pattern) = loaded.config.section_pattern {
				println!("  section-pattern: {}", pattern);
			}
			if let Some(ref format) = loaded.config.entry_format {
				println!("  entry-format: {}", format);
			}
			println!();
		}
	}

	let settings = merge_configs(&configs);
	println!("Effective settings:");
	println!("  file: {}", settings.file.display());
	println!("  unreleased-pattern: {}", settings.unreleased_pattern);
	println!("  section-pattern: {}", settings.section_pattern);
	println!("  entry-format: {}", settings.entry_format);

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!();
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	match discover_configs(&cwd) {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!("  {}", loaded.path.display());
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:?}", anyhow::Error::new(e));
			Ok(ExitCode::FAILURE)
		}
	}
}
