//! sshdedit - edit a single OpenSSH server option in place
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Parse arguments ([`Cli`])
//! 2. Load settings: defaults, then the optional YAML settings file, then
//!    `SSHDEDIT_*` environment variables, then command-line flags
//! 3. Initialize logging (stderr, optional daily-rotated file)
//! 4. Resolve, edit and atomically write every affected file
//! 5. Print the edit report to stdout
//!
//! Exit code is 0 on success, changed or not, and 1 on any failure.

use anyhow::{Context, Result};
use clap::Parser;
use sshdedit::cli::{Cli, OutputFormat};
use sshdedit::{APP_NAME, ConfigManager, ScanResolver, SshdConfigEditor, VERSION};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Not routed through tracing: settings and logging may be what failed
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut settings = ConfigManager::new(cli.settings.as_ref()).load()?;
    cli.apply_overrides(&mut settings);

    // Must be held until exit so buffered file logs get flushed
    let _guard = sshdedit::logging::setup_logging(&settings.logging)?;

    tracing::debug!("Starting {} v{}", APP_NAME, VERSION);

    if let Some(path) = &cli.write_settings {
        ConfigManager::save(&settings, path)?;
        if cli.key.is_none() {
            return Ok(());
        }
    }

    let Some(request) = cli.to_request(&settings) else {
        anyhow::bail!("--key is required");
    };

    let editor = SshdConfigEditor::new(ScanResolver::new(settings.scan_files()));
    let outcome = editor.apply(&request)?;

    match cli.format {
        OutputFormat::Text => println!("{}", outcome.summary()),
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&outcome).context("Failed to serialize report")?;
            print!("{}", yaml);
        }
    }

    Ok(())
}
