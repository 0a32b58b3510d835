//! Command-line interface for the compiler.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::compile::{compile_file, default_output_path, parse_header, write_compiled};
use crate::error::{CompileError, Result};

/// Orkest - Compile WS-BPEL process definitions.
#[derive(Parser)]
#[command(name = "orkest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a process definition into an envelope.
    Compile {
        /// Process definition file (.bpel)
        file: PathBuf,

        /// Output file (default: input with .cbp extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the envelope as JSON instead of writing it
        #[arg(long)]
        json: bool,

        /// Extra envelope header as KEY=VALUE (repeatable)
        #[arg(long = "header", value_name = "KEY=VALUE")]
        headers: Vec<String>,
    },

    /// Validate process definitions without writing anything.
    Check {
        /// Process definition files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            file,
            output,
            json,
            headers,
        } => compile_command(&file, output.as_deref(), json, &headers),
        Commands::Check { files } => check_command(&files),
    }
}

/// Execute the compile command.
fn compile_command(file: &Path, output: Option<&Path>, json: bool, headers: &[String]) -> Result<()> {
    // Validate headers before touching the input
    let headers = headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>>>()?;

    let envelope = compile_file(file, &headers)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    let output_path = output.map_or_else(|| default_output_path(file), Path::to_path_buf);
    write_compiled(&envelope, &output_path)?;

    println!(
        "{} {}",
        style("Compiled").bold(),
        style(envelope.process.qname()).cyan()
    );
    println!("  GUID: {}", envelope.guid);
    println!("  Activities: {}", envelope.process.activities().count());
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        output_path.display()
    );

    Ok(())
}

/// Execute the check command.
fn check_command(files: &[PathBuf]) -> Result<()> {
    let mut failed = 0usize;

    for file in files {
        match compile_file(file, &[]) {
            Ok(envelope) => println!(
                "{} {} ({})",
                style("ok").green().bold(),
                file.display(),
                envelope.process.qname()
            ),
            Err(e) => {
                failed += 1;
                println!("{} {}: {e}", style("FAIL").red().bold(), file.display());
            }
        }
    }

    if failed > 0 {
        return Err(CompileError::CheckFailed {
            failed,
            total: files.len(),
        });
    }
    Ok(())
}
