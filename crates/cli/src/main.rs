//! BlockScope CLI: detect code structure from the terminal.
//!
//! Calls `blockscope-core` directly; every subcommand is a thin wrapper.

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use blockscope_core::batch::{read_lines, scan_paths};
use blockscope_core::catalog::preset_names;
use blockscope_core::display::{files_json, format_elements};
use blockscope_core::{load_blockscope_config, normalize_line, resolve_catalog, ScanError};

/// BlockScope CLI: heuristic, line-based code structure detection.
#[derive(Parser)]
#[command(name = "bscope", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect elements in files or directory trees
    Scan {
        /// Files or directories to scan (default: project root)
        paths: Vec<PathBuf>,

        /// Project root holding `.blockscope.toml` (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Catalog file (TOML); overrides any preset
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Built-in catalog name
        #[arg(long, conflicts_with = "catalog")]
        preset: Option<String>,

        /// Extra substring that disables block matching on a line (repeatable)
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },
    /// Print a line as the scanner sees it
    Normalize {
        /// Raw source line
        line: String,
    },
    /// List built-in catalogs
    Presets,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, ScanError> {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir().map_err(|source| ScanError::Io { path: PathBuf::from("."), source })?,
    };
    root.canonicalize().map_err(|source| ScanError::Io { path: root.clone(), source })
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path)
}

fn fail(err: &ScanError) -> ExitCode {
    eprintln!("Error: {err}");
    err.exit_code()
}

fn run_scan(
    paths: Vec<PathBuf>,
    root: Option<PathBuf>,
    catalog: Option<PathBuf>,
    preset: Option<String>,
    ignore: Vec<String>,
    json: bool,
) -> ExitCode {
    let root = match resolve_root(root) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let mut config = load_blockscope_config(&root);
    if let Some(path) = catalog {
        config.catalog = Some(absolute(path));
    } else if preset.is_some() {
        config.catalog = None;
        config.preset = preset;
    }
    config.ignore.extend(ignore);

    let catalog = match resolve_catalog(&config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let roots: Vec<PathBuf> =
        if paths.is_empty() { vec![root.clone()] } else { paths.into_iter().map(absolute).collect() };
    let outcome = scan_paths(&roots, &config, &catalog);

    if json {
        match serde_json::to_string_pretty(&files_json(&outcome.files)) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    } else {
        for file in &outcome.files {
            println!("{} ({} lines)", file.path, file.line_count);
            let lines = read_lines(&root.join(&file.path)).ok();
            for row in format_elements(&file.elements, lines.as_deref()).lines() {
                println!("  {row}");
            }
        }
        let total: usize = outcome.files.iter().map(|f| f.elements.len()).sum();
        eprintln!("\n{} elements in {} files", total, outcome.files.len());
    }

    match outcome.errors.first() {
        Some((path, e)) => {
            eprintln!("Error: {path}: {e}");
            if outcome.errors.len() > 1 {
                eprintln!("({} more files failed)", outcome.errors.len() - 1);
            }
            e.exit_code()
        }
        None => ExitCode::SUCCESS,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blockscope=warn".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { paths, root, catalog, preset, ignore } => {
            run_scan(paths, root, catalog, preset, ignore, cli.json)
        }
        Commands::Normalize { line } => {
            let text = normalize_line(&line);
            if cli.json {
                println!("{}", serde_json::json!({ "input": line, "normalized": text }));
            } else {
                println!("{text}");
            }
            ExitCode::SUCCESS
        }
        Commands::Presets => {
            let names = preset_names();
            if cli.json {
                println!("{}", serde_json::json!(names));
            } else {
                for name in names {
                    println!("{name}");
                }
            }
            ExitCode::SUCCESS
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "bscope", &mut std::io::stdout());
            ExitCode::SUCCESS
        }
    }
}
