//! `pygen`: generate a typed Python client from an OpenAPI document.

#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use openapi_pygen::config::CONFIG_FILENAME;
use openapi_pygen::{GenError, GeneratorConfig, check_tree, generate_from_file, write_tree};

#[derive(Parser)]
#[command(
    name = "pygen",
    version,
    about = "Generate a typed Python client from an OpenAPI document"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the client package
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    #[arg(long = "spec", value_name = "FILE", help = "OpenAPI document (JSON)")]
    spec: PathBuf,
    #[arg(long = "out", value_name = "DIR", help = "Directory the package is written into")]
    out: PathBuf,
    #[arg(
        long = "config",
        value_name = "TOML",
        help = "Generator config. Defaults to pygen.toml next to the document"
    )]
    config: Option<PathBuf>,
    #[arg(long = "package", help = "Python package name, overriding the config")]
    package: Option<String>,
    #[arg(long = "seed", help = "Seed for example generation, overriding the config")]
    seed: Option<u64>,
    #[arg(long = "check", help = "Fail if the output on disk is out of date instead of writing")]
    check: bool,
}

fn main() -> ExitCode {
    openapi_pygen::init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(2));
        }
    };

    let code = match cli.command {
        Some(Commands::Generate(args)) => run_generate(args),
        None => {
            let mut cmd = Cli::command();
            let _ = cmd.print_help();
            println!();
            0
        }
    };
    ExitCode::from(code)
}

fn run_generate(args: GenerateArgs) -> u8 {
    match run_generate_inner(&args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Returns false when `--check` found stale files.
fn run_generate_inner(args: &GenerateArgs) -> Result<bool, GenError> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&args.spec));
    debug!(config = %config_path.display(), "Loading generator config.");
    let mut config = GeneratorConfig::load(&config_path)?;
    if let Some(package) = &args.package {
        config.set_package_name(package)?;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let tree = generate_from_file(&args.spec, &config)?;

    if args.check {
        let diffs = check_tree(&tree, &args.out)?;
        for diff in &diffs {
            print!("{}", diff.diff);
        }
        if diffs.is_empty() {
            info!(out = %args.out.display(), "Generated client is up to date.");
            return Ok(true);
        }
        eprintln!(
            "{} generated file(s) out of date under {}",
            diffs.len(),
            args.out.display()
        );
        return Ok(false);
    }

    let written = write_tree(&tree, &args.out)?;
    println!("wrote {written} of {} files to {}", tree.len(), args.out.display());
    Ok(true)
}

fn default_config_path(spec: &Path) -> PathBuf {
    spec.parent()
        .map_or_else(|| PathBuf::from(CONFIG_FILENAME), |dir| dir.join(CONFIG_FILENAME))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "pygen", "generate", "--spec", "api.json", "--out", "out", "--seed", "7", "--check",
        ])
        .unwrap();
        let Some(Commands::Generate(args)) = cli.command else {
            unreachable!("generate subcommand expected");
        };
        assert_eq!(args.spec, PathBuf::from("api.json"));
        assert_eq!(args.seed, Some(7));
        assert!(args.check);
        assert!(args.package.is_none());
    }

    #[test]
    fn test_default_config_sits_next_to_spec() {
        assert_eq!(
            default_config_path(Path::new("specs/api.json")),
            PathBuf::from("specs/pygen.toml")
        );
    }
}
