//! contractgen CLI - contract checks for every OpenAPI operation without a hand-written test

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use contractgen_core::config::CONFIG_CANDIDATES;
use contractgen_core::{Config, VerdictStatus, to_http_file};
use contractgen_runner::ContractRunner;

#[derive(Parser)]
#[command(name = "contractgen")]
#[command(about = "Generate and run OpenAPI contract checks for uncovered operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose logging (info level; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one contract case per uncovered operation
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Output directory for report.json and reproductions.http
        #[arg(short, long, default_value = ".contractgen")]
        output_dir: PathBuf,
    },

    /// Show the generated cases without sending requests
    List {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Initialize config file
    Init,

    /// Check config and document
    Doctor,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Args)]
struct TargetArgs {
    /// Config file (default: .contractgen.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OpenAPI document (overrides config)
    #[arg(long)]
    spec: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long, env = "API_BASE_URL")]
    base_url: Option<String>,

    /// Only operations whose key contains this text, e.g. "/carts"
    #[arg(short, long)]
    filter: Option<String>,

    /// Worker threads
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl TargetArgs {
    fn load_config(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_default()?,
        };
        if let Some(spec) = &self.spec {
            cfg.spec.clone_from(spec);
        }
        if let Some(base_url) = &self.base_url {
            cfg.base_url.clone_from(base_url);
        }
        if self.jobs.is_some() {
            cfg.jobs = self.jobs;
        }
        Ok(cfg)
    }

    fn runner(&self, cfg: &Config) -> Result<ContractRunner> {
        let runner = ContractRunner::from_config(cfg)
            .with_context(|| format!("cannot prepare contract run for {}", cfg.spec.display()))?;
        Ok(runner.with_filter(self.filter.clone()))
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run { target, output_dir } => {
            let cfg = target.load_config()?;
            let runner = target.runner(&cfg)?;

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  spec:     {}", cfg.spec.display());
                eprintln!("  base_url: {}", cfg.base_url);
                eprintln!("  headers:  {} configured", cfg.headers.len());
                eprintln!("  covered:  {} operations", cfg.covered_operations.len());
                eprintln!();
            }

            let report = runner.run()?;
            let verdict = report.verdict();

            match cli.output {
                OutputFormat::Terminal => println!("{}", report.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            let written = write_artifacts(&output_dir, &report, &cfg.base_url);
            match written {
                Ok(paths) if cli.output == OutputFormat::Terminal => {
                    for path in paths {
                        println!("Wrote {}", path.display());
                    }
                }
                Ok(_) => {}
                Err(e) => eprintln!("Warning: failed to write artifacts: {e:#}"),
            }

            if cli.output == OutputFormat::Terminal && verdict.status == VerdictStatus::Fail {
                println!("  Exit code: {}", verdict.exit_code);
            }
            Ok(verdict.exit_code)
        }

        Commands::List { target } => {
            let cfg = target.load_config()?;
            let plan = ContractRunner::dry_run(&cfg, target.filter.clone())
                .with_context(|| format!("cannot plan contract cases for {}", cfg.spec.display()))?;
            match cli.output {
                OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Silent => {}
            }
            Ok(i32::from(plan.has_errors()))
        }

        Commands::Init => {
            let config_path = CONFIG_CANDIDATES[0];
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - spec: path to your OpenAPI document");
            println!("  - base_url: API under test");
            println!("  - covered_operations: operations with hand-written tests");
            println!("  - headers: auth tokens, API keys");
            Ok(0)
        }

        Commands::Doctor => {
            println!("contractgen doctor");
            println!("==================\n");

            let config_file = CONFIG_CANDIDATES.iter().find(|name| Path::new(name).exists());
            println!(
                "[{}] Config file ({})",
                if config_file.is_some() { "OK" } else { "--" },
                config_file.copied().unwrap_or(CONFIG_CANDIDATES[0])
            );

            let mut healthy = true;
            match Config::load_default() {
                Ok(cfg) => match contractgen_core::OpenApiDocument::load(&cfg.spec) {
                    Ok(doc) => {
                        let total = contractgen_core::all_operations(&doc).len();
                        println!("[OK] Spec file ({}): {total} operations", cfg.spec.display());
                    }
                    Err(e) => {
                        healthy = false;
                        println!("[NG] Spec file: {e}");
                    }
                },
                Err(e) => {
                    healthy = false;
                    println!("[NG] Config: {e}");
                }
            }

            if config_file.is_none() {
                println!("\nCreate config file:");
                println!("  contractgen init");
            }

            Ok(if healthy { 0 } else { 1 })
        }

        Commands::Schema => {
            let schema = contractgen_core::report::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}

/// Write `report.json` and, when anything failed, `reproductions.http`.
fn write_artifacts(
    output_dir: &Path,
    report: &contractgen_core::ContractReport,
    base_url: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let mut written = Vec::new();

    let report_path = output_dir.join("report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(report)?)
        .with_context(|| format!("cannot write {}", report_path.display()))?;
    tracing::debug!(path = %report_path.display(), "report written");
    written.push(report_path);

    if report.failures().next().is_some() {
        let http_path = output_dir.join("reproductions.http");
        std::fs::write(&http_path, to_http_file(&report.cases, base_url, "base_url"))
            .with_context(|| format!("cannot write {}", http_path.display()))?;
        written.push(http_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(args: &[&str]) -> TargetArgs {
        let mut argv = vec!["contractgen", "list"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::List { target } => target,
            _ => unreachable!(),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "base_url = \"http://from-file\"\njobs = 2\n").unwrap();

        let path_arg = path.to_string_lossy().to_string();
        let cfg = target(&[
            "--config",
            &path_arg,
            "--base-url",
            "http://from-flag",
            "--spec",
            "openapi.yaml",
            "--jobs",
            "8",
        ])
        .load_config()
        .unwrap();

        assert_eq!(cfg.base_url, "http://from-flag");
        assert_eq!(cfg.spec, PathBuf::from("openapi.yaml"));
        assert_eq!(cfg.jobs, Some(8));
    }

    #[test]
    fn filter_flag_is_parsed() {
        let t = target(&["--filter", "/carts"]);
        assert_eq!(t.filter.as_deref(), Some("/carts"));
    }
}
