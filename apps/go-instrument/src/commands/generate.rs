//! The `generate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use instrument_config::{InstrumentConfig, load_merged};
use instrument_core::PrefixRuleSet;
use instrument_golang::{GenerateOptions, Reporter, generate, write_outputs};

use crate::logging;

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Package directories to scan (defaults to the current directory)
    pub dirs: Vec<PathBuf>,

    /// Method rule as `pattern:prefix`; repeatable, first match wins.
    /// Replaces the configured rules when given.
    #[arg(long = "metric-prefix", value_name = "PATTERN:PREFIX")]
    pub metric_prefixes: Vec<String>,

    /// Tag inserted into decorator names: Instrumented<PREFIX><Interface>
    #[arg(long)]
    pub prefix: Option<String>,

    /// Only generate decorators for these interfaces
    #[arg(short, long = "interfaces", value_name = "NAME")]
    pub interfaces: Vec<String>,

    /// Skip these interfaces
    #[arg(short, long, value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Output directory, relative to each package directory
    #[arg(short, long)]
    pub dirname: Option<PathBuf>,

    /// Write every decorator of a package into this one file
    #[arg(short = 'o', long)]
    pub filename: Option<String>,

    /// Package name of the generated files
    #[arg(short, long)]
    pub package: Option<String>,

    /// Overwrite existing files
    #[arg(short, long)]
    pub force: bool,

    /// Print generated sources instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Config file to use instead of ./go-instrument.json
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn execute(args: GenerateArgs, verbose: u8) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let loaded = load_merged(&cwd, args.config.as_deref())?;
    logging::init(verbose, &loaded.config.logging);

    let cli_rules = !args.metric_prefixes.is_empty();
    for warning in &loaded.warnings {
        if cli_rules && warning.path == "metric_prefixes" {
            continue;
        }
        tracing::warn!(%warning, "configuration");
    }

    let options = resolve_options(&args, &loaded.config)?;
    if options.rules.is_empty() {
        tracing::warn!("no metric prefix rules; decorators will not instrument any method");
    }

    let dirs = if args.dirs.is_empty() {
        vec![cwd]
    } else {
        args.dirs.clone()
    };
    let outputs = generate(&dirs, &options)?;

    if args.dry_run {
        for output in &outputs {
            println!("// {}", output.path.display());
            print!("{}", output.contents);
        }
        return Ok(());
    }

    let force = args.force || loaded.config.output.force;
    let written = write_outputs(&outputs, force)?;
    if written.is_empty() {
        println!("{} No interfaces to instrument", "WARN".yellow());
    }
    for path in written {
        println!("{} Wrote {}", "OK".green(), path.display().to_string().cyan());
    }
    Ok(())
}

/// Merge command-line flags over the loaded configuration.
fn resolve_options(args: &GenerateArgs, config: &InstrumentConfig) -> Result<GenerateOptions> {
    let raw_rules = if args.metric_prefixes.is_empty() {
        &config.metric_prefixes
    } else {
        &args.metric_prefixes
    };
    let rules = PrefixRuleSet::parse(raw_rules).context("Invalid metric prefix rule")?;

    let pick = |cli: &[String], configured: &[String]| {
        if cli.is_empty() {
            configured.to_vec()
        } else {
            cli.to_vec()
        }
    };

    let reporter = &config.reporter;
    Ok(GenerateOptions {
        rules,
        tag: args.prefix.clone().unwrap_or_else(|| config.prefix.clone()),
        interfaces: pick(&args.interfaces, &config.interfaces),
        exclude: pick(&args.exclude, &config.exclude),
        dirname: args
            .dirname
            .clone()
            .or_else(|| config.output.dirname.as_ref().map(PathBuf::from)),
        filename: args.filename.clone().or_else(|| config.output.filename.clone()),
        package: args.package.clone().or_else(|| config.output.package.clone()),
        reporter: Reporter {
            import_path: reporter.import_path.clone(),
            type_name: reporter.type_name.clone(),
            request_method: reporter.request_method.clone(),
            error_method: reporter.error_method.clone(),
            duration_method: reporter.duration_method.clone(),
        },
        go_env: None,
    })
}
