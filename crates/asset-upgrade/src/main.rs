//! `asset-upgrade` command line

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use asset_upgrade::{migrate_files, MigrationConfig, MigrationOutcome, UpgradeChainResolver, Version};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("asset-upgrade")
        .version(asset_upgrade::VERSION)
        .about("Upgrade entity hierarchy assets to the current schema version")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("migrate")
                .about("Migrate asset files in place")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Asset files to migrate"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_parser(value_parser!(Version))
                        .help("Version to migrate to (defaults to the latest known)"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Migrate in memory without writing files"),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Fail files that have entries left unmigrated"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the rules that bridge two versions")
                .arg(
                    Arg::new("from")
                        .long("from")
                        .required(true)
                        .value_parser(value_parser!(Version))
                        .help("Recorded version"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(value_parser!(Version))
                        .help("Target version (defaults to the latest known)"),
                ),
        )
        .subcommand(Command::new("rules").about("List registered upgrade rules"))
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: logging not initialised: {e}");
    }
}

fn run_migrate(args: &ArgMatches) -> Result<ExitCode> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => MigrationConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => MigrationConfig::default(),
    };
    if let Some(target) = args.get_one::<Version>("target") {
        config.target_version = Some(*target);
    }
    config.dry_run |= args.get_flag("dry-run");
    config.strict |= args.get_flag("strict");

    init_logging(&config.log_filter);

    let files: Vec<PathBuf> = args
        .get_many::<PathBuf>("files")
        .context("no files given")?
        .cloned()
        .collect();

    let resolver = UpgradeChainResolver::default();
    let mut failed = 0usize;
    for (path, result) in migrate_files(&files, &resolver, &config) {
        match result {
            Ok(report) => match report.outcome {
                MigrationOutcome::UpToDate => println!("{}: up to date ({})", path.display(), report.recorded),
                MigrationOutcome::Upgraded { applied, diagnostics } => {
                    println!(
                        "{}: {} -> {} [{}]{}",
                        path.display(),
                        report.recorded,
                        report.target,
                        applied.join(", "),
                        if diagnostics > 0 {
                            format!(", {diagnostics} entries left unmigrated")
                        } else {
                            String::new()
                        }
                    );
                }
            },
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} of {} files failed", files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_plan(args: &ArgMatches) -> Result<ExitCode> {
    init_logging("warn");

    let resolver = UpgradeChainResolver::default();
    let from = *args.get_one::<Version>("from").context("--from is required")?;
    let to = match args.get_one::<Version>("to") {
        Some(to) => *to,
        None => resolver.catalog().latest_version().context("catalog has no rules")?,
    };

    let plan = resolver
        .resolve(from, to)
        .with_context(|| format!("resolving {from} -> {to}"))?;
    if plan.is_up_to_date() {
        println!("{from} is up to date");
    }
    for rule in plan.steps() {
        println!("{} -> {}  {}", rule.from(), rule.to(), rule.name());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_rules() -> ExitCode {
    let resolver = UpgradeChainResolver::default();
    for rule in resolver.catalog().rules() {
        println!("{} -> {}  {}", rule.from(), rule.to(), rule.name());
        println!("    {}", rule.description());
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("migrate", args)) => run_migrate(args),
        Some(("plan", args)) => run_plan(args),
        Some(("rules", _)) => Ok(run_rules()),
        _ => Ok(ExitCode::FAILURE),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
