use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use securegate::{
    cache::Cache,
    checker::OsvScanner,
    ci::{post_pr_comment, set_outputs, CiEnvironment},
    config::{Config, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH},
    gate::Gate,
    license::{LicenseResolver, PubDevResolver, StaticResolver},
    lockfile::LOCKFILE_NAME,
    output::print_cli_summary,
    policy::exit_codes,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "securegate")]
#[command(
    author,
    version,
    about = "Gate CI on vulnerabilities and banned licenses in Flutter/Dart dependencies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan pubspec.lock and apply the policy
    Scan {
        /// Policy configuration file
        #[arg(short, long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Lockfile to scan
        #[arg(short, long, default_value = LOCKFILE_NAME)]
        lockfile: PathBuf,

        /// Directory to write report files into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// osv-scanner executable
        #[arg(long, default_value = "osv-scanner")]
        osv_scanner: String,

        /// Skip pub.dev license lookups (no license findings)
        #[arg(long)]
        offline: bool,

        /// Do not comment on the pull request
        #[arg(long)]
        no_comment: bool,

        /// Clear the license cache before scanning
        #[arg(long)]
        clear_cache: bool,
    },

    /// Show or create the policy configuration file
    Config {
        /// Policy configuration file
        #[arg(short, long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Write the default configuration
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the license cache
    ClearCache,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::FAILED)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SECUREGATE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("securegate=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            lockfile,
            output_dir,
            osv_scanner,
            offline,
            no_comment,
            clear_cache,
        } => {
            if clear_cache {
                Cache::new().clear()?;
            }

            let options = ScanOptions {
                lockfile,
                output_dir,
                osv_scanner,
                offline,
                comment: !no_comment,
            };
            run_scan(&config, options).await
        }
        Commands::Config { config, init, path } => {
            handle_config(&config, init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            Cache::new().clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

struct ScanOptions {
    lockfile: PathBuf,
    output_dir: PathBuf,
    osv_scanner: String,
    offline: bool,
    comment: bool,
}

async fn run_scan(config_path: &Path, options: ScanOptions) -> Result<u8> {
    info!("Starting SecureGate scan");

    let config = Config::resolve(config_path)?;

    if let Ok(cwd) = std::env::current_dir() {
        info!("Working directory: {}", cwd.display());
    }
    info!("Mode: {}", config.mode);
    info!("Severity threshold: {}", config.severity_threshold);

    let resolver: Box<dyn LicenseResolver> = if options.offline {
        info!("Offline mode: license lookups disabled");
        Box::new(StaticResolver::new())
    } else {
        Box::new(PubDevResolver::new())
    };

    let gate = Gate::new(
        config,
        Box::new(OsvScanner::with_program(options.osv_scanner)),
        resolver,
    )
    .with_lockfile(options.lockfile)
    .with_output_dir(options.output_dir);

    let run = gate.run().await?;

    print_cli_summary(&run.vulnerabilities, &run.license_issues, &run.verdict);

    let env = CiEnvironment::from_env();
    if options.comment {
        post_pr_comment(&env, &run.artifacts.markdown_body).await;
    }
    set_outputs(&env, &run.verdict);

    if run.verdict.passed {
        info!("Security scan PASSED");
    } else {
        error!("Security scan FAILED");
    }

    Ok(run.verdict.exit_code())
}

fn handle_config(config_path: &Path, init: bool, show_path: bool) -> Result<()> {
    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(config_path, Config::generate_default_config())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'securegate config --init' to create one.");
        println!();
        println!("Defaults:");
        println!("{}", Config::generate_default_config());
    }

    Ok(())
}
