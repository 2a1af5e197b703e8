use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{info, LevelFilter};

use certcheck::checker::DEFAULT_WORKERS;
use certcheck::config::{Config, DEFAULT_CONFIG_FILE};
use certcheck::validator::DEFAULT_PORT;
use certcheck::{input, logging, output, Checker, OutputFormat, TrustRoots, Verifier};

mod metrics;

/// Checks the TLS certificates presented by one or more domains.
#[derive(Parser, Debug)]
#[command(name = "certcheck", version, author, about, long_about = None)]
struct Cli {
    /// A single domain or a comma separated list: --domains foo.co.uk,bar.co.uk
    #[arg(short, long)]
    domains: Option<String>,

    /// File with one domain per line
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output format: csv, column, json or table [default: column for a single domain, csv otherwise]
    #[arg(short, long)]
    output: Option<OutputFormat>,

    /// Configuration file [default: ./certcheck.toml when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of domains checked concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Connect, read and write timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// TLS port to connect to
    #[arg(long)]
    port: Option<u16>,

    /// Also check www.<domain> and report it when it is invalid
    #[arg(long)]
    www: bool,

    /// PEM bundle of CA certificates to trust instead of the system store
    #[arg(long)]
    ca_file: Option<PathBuf>,

    /// Exit code to use when any certificate is invalid
    #[arg(long)]
    exit_code: Option<i32>,

    /// Push results to a Prometheus Push Gateway
    #[arg(long)]
    prometheus: bool,

    /// Prometheus Push Gateway address
    #[arg(long)]
    prometheus_address: Option<String>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides it
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

impl Cli {
    /// Only flags that were given end up as `Some`, so they override the
    /// configuration file without clobbering it.
    fn to_config(&self) -> Config {
        Config {
            domains: self.domains.as_deref().map(input::from_list),
            file: self.file.clone(),
            output: self.output,
            workers: self.workers,
            timeout_secs: self.timeout,
            port: self.port,
            check_www: self.www.then_some(true),
            ca_file: self.ca_file.clone(),
            exit_code: self.exit_code,
            prometheus: Some(certcheck::config::PrometheusConfig {
                enabled: self.prometheus.then_some(true),
                address: self.prometheus_address.clone(),
            }),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::example_toml());
        return;
    }

    if let Err(e) = logging::init_logger(cli.log_level) {
        eprintln!("failed to initialize logger: {}", e);
    }

    match run(&cli) {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("certcheck: {:#}", e);
            exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;

    let Some(raw_domains) = read_domains(&config)? else {
        Cli::command().print_help()?;
        return Ok(2);
    };

    let roots = match &config.ca_file {
        Some(path) => TrustRoots::from_pem_file(path)?,
        None => TrustRoots::System,
    };
    let verifier = Verifier::new(&roots)
        .context("failed to set up TLS connector")?
        .with_port(config.port.unwrap_or(DEFAULT_PORT))
        .with_timeout(config.timeout());
    let checker = Checker::new(verifier)
        .with_workers(config.workers.unwrap_or(DEFAULT_WORKERS))
        .with_www_variants(config.check_www.unwrap_or(false));

    let records = checker.run(&raw_domains)?;

    let format = OutputFormat::resolve(config.output, raw_domains.len());
    let report = output::render(&records, format)?;
    print!("{}", report);
    if !report.ends_with('\n') {
        println!();
    }

    if config.prometheus_enabled() {
        if let Some(address) = config.prometheus_address() {
            metrics::prom::prometheus_metrics(&records, address);
        }
    }

    let invalid = records.iter().filter(|r| !r.is_valid()).count();
    info!("{} of {} record(s) invalid", invalid, records.len());
    if invalid > 0 {
        Ok(config.exit_code.unwrap_or(0))
    } else {
        Ok(0)
    }
}

/// The configured domain list, or the contents of the domain file. `None`
/// when neither is set.
fn read_domains(config: &Config) -> Result<Option<Vec<String>>> {
    if let Some(domains) = &config.domains {
        Ok(Some(domains.clone()))
    } else if let Some(file) = &config.file {
        Ok(Some(input::from_file(file)?))
    } else {
        Ok(None)
    }
}

/// Defaults, then the configuration file, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::defaults();

    let path = cli.config.clone().or_else(|| {
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        default.is_file().then_some(default)
    });
    if let Some(path) = path {
        let file_config = Config::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        config = config.merge_with(file_config);
    }

    let config = config.merge_with(cli.to_config());
    config.validate()?;
    Ok(config)
}
