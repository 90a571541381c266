use anyhow::Result;
use checkin_kiosk::{KioskConfig, KioskOrchestrator, RunMode};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "checkin-kiosk")]
#[command(about = "Event check-in kiosk that scans invite QR codes")]
#[command(version)]
#[command(long_about = "An event check-in kiosk: samples frames from a camera, decodes invite \
QR codes and checks them in against the check-in API. Can also serve the check-in endpoint \
itself, with a bearer device token and an in-memory invite store.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "kiosk.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the kiosk")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Only serve the check-in endpoint
    #[arg(long, conflicts_with_all = ["code", "once"], help = "Run only the check-in endpoint, without scanning")]
    server_only: bool,

    /// Submit a code without scanning
    #[arg(long, value_name = "CODE", conflicts_with = "once", help = "Check in CODE without using the camera")]
    code: Option<String>,

    /// Exit after the first check-in attempt
    #[arg(long, help = "Stop after the first scanned code")]
    once: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl Args {
    fn run_mode(&self) -> RunMode {
        if self.server_only {
            RunMode::ServerOnly
        } else if let Some(code) = &self.code {
            RunMode::SubmitCode(code.clone())
        } else {
            RunMode::Kiosk { once: self.once }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting check-in kiosk v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match KioskConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let mut orchestrator = KioskOrchestrator::new(config).await.map_err(|e| {
        error!("Failed to create orchestrator: {}", e);
        e
    })?;

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize kiosk: {}", e);
        e
    })?;

    let exit_code = orchestrator.run(args.run_mode()).await.map_err(|e| {
        error!("Kiosk error during execution: {}", e);
        e
    })?;

    info!("Check-in kiosk exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("checkin_kiosk={}", log_level)));

    let fmt_layer = match args.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Check-in kiosk configuration file");
    println!("# Environment overrides use the KIOSK_ prefix, e.g. KIOSK_SERVER__PORT=9090");
    println!();
    println!("{}", toml::to_string_pretty(&KioskConfig::default())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_argument() {
        let args = Args::try_parse_from(["checkin-kiosk"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Pretty);

        let args = Args::try_parse_from(["checkin-kiosk", "--log-format", "json"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Json);

        assert!(Args::try_parse_from(["checkin-kiosk", "--log-format", "xml"]).is_err());
    }
}
