//! p7x signature validator CLI
//!
//! Validates the signature part of a signed application package and reports
//! its origin.

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use p7x_validator::{
    AnchorClass, ConfigManager, OpenSslTrustEngine, SignatureValidator, ValidationOptions,
    ValidationOutcome, ValidatorConfiguration,
};
use p7x_validator::infra::config::TrustAnchorEntry;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "p7x-validate")]
#[command(about = "Validate p7x package signatures and classify their origin")]
#[command(long_about = "
p7x Validator - checks the PKCS#7 signature part of a signed package

EXAMPLES:
    # Validate against the configured anchors
    p7x-validate validate AppxSignature.p7x

    # Validate with an explicit application root and no system roots
    p7x-validate validate AppxSignature.p7x --application-root store-root.pem --no-system-roots

    # Create a default configuration file
    p7x-validate config init

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a p7x signature file
    Validate {
        /// p7x signature file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Configuration file (defaults to the user config directory)
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Accept signatures whose origin cannot be established
        #[arg(long)]
        allow_unknown_origin: bool,

        /// Skip validation entirely (reports "not validated")
        #[arg(long)]
        skip_signature: bool,

        /// PEM file with curated application roots
        #[arg(long, value_name = "PEM")]
        application_root: Vec<PathBuf>,

        /// PEM file with curated product roots
        #[arg(long, value_name = "PEM")]
        product_root: Vec<PathBuf>,

        /// PEM file with generic code-signing roots
        #[arg(long, value_name = "PEM")]
        code_signing_root: Vec<PathBuf>,

        /// Do not trust the platform's default certificate store
        #[arg(long)]
        no_system_roots: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Create default configuration file
    Init {
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Parameters for the validate command
struct ValidateCommandArgs {
    file: PathBuf,
    config: Option<PathBuf>,
    allow_unknown_origin: bool,
    skip_signature: bool,
    application_root: Vec<PathBuf>,
    product_root: Vec<PathBuf>,
    code_signing_root: Vec<PathBuf>,
    no_system_roots: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            file,
            config,
            allow_unknown_origin,
            skip_signature,
            application_root,
            product_root,
            code_signing_root,
            no_system_roots,
        } => {
            let args = ValidateCommandArgs {
                file,
                config,
                allow_unknown_origin,
                skip_signature,
                application_root,
                product_root,
                code_signing_root,
                no_system_roots,
            };
            handle_validate_command(args)?;
        }

        Commands::Config(config_cmd) => {
            handle_config_command(config_cmd)?;
        }
    }

    Ok(())
}

fn config_manager(path: Option<PathBuf>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new().into_diagnostic(),
    }
}

fn handle_validate_command(args: ValidateCommandArgs) -> Result<()> {
    let mut config = config_manager(args.config)?
        .load_or_default()
        .into_diagnostic()?;

    let extra_anchors = [
        (AnchorClass::ApplicationRoot, args.application_root),
        (AnchorClass::ProductRoot, args.product_root),
        (AnchorClass::CodeSigningRoot, args.code_signing_root),
    ];
    for (class, paths) in extra_anchors {
        config
            .trust_anchors
            .extend(paths.into_iter().map(|path| TrustAnchorEntry { path, class }));
    }
    if args.no_system_roots {
        config.use_system_roots = false;
    }

    let mut options = ValidationOptions::FULL;
    if args.allow_unknown_origin || config.allow_unknown_origin {
        options |= ValidationOptions::ALLOW_UNKNOWN_ORIGIN;
    }
    if args.skip_signature {
        options |= ValidationOptions::SKIP_SIGNATURE;
    }

    let engine = OpenSslTrustEngine::from_config(&config).into_diagnostic()?;
    let validator = SignatureValidator::new(engine);
    log::info!(
        "Validating {} against {} configured anchor(s)",
        args.file.display(),
        validator.engine().anchors().len()
    );

    let file = File::open(&args.file).into_diagnostic()?;
    let outcome = validator
        .evaluate(options, &mut BufReader::new(file))
        .into_diagnostic()?;

    println!("📄 {}", args.file.display());
    match outcome {
        ValidationOutcome::Accepted(origin) => {
            println!("✅ Signature accepted ({origin} origin)");
        }
        ValidationOutcome::NotValidated => {
            println!("⭕ Signature not validated (skipped)");
            std::process::exit(2);
        }
        ValidationOutcome::Rejected => {
            eprintln!("❌ Signature rejected: origin is neither store nor authenticode");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn handle_config_command(config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show { config } => {
            let config_manager = config_manager(config)?;
            match config_manager.load() {
                Ok(config) => print_configuration(&config, &config_manager),
                Err(_) => {
                    println!("📋 No configuration file found. Use 'config init' to create one.");
                }
            }
        }

        ConfigCommands::Init { config } => {
            let config_manager = config_manager(config)?;
            if config_manager.config_path().exists() {
                println!(
                    "📋 Configuration already exists: {}",
                    config_manager.config_path().display()
                );
                return Ok(());
            }
            config_manager
                .save(&ValidatorConfiguration::default())
                .into_diagnostic()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to add trust anchors and certificate properties.");
        }
    }

    Ok(())
}

fn print_configuration(config: &ValidatorConfiguration, manager: &ConfigManager) {
    println!("📋 Current Configuration:");
    println!("  Use system roots: {}", config.use_system_roots);
    println!("  Allow unknown origin: {}", config.allow_unknown_origin);
    println!("  Trust anchors: {}", config.trust_anchors.len());
    for anchor in &config.trust_anchors {
        println!("    {:?}: {}", anchor.class, anchor.path.display());
    }
    println!(
        "  Certificate properties: {}",
        config.certificate_properties.len()
    );
    println!("  Configuration file: {}", manager.config_path().display());
}
