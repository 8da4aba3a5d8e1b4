use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gtm_core::leads::LeadCapture;
use gtm_core::{CalculatorId, ContactRequest, LeadSubmission, SiteConfig};
use gtm_workbench::app::{self, Workbench};
use gtm_workbench::logging;
use gtm_workbench::output::OutputFormat;
use tracing::{debug, info, warn};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// GTM-360 calculator workbench.
///
/// Runs the site's revenue calculators from the terminal, keeps their inputs
/// in the configured state store, and submits leads to the CRM.
#[derive(Debug, Parser)]
#[command(name = "gtm360", version)]
struct Cli {
    /// Site configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State store backend, overriding `storage.backend`.
    #[arg(long, global = true)]
    store: Option<String>,

    /// Store connection string, overriding `storage.connection_string`.
    /// A directory for `json`, a file path or `:memory:` for `sqlite`.
    #[arg(long, global = true)]
    store_path: Option<String>,

    /// Log filter, e.g. `debug` or `gtm_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Hide log output on the terminal.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show a calculator, optionally editing its inputs first.
    Calc {
        #[arg(value_parser = parse_calculator)]
        calculator: CalculatorId,

        /// Field edit as `key=value`; repeatable, applied in order.
        #[arg(long = "set", value_parser = app::parse_edit)]
        edits: Vec<(String, String)>,

        /// Restore default inputs before applying edits.
        #[arg(long)]
        reset: bool,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Write the report here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Submit a calculator's current result as a lead.
    Submit {
        #[arg(value_parser = parse_calculator)]
        calculator: CalculatorId,

        /// Email address, or the company name for `icp_score`.
        #[arg(long)]
        contact: String,

        /// Log the payload instead of sending it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Send the contact form.
    Contact {
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Evaluate every scenario row of a CSV file.
    Batch {
        #[arg(value_parser = parse_calculator)]
        calculator: CalculatorId,

        file: PathBuf,

        /// Write results here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List a calculator's input fields, or every calculator.
    Fields {
        #[arg(value_parser = parse_calculator)]
        calculator: Option<CalculatorId>,
    },

    /// Print the effective configuration.
    Config,
}

fn parse_calculator(s: &str) -> Result<CalculatorId, String> {
    CalculatorId::parse(s).ok_or_else(|| {
        let known: Vec<_> = CalculatorId::all().iter().map(CalculatorId::as_str).collect();
        format!("unknown calculator '{s}'; expected one of: {}", known.join(", "))
    })
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let mut config = match &cli.config {
        Some(path) => SiteConfig::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => SiteConfig::default(),
    };
    if let Some(backend) = &cli.store {
        config.storage.backend = backend.clone();
    }
    if let Some(path) = &cli.store_path {
        config.storage.connection_string = path.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn emit(
    text: &str,
    output: Option<&PathBuf>,
) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => print!("{text}"),
    }
    Ok(())
}

async fn send_lead(
    config: &SiteConfig,
    lead: LeadSubmission,
    dry_run: bool,
    progress: bool,
) -> Result<()> {
    let submitter = app::build_submitter(&config.leads, dry_run)?;
    let capture = LeadCapture::new(submitter);

    match app::submit_with_progress(&capture, &lead, progress).await {
        Ok(()) => {
            println!("Submitted to form '{}'.", lead.form);
            Ok(())
        }
        Err(error) => {
            if error.is_retryable() {
                warn!(%error, "submission failed, it is safe to retry");
            }
            Err(error).context("lead submission failed")
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref());
    if cli.quiet {
        logging::set_stderr_enabled(false)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let config = load_config(&cli)?;
    for provider in config.analytics.enabled_providers() {
        debug!(provider = provider.name(), "analytics provider enabled");
    }

    match cli.command {
        Command::Calc {
            calculator,
            edits,
            reset,
            format,
            output,
        } => {
            let bench = Workbench::open(config).await?;
            let report = bench.calculate(calculator, &edits, reset).await?;
            emit(&report.render(format)?, output.as_ref())?;
        }
        Command::Submit {
            calculator,
            contact,
            dry_run,
        } => {
            let bench = Workbench::open(config).await?;
            let lead = bench.lead_for(calculator, &contact).await?;
            send_lead(bench.config(), lead, dry_run, !cli.quiet).await?;
        }
        Command::Contact {
            firstname,
            email,
            company,
            message,
            dry_run,
        } => {
            let lead: LeadSubmission = ContactRequest {
                firstname,
                email,
                company,
                message,
            }
            .into();
            send_lead(&config, lead, dry_run, !cli.quiet).await?;
        }
        Command::Batch {
            calculator,
            file,
            output,
        } => {
            let results = app::run_batch(calculator, &file)?;
            emit(&results, output.as_ref())?;
        }
        Command::Fields { calculator } => {
            let ids = match calculator {
                Some(id) => vec![id],
                None => CalculatorId::all().to_vec(),
            };
            for id in ids {
                println!("{id} ({})", id.title());
                for field in app::fields(id) {
                    println!("  {:<18} {}", field.key, field.label);
                }
            }
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            let backends = app::build_registry().available_backends();
            println!("# available storage backends: {}", backends.join(", "));
        }
    }

    Ok(())
}
