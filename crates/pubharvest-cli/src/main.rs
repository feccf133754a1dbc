use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pubharvest_core::{AppConfig, ExitCode, export_records};
use pubharvest_science::{
    Doi, HarvestFailure, HarvestObserver, HarvestReport, Harvester, NoopObserver, SourceKind,
    Stage,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "pubharvest",
    about = "Collect an organization's yearly publications from PubMed and CrossRef",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting PUBHARVEST_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Log progress details to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest one publication year and export the records.
    Harvest {
        year: i32,
        /// Output file (defaults to export.output_path from the config).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Suppress progress markers; the summary is still printed.
        #[arg(long)]
        quiet: bool,
        /// Exit non-zero when any lookup failed.
        #[arg(long)]
        strict: bool,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the config file location.
    Path,
}

// ─── Progress ────────────────────────────────────────────────────────────────

/// Console progress: counts per stage, a dot per PubMed DOI recovered and per
/// record resolved.
struct ConsoleProgress<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> ConsoleProgress<W> {
    fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> HarvestObserver for ConsoleProgress<W> {
    fn stage_started(&self, stage: Stage) {
        if stage == Stage::Resolve {
            self.emit("Finding data for each DOI\n");
        }
    }

    fn stage_finished(&self, stage: Stage) {
        // Only these stages leave a line of dots behind.
        if matches!(stage, Stage::Collect(SourceKind::PubMed) | Stage::Resolve) {
            self.emit("\n");
        }
    }

    fn identifiers_found(&self, source: SourceKind, count: usize) {
        match source {
            SourceKind::PubMed => self.emit(&format!("PUBMED IDs: {count}\n")),
            SourceKind::CrossRef => self.emit(&format!("CROSSREF DOIs: {count}\n")),
        }
    }

    fn doi_collected(&self, source: SourceKind, _doi: &Doi) {
        if source == SourceKind::PubMed {
            self.emit(".");
        }
    }

    fn dois_reconciled(&self, count: usize) {
        self.emit(&format!("Total DOIs without duplicates: {count}\n"));
    }

    fn record_resolved(&self, _doi: &Doi) {
        self.emit(".");
    }

    fn lookup_failed(&self, failure: &HarvestFailure) {
        if failure.identifier.is_some() {
            self.emit("x");
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut stdout = std::io::stdout();
    match run(cli, &AppConfig::config_path(), &mut stdout).await {
        Ok(None) => {}
        Ok(Some(code)) => std::process::exit(code as i32),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(ExitCode::GeneralError as i32);
        }
    }
}

/// Execute one command. `Ok(Some(code))` asks for a non-zero exit after the
/// output has been written.
async fn run<W: Write + Send>(
    cli: Cli,
    config_path: &Path,
    out: &mut W,
) -> Result<Option<ExitCode>> {
    let start = Instant::now();
    let json_output = cli.json || std::env::var("PUBHARVEST_JSON").as_deref() == Ok("1");

    match cli.command {
        Commands::Harvest {
            year,
            output,
            quiet,
            strict,
        } => {
            let config = load_config(config_path)?;
            let output = output.unwrap_or_else(|| config.output_path());
            let harvester = Harvester::from_config(&config)?;
            info!(year, output = %output.display(), "harvest requested");

            let report = if quiet || json_output {
                harvester.harvest(year, &NoopObserver).await
            } else {
                let progress = ConsoleProgress::new(&mut *out);
                harvester.harvest(year, &progress).await
            };

            let exported = export_records(&output, &report.records);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(
                    out,
                    &serde_json::json!({
                        "status": if exported { "ok" } else { "error" },
                        "data": {
                            "year": report.year,
                            "output": output,
                            "exported": exported,
                            "records": report.records.len(),
                            "unique_dois": report.unique_dois,
                            "pubmed": report.pubmed_count,
                            "crossref": report.crossref_count,
                            "failures": report.failures,
                        },
                        "meta": { "duration_ms": dur }
                    }),
                )?;
            } else {
                write_summary(out, &report, &output, exported)?;
            }

            if !exported {
                return Ok(Some(ExitCode::FileSystemError));
            }
            if strict && !report.is_complete() {
                return Ok(Some(ExitCode::NetworkError));
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(config_path)?;
                if json_output {
                    print_json(
                        out,
                        &serde_json::json!({
                            "status": "ok",
                            "data": config,
                            "meta": { "duration_ms": start.elapsed().as_millis() }
                        }),
                    )?;
                } else {
                    write!(out, "{}", toml::to_string_pretty(&config)?)?;
                }
            }
            ConfigAction::Path => {
                if json_output {
                    print_json(
                        out,
                        &serde_json::json!({
                            "status": "ok",
                            "data": { "path": config_path },
                            "meta": { "duration_ms": start.elapsed().as_millis() }
                        }),
                    )?;
                } else {
                    writeln!(out, "{}", config_path.display())?;
                }
            }
        },
    }

    Ok(None)
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<AppConfig> {
    debug!(path = %path.display(), "loading config");
    Ok(AppConfig::load_from(path)?)
}

fn print_json<W: Write>(out: &mut W, val: &serde_json::Value) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(val)?)?;
    Ok(())
}

fn write_summary<W: Write>(
    out: &mut W,
    report: &HarvestReport,
    output: &Path,
    exported: bool,
) -> std::io::Result<()> {
    if exported {
        writeln!(out, "Data exported to {}", output.display())?;
    } else {
        writeln!(out, "Failed to export data to {}", output.display())?;
    }

    writeln!(out, "Number of papers in pubmed: {}", report.pubmed_count)?;
    writeln!(out, "Number of papers in crossref: {}", report.crossref_count)?;

    if !report.is_complete() {
        writeln!(out, "{} lookups failed:", report.failures.len())?;
        for failure in &report.failures {
            writeln!(out, "  {failure}")?;
        }
    }
    Ok(())
}
