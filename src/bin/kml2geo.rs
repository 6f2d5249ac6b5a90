//! CLI binary for kml2geo.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use kml2geo::{convert, ConversionConfig, MapSurface};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (stdout)
  kml2geo convert trails.kml

  # Convert to file
  kml2geo convert trails.kml -o trails.json

  # KMZ container, plus a standalone map preview page
  kml2geo convert parks.kmz -o parks.json --preview parks.html

  # Structured stats output
  kml2geo convert trails.kml --json > run.json

  # Browser verification UI (upload, convert, inspect the map)
  kml2geo serve --port 8080

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY        API key for the generation service (required)
  KML2GEO_MODEL         Override the model id
  KML2GEO_MAX_CHARS     Source-character budget per request (default 50000)
  KML2GEO_API_TIMEOUT   Per-request timeout in seconds (default 120)

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Convert:         kml2geo convert trails.kml -o trails.json
"#;

/// Convert KML/KMZ files to GeoJSON using Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "kml2geo",
    version,
    about = "Convert KML/KMZ files to GeoJSON using Gemini",
    long_about = "Convert KML and KMZ geographic annotation files to GeoJSON by delegating the \
structural transformation to Google Gemini, with response validation and an interactive \
map preview for visual verification.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "KML2GEO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "KML2GEO_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one KML or KMZ file to GeoJSON.
    Convert(ConvertArgs),
    /// Start the browser verification UI.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Path to the .kml or .kmz file.
    input: PathBuf,

    /// Write GeoJSON to this file instead of stdout.
    #[arg(short, long, env = "KML2GEO_OUTPUT")]
    output: Option<PathBuf>,

    /// Also write a standalone HTML map preview to this path.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Output the full ConversionOutput as JSON (document + stats).
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "KML2GEO_PORT")]
    port: u16,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Gemini model id.
    #[arg(long, env = "KML2GEO_MODEL")]
    model: Option<String>,

    /// API key (falls back to GEMINI_API_KEY).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "KML2GEO_TEMPERATURE")]
    temperature: Option<f32>,

    /// Source-character budget per request.
    #[arg(long, env = "KML2GEO_MAX_CHARS")]
    max_chars: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "KML2GEO_API_TIMEOUT")]
    api_timeout: Option<u64>,
}

impl ServiceArgs {
    fn into_config(self) -> Result<ConversionConfig> {
        let mut builder = ConversionConfig::builder();
        if let Some(model) = self.model {
            builder = builder.model(model);
        }
        if let Some(key) = self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(n) = self.max_chars {
            builder = builder.max_source_chars(n);
        }
        if let Some(secs) = self.api_timeout {
            builder = builder.api_timeout_secs(secs);
        }
        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides all the feedback a convert run needs, so library
    // INFO logs stay quiet unless --verbose asks for them.
    let show_spinner = matches!(cli.command, Command::Convert(_)) && !cli.quiet && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert(args) => run_convert(args, cli.quiet, show_spinner).await,
        Command::Serve(args) => run_serve(args).await,
    }
}

async fn run_convert(args: ConvertArgs, quiet: bool, show_spinner: bool) -> Result<()> {
    let config = args.service.into_config()?;

    let input_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());
    let is_kmz = input_name.to_lowercase().ends_with(".kmz");

    let spinner = if show_spinner {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(if is_kmz {
            format!("Extracting & converting {input_name}…")
        } else {
            format!("Converting {input_name}…")
        });
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = convert(&args.input, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = result.context("Conversion failed")?;

    // ── Emit the document ────────────────────────────────────────────────
    if let Some(ref output_path) = args.output {
        tokio::fs::write(output_path, &output.geojson)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        if !quiet {
            eprintln!(
                "{}  {} → {}  {}",
                green("✔"),
                output.source_name,
                bold(&output_path.display().to_string()),
                dim(&format!("{}ms", output.stats.total_duration_ms)),
            );
        }
    } else if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.geojson.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.geojson.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if args.output.is_some() && args.json && !quiet {
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?
        );
    }

    // ── Optional map preview ─────────────────────────────────────────────
    if let Some(ref preview_path) = args.preview {
        let mut surface = MapSurface::new();
        surface
            .update(&output.geojson)
            .context("Validated document failed to render")?;
        let page = surface
            .render_page(&output.output_name)
            .expect("surface has a layer after update");
        tokio::fs::write(preview_path, page)
            .await
            .with_context(|| format!("Failed to write {}", preview_path.display()))?;
        if !quiet {
            eprintln!(
                "{}  map preview → {}",
                green("✔"),
                bold(&preview_path.display().to_string())
            );
        }
    }

    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.service.into_config()?;
    eprintln!(
        "{}  verification UI at {}",
        green("●"),
        bold(&format!("http://{}:{}", args.host, args.port))
    );
    kml2geo::server::serve(config, &args.host, args.port)
        .await
        .context("Server failed")?;
    Ok(())
}
