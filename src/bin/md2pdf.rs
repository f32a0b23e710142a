//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate: maps CLI flags to `RenderConfig` /
//! `GenerationConfig`, runs the conversion or aggregation, prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_md2pdf::prompts::DEFAULT_QUERY_HINT;
use edgequake_md2pdf::{
    convert_path, convert_to_file, convert_with, is_error_text, read_events, ElapsedProgress,
    GenerationConfig, MarkdownInput, PageSize, RenderConfig, StreamAggregator, ValidationMode,
    WatchPreview,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// How often the primary thread refreshes the progress display while the
/// aggregation worker runs.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a markdown report
  md2pdf render report.md -o report.pdf

  # Render from stdin, fail on empty input
  cat report.md | md2pdf render - --strict -o report.pdf

  # Fold a recorded event stream into markdown and a PDF
  md2pdf aggregate events.jsonl -o report.md --pdf report.pdf

  # Print the request payload for a research query
  md2pdf request "Evaluate Good Culture, a cottage-cheese company" --model o4-mini-deep-research

EVENT RECORDINGS:
  One JSON event per line, or Server-Sent-Events framing ("data: {...}").
  Text is taken from "response.output[-1].content[0].text",
  "item.content[0].text" or "delta.content[0].text"; everything else is skipped.
  An {"type":"error"} or {"type":"response.failed"} event ends the stream
  with a service error.

ENVIRONMENT VARIABLES:
  MD2PDF_OUTPUT           Default output path
  MD2PDF_PAGE_SIZE        a4 or letter
  MD2PDF_MODEL            Research model for `request`
  MD2PDF_PREVIEW_EVERY    Preview interval in fragments (0 disables)
  RUST_LOG                Override log filter (e.g. edgequake_md2pdf=debug)
"#;

/// Paginate streamed research reports into PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Fold research event streams into Markdown and paginate Markdown into PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2PDF_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a markdown file (or stdin) to PDF.
    Render(RenderArgs),
    /// Fold a recorded event stream into the final report.
    Aggregate(AggregateArgs),
    /// Print the JSON request payload for a research query.
    Request(RequestArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Markdown file, or `-` for stdin.
    input: String,

    /// Output PDF path. Default: input with a `.pdf` extension.
    #[arg(short, long, env = "MD2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Fail on missing or empty input instead of rendering a placeholder.
    #[arg(long, env = "MD2PDF_STRICT")]
    strict: bool,

    /// Document title (PDF metadata).
    #[arg(long)]
    title: Option<String>,

    /// Document author (PDF metadata).
    #[arg(long)]
    author: Option<String>,

    /// Page size.
    #[arg(long, env = "MD2PDF_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Write uncompressed content streams.
    #[arg(long)]
    no_compress: bool,

    /// Print RenderStats as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// Recorded event stream, or `-` for stdin.
    events: String,

    /// Write the report here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also render the report to this PDF.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Preview interval in fragments; 0 disables previews.
    #[arg(long, env = "MD2PDF_PREVIEW_EVERY", default_value_t = 20)]
    preview_every: usize,

    /// Expected wall-clock duration in minutes, for the progress estimate.
    #[arg(long, default_value_t = 30)]
    expected_minutes: u64,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Research query. Default: an example due-diligence request.
    query: Option<String>,

    /// Research model ID.
    #[arg(long, env = "MD2PDF_MODEL")]
    model: Option<String>,

    /// Text file with developer instructions replacing the default prompt.
    #[arg(long)]
    instructions: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Render(ref args) => render(args, cli.quiet),
        Command::Aggregate(ref args) => aggregate(args, cli.quiet, show_progress).await,
        Command::Request(ref args) => request(args).await,
    }
}

// ── render ───────────────────────────────────────────────────────────────

fn render(args: &RenderArgs, quiet: bool) -> Result<()> {
    let mut builder = RenderConfig::builder()
        .page_size(args.page_size.into())
        .compress(!args.no_compress);
    if args.strict {
        builder = builder.mode(ValidationMode::Strict);
    }
    if let Some(ref t) = args.title {
        builder = builder.title(t.clone());
    }
    if let Some(ref a) = args.author {
        builder = builder.author(a.clone());
    }
    let config = builder.build().context("Invalid render options")?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_pdf_path(&args.input));

    let stats = if args.input == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        convert_to_file(MarkdownInput::from(bytes), &output_path, &config)
    } else {
        convert_path(&args.input, &output_path, &config)
    }
    .context("Rendering failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    }
    if !quiet {
        let degraded = stats.skipped_lines + stats.failed_lines > 0 || stats.fallback_used;
        eprintln!(
            "{}  {} page(s)  {}ms  →  {}",
            if degraded { cyan("⚠") } else { green("✔") },
            stats.pages,
            stats.duration_ms,
            bold(&output_path.display().to_string()),
        );
        if stats.dropped_chars > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} character(s) outside Latin-1 were dropped",
                    stats.dropped_chars
                ))
            );
        }
        if stats.skipped_lines + stats.failed_lines > 0 {
            eprintln!(
                "   {}",
                red(&format!(
                    "{} line(s) skipped, run with --verbose for details",
                    stats.skipped_lines + stats.failed_lines
                ))
            );
        }
    }
    Ok(())
}

// ── aggregate ────────────────────────────────────────────────────────────

async fn aggregate(args: &AggregateArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let gen_config = GenerationConfig::builder()
        .preview_every(args.preview_every)
        .expected_duration(Duration::from_secs(args.expected_minutes.max(1) * 60))
        .build()
        .context("Invalid aggregation options")?;

    let reader: Box<dyn BufRead + Send> = if args.events == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(&args.events)
            .with_context(|| format!("Failed to open event stream {:?}", args.events))?;
        Box::new(BufReader::new(file))
    };

    let (preview, rx) = WatchPreview::channel();
    let aggregator = StreamAggregator::new().with_preview(Arc::new(preview), gen_config.preview_every);

    // The fold runs on a blocking worker; this task only polls.
    let mut worker = tokio::task::spawn_blocking(move || aggregator.run(read_events(reader)));

    let bar = if show_progress {
        Some(progress_bar())
    } else {
        None
    };
    let progress = ElapsedProgress::new(gen_config.expected_duration);
    let start = Instant::now();
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    let report = loop {
        tokio::select! {
            joined = &mut worker => break joined.context("Aggregation worker failed")?,
            _ = ticker.tick() => {
                if let Some(ref bar) = bar {
                    let elapsed = start.elapsed();
                    let snap = rx.borrow().clone();
                    bar.set_position(u64::from(progress.percent(elapsed)));
                    bar.set_message(format!(
                        "{}  {}",
                        progress.label(elapsed),
                        dim(&format!("{} fragments, {} chars previewed", snap.fragments, snap.text.len())),
                    ));
                }
            }
        }
    };

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if is_error_text(&report) {
        eprintln!("{} {}", red("✘"), report);
        bail!("Event stream failed");
    }

    match args.output {
        Some(ref path) => std::fs::write(path, &report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(report.as_bytes())
                .context("Failed to write to stdout")?;
            if !report.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    if let Some(ref pdf_path) = args.pdf {
        let output = convert_with(report.as_str(), &RenderConfig::default())
            .context("Rendering failed")?;
        std::fs::write(pdf_path, &output.pdf)
            .with_context(|| format!("Failed to write {}", pdf_path.display()))?;
        if !quiet {
            eprintln!(
                "{}  {} page(s)  →  {}",
                green("✔"),
                output.stats.pages,
                bold(&pdf_path.display().to_string()),
            );
        }
    }

    if !quiet {
        eprintln!(
            "{} {} chars aggregated in {:.1}s",
            cyan("◆"),
            report.len(),
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix("Researching");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

// ── request ──────────────────────────────────────────────────────────────

async fn request(args: &RequestArgs) -> Result<()> {
    let mut builder = GenerationConfig::builder();
    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref path) = args.instructions {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instructions from {:?}", path))?;
        builder = builder.instructions(text);
    }
    let config = builder.build().context("Invalid request options")?;

    let query = args.query.as_deref().unwrap_or(DEFAULT_QUERY_HINT);
    println!(
        "{}",
        serde_json::to_string_pretty(&config.request_body(query))
            .context("Failed to serialise request")?
    );
    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────

fn default_pdf_path(input: &str) -> PathBuf {
    if input == "-" {
        PathBuf::from("report.pdf")
    } else {
        Path::new(input).with_extension("pdf")
    }
}
