use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::loader::{SnapshotLoader, SnapshotSource};
use crate::output::{self, OutputFormat};
use crate::page::{PageSession, PageState};

#[derive(Clone, Debug, PartialEq, Eq)]
enum SourceSpec {
    Site { base_url: String, resource: Option<String> },
    File(PathBuf),
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: SourceSpec,
    output: Option<String>,
    output_format: OutputFormat,
    query: Option<String>,
    interactive: bool,
    no_color: bool,
    quiet: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let quiet = args.quiet || cfg.quiet.unwrap_or(false);

    // a source given on the command line replaces whatever the config names
    let (base_url, snapshot) = if args.base_url.is_some() || args.snapshot.is_some() {
        (args.base_url, args.snapshot)
    } else {
        (cfg.base_url, cfg.snapshot)
    };
    let source = match (base_url, snapshot) {
        (Some(_), Some(_)) => {
            return Err("config sets both base_url and snapshot, pick one".to_string())
        }
        (Some(base_url), None) => SourceSpec::Site {
            base_url: base_url.trim().to_string(),
            resource: args.resource.or(cfg.resource),
        },
        (None, Some(path)) => SourceSpec::File(config::expand_tilde(path.trim())),
        (None, None) => {
            return Err("no snapshot source, pass --base-url or --snapshot".to_string())
        }
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(p.trim()));

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let query = args.query.or(cfg.query);

    Ok(RunConfig {
        source,
        output,
        output_format,
        query,
        interactive: args.interactive,
        no_color,
        quiet,
    })
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .try_init();
}

fn status_line(tag: &str, ok: bool, message: &str) {
    let tag = if ok {
        tag.bold().green()
    } else {
        tag.bold().red()
    };
    eprintln!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message
    );
}

fn loading_spinner(quiet: bool, what: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("loading {what}"));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn build_source(spec: &SourceSpec) -> Result<SnapshotSource, String> {
    match spec {
        SourceSpec::Site { base_url, resource } => {
            let loader = SnapshotLoader::new(base_url, resource.as_deref())
                .map_err(|e| e.to_string())?;
            Ok(SnapshotSource::Remote(loader))
        }
        SourceSpec::File(path) => Ok(SnapshotSource::File(path.clone())),
    }
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    Ok(())
}

async fn run_interactive<R, W>(
    page: &mut PageSession,
    input: R,
    out: &mut W,
) -> Result<(), String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read stdin: {e}"))?
    {
        let visible = page.input(&line);
        let mut text = format!(":: {visible} row(s) match '{}'\n", line.trim());
        for row in page.visible_rows() {
            text.push_str(&row.cells.join("\t"));
            text.push('\n');
        }
        out.write_all(text.as_bytes())
            .await
            .map_err(|e| format!("failed to write stdout: {e}"))?;
        out.flush()
            .await
            .map_err(|e| format!("failed to write stdout: {e}"))?;
    }
    Ok(())
}

/// One page load driven end to end. `input` feeds `--interactive`, `out`
/// receives everything that would go to stdout.
async fn run_session<R, W>(run: RunConfig, input: R, out: &mut W) -> Result<(), String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let source = build_source(&run.source)?;
    let mut page = PageSession::new();

    let spinner = loading_spinner(run.quiet, &source.describe());
    let state = page.load(&source).await.map_err(|e| e.to_string());
    spinner.finish_and_clear();
    let state = state?;

    if !run.quiet {
        match state {
            PageState::Rendered => status_line("OK", true, page.meta_text()),
            _ => status_line(
                "ERR",
                false,
                page.error_message().unwrap_or(crate::meta::FAILED_LABEL),
            ),
        }
    }

    if let Some(query) = run.query.as_deref() {
        let visible = page.input(query);
        info!(query, visible, "initial search applied");
    }

    if run.interactive && state == PageState::Rendered {
        run_interactive(&mut page, input, out).await?;
    }

    let rendered = output::render(&page, run.output_format);
    match run.output.as_deref() {
        Some(path) => {
            write_output(path, &rendered).await?;
            debug!(path, bytes = rendered.len(), "page written");
            if !run.quiet {
                status_line("OK", true, &format!("wrote {path}"));
            }
        }
        None if !run.interactive => {
            out.write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write stdout: {e}"))?;
            out.flush()
                .await
                .map_err(|e| format!("failed to write stdout: {e}"))?;
        }
        None => {}
    }

    match state {
        PageState::Failed => Err(format!(
            "failed to load snapshot: {}",
            page.error_message().unwrap_or_default()
        )),
        _ => Ok(()),
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let mut stdout = tokio::io::stdout();
    run_session(run, BufReader::new(tokio::io::stdin()), &mut stdout).await
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    if args.init_config {
        let path = match args.config.as_deref() {
            Some(p) => config::expand_tilde(p),
            None => config::default_config_path()
                .ok_or_else(|| "cannot locate home directory for config".to_string())?,
        };
        if config::ensure_default_config_file(&path)? {
            println!(":: wrote {}", path.display());
        } else {
            println!(":: {} already exists", path.display());
        }
        return Ok(());
    }

    let cfg = match args.config.as_deref() {
        Some(p) => config::load_config(&config::expand_tilde(p), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
