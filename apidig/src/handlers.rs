use anyhow::{Context, Result, anyhow};
use apidig_core::discover::{DiscoverOptions, DiscoveryReport, execute_discovery};
use apidig_core::report::{ReportFormat, generate_report, save_report};
use clap::ArgMatches;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, debug};
use url::Url;

/// Parse a seed URL, trying to add http:// if needed
pub fn parse_seed_url(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(url.to_string());
    }
    // Some other explicit scheme
    if line.contains("://") {
        return None;
    }

    let with_scheme = format!("http://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => Some(url.to_string()),
        _ => None,
    }
}

/// Expand `~` in an output path
pub fn expand_output_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn log_level(quiet: bool, verbose: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub fn init_tracing(quiet: bool, verbose: bool) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(quiet, verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build discovery options from the `discover` subcommand arguments
pub fn build_discover_options(sub_matches: &ArgMatches, show_progress_bars: bool) -> Result<DiscoverOptions> {
    let raw_url = sub_matches
        .get_one::<String>("url")
        .ok_or_else(|| anyhow!("--url must be provided"))?;
    let url = parse_seed_url(raw_url).ok_or_else(|| anyhow!("Invalid seed URL '{}'", raw_url))?;

    let mut options = DiscoverOptions::new(url);
    if let Some(concurrency) = sub_matches.get_one::<usize>("concurrency") {
        options.concurrency = (*concurrency).max(1);
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        options.timeout_secs = *timeout;
    }
    options.max_depth = sub_matches.get_one::<usize>("max-depth").copied();
    options.max_pages = sub_matches.get_one::<usize>("max-pages").copied();
    options.global_limit = sub_matches.get_one::<usize>("global-limit").copied();
    options.resolve = !sub_matches.get_flag("no-resolve");
    options.show_progress_bars = show_progress_bars;

    Ok(options)
}

pub fn report_format(sub_matches: &ArgMatches) -> ReportFormat {
    sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text)
}

fn print_configuration(options: &DiscoverOptions) {
    let unbounded = || "unbounded".to_string();
    eprintln!("\n{} {}", "Target:".blue(), options.url.bright_white());
    eprintln!("Workers per fan-out: {}", options.concurrency);
    eprintln!("Timeout: {}s", options.timeout_secs);
    eprintln!(
        "Max depth: {}",
        options.max_depth.map(|d| d.to_string()).unwrap_or_else(unbounded)
    );
    eprintln!(
        "Max pages: {}",
        options.max_pages.map(|p| p.to_string()).unwrap_or_else(unbounded)
    );
    eprintln!(
        "Global request limit: {}\n",
        options.global_limit.map(|g| g.to_string()).unwrap_or_else(unbounded)
    );
}

fn print_outcome(report: &DiscoveryReport) {
    if report.is_empty() {
        eprintln!("\n{} {}\n", "✗".red().bold(), "No API endpoints found".red());
    } else {
        eprintln!(
            "\n{} Discovered {} API endpoints\n",
            "✓".green().bold(),
            report.records.len().to_string().yellow()
        );
    }
}

pub async fn handle_discover(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let options = build_discover_options(sub_matches, !quiet)?;
    let format = report_format(sub_matches);
    let output = sub_matches
        .get_one::<String>("output")
        .map(|path| expand_output_path(path));

    debug!(url = %options.url, ?format, "starting discovery");
    if !quiet {
        print_configuration(&options);
    }

    let progress_callback: Option<apidig_core::DiscoverProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            eprintln!("{} {}", "→".blue(), msg);
        }))
    };

    let report = execute_discovery(options, progress_callback)
        .await
        .map_err(|e| anyhow!(e))?;

    if !quiet {
        print_outcome(&report);
    }

    let rendered = generate_report(&report, format).map_err(|e| anyhow!(e))?;

    emit_report(&rendered, output.as_deref(), &mut std::io::stdout().lock(), quiet)
}

/// Writes the rendered report to `output`, or to `stdout` when no path is given.
///
/// Only the report itself goes to `stdout`; status lines go to stderr so the
/// report can be piped.
pub fn emit_report(
    rendered: &str,
    output: Option<&Path>,
    stdout: &mut impl Write,
    quiet: bool,
) -> Result<()> {
    match output {
        Some(path) => {
            save_report(rendered, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => {
            stdout
                .write_all(rendered.as_bytes())
                .context("Failed to write report to stdout")?;
            stdout.flush().context("Failed to write report to stdout")?;
        }
    }

    Ok(())
}
