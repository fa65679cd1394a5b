// Report generation for discovery sessions

use crate::discover::{DiscoveryReport, extract_url_path};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Longest payload preview shown per endpoint in text reports.
const PREVIEW_WIDTH: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

pub fn generate_report(data: &DiscoveryReport, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => {
            generate_json_report(data).map_err(|e| format!("Failed to serialize report: {}", e))
        }
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &DiscoveryReport) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                        APIDIG DISCOVERY REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Seed:         {}\n", data.seed));
    report.push_str(&format!("URLs Crawled: {}\n", data.pages_visited));
    report.push_str(&format!("Endpoints:    {}\n", data.records.len()));
    if data.resolved {
        report.push_str(&format!(
            "Resolved:     {}/{}\n",
            data.resolved_count(),
            data.records.len()
        ));
    }
    report.push('\n');

    report.push_str(RULE);
    report.push('\n');

    if data.is_empty() {
        report.push_str("No API endpoints found\n");
        report.push_str(RULE);
        report.push('\n');
        return report;
    }

    report.push_str("DISCOVERED API ENDPOINTS\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    for (host, records) in group_by_host(data) {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} endpoints\n\n", records.len()));

        for (endpoint, payload) in records {
            report.push_str(&format!("  {}\n", extract_url_path(endpoint)));
            if data.resolved {
                report.push_str(&format!("    => {}\n", preview(payload, PREVIEW_WIDTH)));
            }
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report.push('\n');
    report.push_str("                          End of Report\n");
    report.push_str(RULE);
    report.push('\n');

    report
}

pub fn generate_json_report(data: &DiscoveryReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "apidig",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "seed": data.seed,
                "urls_crawled": data.pages_visited,
                "total_endpoints": data.records.len(),
                "resolved": data.resolved,
                "resolved_endpoints": data.resolved_count()
            },
            "endpoints": data.records
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &DiscoveryReport) -> String {
    let mut report = String::new();

    report.push_str("# apidig discovery report\n\n");
    report.push_str(&format!("- **Seed:** {}\n", data.seed));
    report.push_str(&format!("- **URLs crawled:** {}\n", data.pages_visited));
    report.push_str(&format!("- **Endpoints:** {}\n\n", data.records.len()));

    if data.is_empty() {
        report.push_str("_No API endpoints found._\n");
        return report;
    }

    report.push_str("| API Endpoint | Data |\n");
    report.push_str("|---|---|\n");
    for record in &data.records {
        let data_cell = if data.resolved {
            preview(record.data.as_ref(), PREVIEW_WIDTH).replace('|', "\\|")
        } else {
            "-".to_string()
        };
        report.push_str(&format!("| {} | `{}` |\n", record.endpoint, data_cell));
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Compact single-line rendering of a payload; `null` marks a failed resolution.
pub fn preview(payload: Option<&Value>, width: usize) -> String {
    let rendered = match payload {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    };

    if rendered.chars().count() <= width {
        return rendered;
    }

    let truncated: String = rendered.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", truncated)
}

fn group_by_host(data: &DiscoveryReport) -> BTreeMap<String, Vec<(&str, Option<&Value>)>> {
    let mut by_host: BTreeMap<String, Vec<(&str, Option<&Value>)>> = BTreeMap::new();

    for record in &data.records {
        let host = Url::parse(&record.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            }))
            .unwrap_or_else(|| "unknown".to_string());
        by_host
            .entry(host)
            .or_default()
            .push((record.endpoint.as_str(), record.data.as_ref()));
    }

    by_host
}
