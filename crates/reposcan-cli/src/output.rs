// SPDX-License-Identifier: Apache-2.0

//! Output rendering for CLI results.
//!
//! Text output is styled for terminals; JSON output is stable,
//! camelCase, and written to stdout only.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Table};
use console::style;

use crate::cli::{OutputContext, OutputFormat};
use crate::commands::scan::ScanReport;
use reposcan_core::facade::RepositoryOverview;
use reposcan_core::findings::RepositoryStatus;

/// Renders the repository listing with scan state columns.
pub fn render_repos(listing: &[RepositoryOverview], ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => print_json(&listing),
        OutputFormat::Text => {
            println!();
            println!("{}", style("Repositories:").bold());
            println!();
            println!("{}", summary_table(listing));
            println!();
            println!("  {} repositories", listing.len());
        }
    }
}

/// Renders a finished scan run.
pub fn render_scan_report(report: &ScanReport, details: bool, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Text => render_scan_report_text(report, details),
    }
}

fn render_scan_report_text(report: &ScanReport, details: bool) {
    println!();
    if report.cancelled {
        println!(
            "{}",
            style("Scan cancelled - partial results below.").yellow().bold()
        );
    } else {
        println!("{}", style("Scan complete.").green().bold());
    }
    println!(
        "  {} of {} repositories scanned, {} secrets, {} dependency risks",
        report.progress.scanned_count,
        report.progress.total_count,
        report.progress.secrets_found,
        report.progress.dependency_risks_found,
    );
    println!();

    println!("{}", summary_table(&report.repositories));
    println!();

    if details {
        render_findings(report);
    }

    let score = report.security_score;
    let styled_score = if score >= 80 {
        style(score.to_string()).green().bold()
    } else if score >= 50 {
        style(score.to_string()).yellow().bold()
    } else {
        style(score.to_string()).red().bold()
    };
    println!("  Security score: {styled_score}/100");
    println!();
}

fn summary_table(repositories: &[RepositoryOverview]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(["Repository", "Status", "Secrets", "Dependency risks", "Last scanned"]);

    for overview in repositories {
        let status = match overview.scan_status {
            RepositoryStatus::Never => "never",
            RepositoryStatus::Scanning => "scanning",
            RepositoryStatus::Clean => "clean",
            RepositoryStatus::Issues => "issues",
        };
        let last_scanned = overview
            .last_scanned
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

        table.add_row([
            Cell::new(&overview.repository.full_name),
            Cell::new(status),
            Cell::new(overview.secrets_count),
            Cell::new(overview.dependency_risks_count),
            Cell::new(last_scanned),
        ]);
    }

    table
}

fn render_findings(report: &ScanReport) {
    for entry in &report.findings {
        println!("{}", style(&entry.repository).cyan().bold());

        for secret in &entry.results.secrets {
            println!(
                "  {} {} ({}) at {}:{}",
                style("secret").red(),
                secret.credential_type,
                secret.provider,
                secret.file,
                secret.line
            );
            println!("    value: {}", style(&secret.redacted_value).dim());
            println!("    {}", secret.remediation);
        }

        for risk in &entry.results.dependencies {
            let reference = risk.cve.as_deref().unwrap_or("compromised release");
            println!(
                "  {} {}@{} - {}",
                style("dependency").red(),
                risk.package,
                risk.version,
                reference
            );
            println!("    upgrade to: {}", risk.recommended_version);
        }

        println!();
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposcan_core::github::RepoMetadata;

    fn overview(status: RepositoryStatus, secrets: usize) -> RepositoryOverview {
        RepositoryOverview {
            repository: RepoMetadata {
                id: "1".to_string(),
                name: "demo".to_string(),
                full_name: "acme/demo".to_string(),
                description: None,
                url: "https://github.com/acme/demo".to_string(),
                is_private: false,
                language: Some("Rust".to_string()),
                updated_at: None,
            },
            scan_status: status,
            secrets_count: secrets,
            dependency_risks_count: 0,
            last_scanned: None,
        }
    }

    #[test]
    fn test_summary_table_shows_status_and_counts() {
        let listing = vec![overview(RepositoryStatus::Issues, 2)];
        let rendered = summary_table(&listing).to_string();

        assert!(rendered.contains("Repository"));
        assert!(rendered.contains("Status"));
        assert!(rendered.contains("Last scanned"));
        assert!(rendered.contains("acme/demo"));
        assert!(rendered.contains("issues"));
        assert!(rendered.contains('2'));
    }

    #[test]
    fn test_summary_table_never_scanned_row() {
        let listing = vec![overview(RepositoryStatus::Never, 0)];
        let rendered = summary_table(&listing).to_string();

        assert!(rendered.contains("never"));
        assert!(rendered.contains('-'), "unscanned rows show a dash timestamp");
    }
}
