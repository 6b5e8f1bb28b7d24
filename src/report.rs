use crate::analyzer::AnalysisResult;
use crate::validation::Issue;
use std::fmt::Write;

/// Issues/warnings shown in full before the report truncates a section.
const REPORT_EXCERPT_LIMIT: usize = 5;

/// Renders a plain-text report of an analysis. Pure projection of the
/// result; nothing is recomputed.
pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "CONTRAÍDOS ANALYSIS");
    let _ = writeln!(out, "{rule}");

    let summary = &result.summary;
    let _ = writeln!(out, "\nSUMMARY");
    let _ = writeln!(out, "  Total operations: {}", summary.total_operations);
    let _ = writeln!(out, "  Arqueo (AINP): {}", summary.arqueo_count);
    let _ = writeln!(out, "  Cargo (M;P): {}", summary.cargo_count);
    let _ = writeln!(out, "    valid (status=4): {}", summary.valid_cargo_count);
    let _ = writeln!(out, "    invalid: {}", summary.invalid_cargo_count);
    let _ = writeln!(out, "  Unique contraídos: {}", summary.unique_contraidos);
    if let (Some(earliest), Some(latest)) =
        (summary.date_range.earliest, summary.date_range.latest)
    {
        let _ = writeln!(out, "  Date range: {earliest} to {latest}");
    }

    let calcs = &result.details.calculations;
    let _ = writeln!(out, "\nTOTALS");
    let _ = writeln!(out, "  Total arqueo: {:.2}", calcs.total_arqueo_positive);
    let _ = writeln!(out, "  Total valid cargo: {:.2}", calcs.total_cargo_negative);
    let _ = writeln!(out, "  Total invalid cargo: {:.2}", calcs.total_cargo_invalid);
    let _ = writeln!(out, "  NET BALANCE: {:.2}", calcs.net_balance);
    let _ = writeln!(out, "  Invalid cargo share: {:.1}%", calcs.percentage_invalid);

    let validation = &result.validation;
    let _ = writeln!(out, "\nVALIDATION");
    let status = if validation.is_valid { "VALID" } else { "ISSUES FOUND" };
    let _ = writeln!(out, "  Status: {status}");
    let _ = writeln!(out, "  Issues: {}", validation.total_issues);
    let _ = writeln!(out, "  Warnings: {}", validation.total_warnings);

    write_excerpt(&mut out, "CRITICAL ISSUES", &validation.issues);
    write_excerpt(&mut out, "WARNINGS", &validation.warnings);

    if !result.chart_data.top_contraidos.data.is_empty() {
        let _ = writeln!(out, "\nTOP CONTRAÍDOS BY BALANCE");
        for point in &result.chart_data.top_contraidos.data {
            let _ = writeln!(out, "  {:<20} {:>14.2}", point.label, point.value);
        }
    }

    let _ = writeln!(out, "\n{rule}");
    out
}

fn write_excerpt(out: &mut String, heading: &str, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }

    let _ = writeln!(out, "\n  {heading}:");
    for issue in issues.iter().take(REPORT_EXCERPT_LIMIT) {
        let _ = writeln!(out, "    - {}", issue.message);
    }
    if issues.len() > REPORT_EXCERPT_LIMIT {
        let _ = writeln!(out, "    ... and {} more", issues.len() - REPORT_EXCERPT_LIMIT);
    }
}
