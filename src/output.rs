use crate::pipeline::SummaryReport;

/// Render a report as plain text: summary first, then one line per highlight
pub fn render_text(report: &SummaryReport) -> String {
    let mut out = String::new();
    out.push_str(&report.summary.text);
    out.push('\n');
    if let Some(notice) = report.summary.notice() {
        out.push_str(&format!("({notice})\n"));
    }

    if !report.highlights.is_empty() {
        out.push_str("\nHighlights:\n");
    }
    for (highlight, action) in report.highlights.iter().zip(&report.navigation) {
        out.push_str(&format!(
            "[{}] {}: {} -> {action}\n",
            action.clock(),
            highlight.label,
            highlight.excerpt
        ));
    }
    out.trim_end().to_string()
}

/// Render a report as pretty-printed JSON
pub fn render_json(report: &SummaryReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
