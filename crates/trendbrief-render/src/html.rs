//! HTML rendering of the weekly brief.
//!
//! Produces one self-contained document with inline styles only — email
//! clients strip `<style>` blocks, and the same artifact is saved to the
//! data directory for inspection. Delivery belongs to the external email
//! collaborator.

use std::fmt::Write as _;

use trendbrief_core::{Brief, EmergingSignal, PostTag, SourceOutcome};

const SECTION_HEADING: &str =
    "style=\"border-bottom:2px solid #eee;padding-bottom:5px;color:#2c3e50;\"";

/// Render the brief as a standalone HTML document.
#[must_use]
pub fn render_html(brief: &Brief) -> String {
    let mut out = String::new();
    out.push_str("<html><body style=\"font-family:sans-serif;color:#333;\">\n");
    out.push_str("<div style=\"max-width:640px;margin:auto;\">\n");

    let _ = writeln!(
        out,
        "<h1 style=\"color:#2c3e50;\">Trend Brief #{}: {}</h1>",
        brief.summary.brief_number,
        escape(&brief.theme.theme)
    );
    let _ = writeln!(
        out,
        "<p style=\"color:#7f8c8d;\">Week of {} &bull; {} keywords &bull; {} posts &bull; {} questions</p>",
        brief.generated_on, brief.summary.keywords, brief.summary.posts, brief.summary.questions
    );

    if brief.summary.baseline {
        out.push_str(
            "<p style=\"background:#fef9e7;padding:10px;border-left:4px solid #f39c12;\">\
             First run: this brief is a baseline. Week-over-week deltas and emerging \
             signals start next week.</p>\n",
        );
    }

    if brief.theme.is_continuation {
        let _ = writeln!(
            out,
            "<p style=\"background:#f0f9ff;padding:10px;border-left:4px solid #3498db;\">Continuing last week's theme.</p>"
        );
    }

    render_coverage(&mut out, brief);
    render_deltas(&mut out, brief);
    render_signals(&mut out, brief);
    render_engagement(&mut out, brief);
    render_news(&mut out, brief);

    let _ = writeln!(
        out,
        "<p style=\"color:#95a5a6;font-size:0.8em;margin-top:30px;text-align:center;\">Generated by trendbrief &bull; {}</p>",
        brief.generated_on
    );
    out.push_str("</div>\n</body></html>\n");
    out
}

fn render_coverage(out: &mut String, brief: &Brief) {
    let skipped: Vec<String> = brief
        .coverage
        .iter()
        .filter_map(|report| match &report.outcome {
            SourceOutcome::Skipped { reason } => Some(format!(
                "<li><strong>{}</strong>: {}</li>",
                report.source,
                escape(reason)
            )),
            SourceOutcome::Collected { .. } => None,
        })
        .collect();
    if skipped.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "<h2 {SECTION_HEADING}>Partial coverage</h2>\n<ul style=\"padding-left:20px;color:#c0392b;\">{}</ul>",
        skipped.join("")
    );
}

fn render_deltas(out: &mut String, brief: &Brief) {
    let mut movers: Vec<(&str, f64, f64)> = brief
        .deltas
        .iter()
        .filter_map(|(k, d)| {
            d.vs_last_run_pct_change
                .map(|c| (k.as_str(), d.current_value, c))
        })
        .collect();
    if movers.is_empty() {
        return;
    }
    movers.sort_by(|a, b| b.2.total_cmp(&a.2));

    let _ = writeln!(out, "<h2 {SECTION_HEADING}>Keyword movers</h2>");
    out.push_str("<ul style=\"padding-left:20px;\">\n");
    for (keyword, current, change) in movers.iter().take(10) {
        let color = if *change >= 0.0 { "green" } else { "red" };
        let _ = writeln!(
            out,
            "<li><strong>{}</strong> &mdash; interest {:.0} <span style=\"color:{color};\">({:+.1}% vs last week)</span></li>",
            escape(keyword),
            current,
            change
        );
    }
    out.push_str("</ul>\n");
}

fn render_signals(out: &mut String, brief: &Brief) {
    if brief.emerging_signals.is_empty() && brief.declining_signals.is_empty() {
        return;
    }
    let _ = writeln!(out, "<h2 {SECTION_HEADING}>Emerging signals</h2>");
    out.push_str("<ul style=\"padding-left:20px;\">\n");
    for signal in &brief.emerging_signals {
        let line = match signal {
            EmergingSignal::RisingQuery { term } => {
                format!("Rising query: <strong>{}</strong>", escape(term))
            }
            EmergingSignal::NewTopic { terms } => {
                let terms: Vec<String> = terms.iter().map(|t| escape(t)).collect();
                format!("New conversation: <strong>{}</strong>", terms.join(", "))
            }
            EmergingSignal::PageviewBreakout {
                article,
                current_avg,
                prior_avg,
                pct_change,
            } => format!(
                "Pageview breakout: <strong>{}</strong> ({prior_avg:.0} &rarr; {current_avg:.0}/day, {pct_change:+.1}%)",
                escape(article)
            ),
            EmergingSignal::NewQuestion { text } => {
                format!("New question: <em>{}</em>", escape(text))
            }
        };
        let _ = writeln!(out, "<li style=\"margin-bottom:6px;\">{line}</li>");
    }
    out.push_str("</ul>\n");

    if !brief.declining_signals.is_empty() {
        out.push_str("<p style=\"color:#7f8c8d;\">Losing steam: ");
        let names: Vec<String> = brief
            .declining_signals
            .iter()
            .map(|d| format!("{} ({:+.1}%)", escape(&d.keyword), d.pct_change))
            .collect();
        out.push_str(&names.join(", "));
        out.push_str("</p>\n");
    }
}

fn render_engagement(out: &mut String, brief: &Brief) {
    if brief.engagement_candidates.is_empty() {
        return;
    }
    let _ = writeln!(out, "<h2 {SECTION_HEADING}>Worth replying to</h2>");
    out.push_str("<ul style=\"padding-left:20px;\">\n");
    for candidate in &brief.engagement_candidates {
        let badge = match candidate.tag {
            PostTag::New => "<span style=\"color:#16a085;font-size:0.8em;\">NEW</span>",
            PostTag::Returning => {
                "<span style=\"color:#7f8c8d;font-size:0.8em;\">RETURNING</span>"
            }
        };
        let title = match &candidate.url {
            Some(url) => format!(
                "<a href=\"{}\" style=\"color:#2980b9;text-decoration:none;\">{}</a>",
                escape(url),
                escape(&candidate.title)
            ),
            None => escape(&candidate.title),
        };
        let _ = writeln!(
            out,
            "<li style=\"margin-bottom:8px;\">{title} {badge}<br><span style=\"color:#7f8c8d;font-size:0.85em;\">{} &bull; score {} &bull; {} comments</span></li>",
            escape(&candidate.source),
            candidate.score,
            candidate.comment_count
        );
    }
    out.push_str("</ul>\n");
}

fn render_news(out: &mut String, brief: &Brief) {
    if brief.news.is_empty() {
        return;
    }
    let _ = writeln!(out, "<h2 {SECTION_HEADING}>News context</h2>");
    out.push_str("<ul style=\"padding-left:20px;\">\n");
    for item in &brief.news {
        let _ = writeln!(
            out,
            "<li style=\"margin-bottom:6px;\"><a href=\"{}\" style=\"color:#2980b9;text-decoration:none;\">{}</a><br><span style=\"color:#7f8c8d;font-size:0.85em;\">{}</span></li>",
            escape(&item.url),
            escape(&item.title),
            escape(&item.outlet)
        );
    }
    out.push_str("</ul>\n");
}

/// Minimal HTML escaping for text nodes and attribute values.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
