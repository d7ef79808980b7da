//! Content-instruction prompt assembly.
//!
//! Flattens the brief into a plain-text block the external LLM collaborator
//! consumes. The pipeline treats the response as an opaque string, so the
//! only contract here is that every load-bearing datum — theme, continuity,
//! deltas, emerging signals, engagement candidates, coverage gaps — appears
//! in the text.

use std::fmt::Write as _;

use trendbrief_core::{Brief, EmergingSignal, SourceOutcome};

/// Build the instruction prompt for the downstream content-strategy call.
#[must_use]
pub fn build_content_prompt(brief: &Brief) -> String {
    let mut out = String::new();

    out.push_str("You are a content strategist. Using only the data below, produce a one-week content plan: a main piece on the theme, two follow-up angles, and suggested replies for the engagement opportunities.\n\n");

    let _ = writeln!(out, "WEEK OF {} (brief #{})", brief.generated_on, brief.summary.brief_number);

    if brief.summary.baseline {
        out.push_str(
            "NOTE: this is a baseline week — no prior data exists, so week-over-week comparisons and emerging signals are intentionally absent.\n",
        );
    }

    let skipped: Vec<String> = brief
        .coverage
        .iter()
        .filter_map(|report| match &report.outcome {
            SourceOutcome::Skipped { reason } => {
                Some(format!("{} ({reason})", report.source))
            }
            SourceOutcome::Collected { .. } => None,
        })
        .collect();
    if !skipped.is_empty() {
        let _ = writeln!(
            out,
            "COVERAGE GAPS: data from these sources is missing this week: {}.",
            skipped.join("; ")
        );
    }

    out.push('\n');
    let _ = writeln!(out, "THEME: {}", brief.theme.theme);
    match (&brief.theme.prior_theme, brief.theme.is_continuation) {
        (Some(prior), true) => {
            let _ = writeln!(
                out,
                "CONTINUITY: same theme as last week (\"{prior}\") — write as a continuation, reference last week's angle."
            );
        }
        (Some(prior), false) => {
            let _ = writeln!(
                out,
                "CONTINUITY: last week's theme was \"{prior}\" — acknowledge the shift if it helps the narrative."
            );
        }
        (None, _) => {}
    }

    let mut movers: Vec<(&str, f64)> = brief
        .deltas
        .iter()
        .filter_map(|(k, d)| d.vs_last_run_pct_change.map(|c| (k.as_str(), c)))
        .collect();
    movers.sort_by(|a, b| b.1.total_cmp(&a.1));
    if !movers.is_empty() {
        out.push_str("\nKEYWORD MOVERS (% change vs last run):\n");
        for (keyword, change) in movers.iter().take(10) {
            let _ = writeln!(out, "- {keyword}: {change:+.1}%");
        }
    }

    if !brief.emerging_signals.is_empty() {
        out.push_str("\nEMERGING THIS WEEK (absent last week):\n");
        for signal in &brief.emerging_signals {
            match signal {
                EmergingSignal::RisingQuery { term } => {
                    let _ = writeln!(out, "- rising query: {term}");
                }
                EmergingSignal::NewTopic { terms } => {
                    let terms: Vec<&str> = terms.iter().map(String::as_str).collect();
                    let _ = writeln!(out, "- new conversation terms: {}", terms.join(", "));
                }
                EmergingSignal::PageviewBreakout {
                    article, pct_change, ..
                } => {
                    let _ = writeln!(out, "- pageview breakout: {article} ({pct_change:+.1}%)");
                }
                EmergingSignal::NewQuestion { text } => {
                    let _ = writeln!(out, "- new question: {text}");
                }
            }
        }
    }

    if !brief.declining_signals.is_empty() {
        out.push_str("\nLOSING STEAM (deprioritize):\n");
        for signal in &brief.declining_signals {
            let _ = writeln!(out, "- {} ({:+.1}%)", signal.keyword, signal.pct_change);
        }
    }

    if !brief.engagement_candidates.is_empty() {
        out.push_str("\nENGAGEMENT OPPORTUNITIES (draft a short, helpful, no-pitch reply for each):\n");
        for (i, candidate) in brief.engagement_candidates.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. [{}] \"{}\" (score {}, comments {}, markers: {})",
                i + 1,
                candidate.source,
                candidate.title,
                candidate.score,
                candidate.comment_count,
                candidate.markers.join(", ")
            );
        }
    }

    if !brief.news.is_empty() {
        out.push_str("\nNEWS CONTEXT:\n");
        for item in brief.news.iter().take(5) {
            let _ = writeln!(out, "- {} ({})", item.title, item.outlet);
        }
    }

    out
}
