//! Brief assembly and engagement-candidate selection.
//!
//! Pure aggregation of already-computed stage outputs into the single
//! artifact handed to the downstream prompt and email collaborators. No
//! network, no persistence — this is the one component whose output is
//! consumed verbatim outside the pipeline, so everything here is covered by
//! deterministic tests.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use trendbrief_core::{
    Brief, DecliningSignal, DeltaRecord, EmergingSignal, EngagementCandidate, NewsItem,
    PostRecord, PostTag, SnapshotSummary, SourceReport, ThemeSelection,
};

use crate::fingerprint::normalize_question;

/// Help-seeking language markers. Multi-word phrases are matched as
/// substrings against the lowercased title + snippet.
const DEFAULT_HELP_MARKERS: &[&str] = &[
    "advice",
    "help",
    "struggling",
    "nothing works",
    "getting worse",
    "desperate",
    "recommend",
    "any tips",
    "what should i do",
    "tried everything",
    "chronic",
    "can't sleep",
    "surgery",
    "scared",
    "frustrated",
];

/// Engagement-candidate selection policy.
#[derive(Debug, Clone)]
pub struct EngagementConfig {
    /// Help-seeking markers; empty means use the built-in defaults.
    pub markers: Vec<String>,
    /// Posts older than this many days (relative to the run date) are out.
    pub recency_days: i64,
    /// A post qualifies when its score or comment count clears the
    /// respective minimum.
    pub min_score: i64,
    pub min_comments: i64,
    /// Keep at most this many candidates.
    pub max_candidates: usize,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            recency_days: 7,
            min_score: 10,
            min_comments: 5,
            max_candidates: 5,
        }
    }
}

impl EngagementConfig {
    fn effective_markers(&self) -> Vec<String> {
        if self.markers.is_empty() {
            DEFAULT_HELP_MARKERS.iter().map(ToString::to_string).collect()
        } else {
            self.markers.clone()
        }
    }
}

/// Everything the assembler merges. All fields are outputs of earlier
/// stages; the assembler adds only the summary counts and the engagement
/// candidate ranking.
#[derive(Debug, Clone)]
pub struct BriefInputs {
    pub run_date: NaiveDate,
    pub brief_number: usize,
    pub baseline: bool,
    pub coverage: Vec<SourceReport>,
    pub deltas: BTreeMap<String, DeltaRecord>,
    pub emerging_signals: Vec<EmergingSignal>,
    pub declining_signals: Vec<DecliningSignal>,
    pub tagged_posts: Vec<PostRecord>,
    pub questions: BTreeSet<String>,
    pub news: Vec<NewsItem>,
    pub theme: ThemeSelection,
}

/// Merge stage outputs into the final [`Brief`].
#[must_use]
pub fn assemble_brief(inputs: BriefInputs, config: &EngagementConfig) -> Brief {
    let summary = SnapshotSummary {
        brief_number: inputs.brief_number,
        baseline: inputs.baseline,
        keywords: inputs.deltas.len(),
        posts: inputs.tagged_posts.len(),
        questions: inputs.questions.len(),
        articles: inputs
            .coverage
            .iter()
            .filter_map(|report| match &report.outcome {
                trendbrief_core::SourceOutcome::Collected { records }
                    if report.source == trendbrief_core::SourceKind::Pageviews =>
                {
                    Some(*records)
                }
                _ => None,
            })
            .sum(),
    };

    let engagement_candidates = select_engagement_candidates(
        inputs.run_date,
        &inputs.tagged_posts,
        &inputs.questions,
        &inputs.emerging_signals,
        config,
    );

    Brief {
        generated_on: inputs.run_date,
        summary,
        coverage: inputs.coverage,
        deltas: inputs.deltas,
        emerging_signals: inputs.emerging_signals,
        declining_signals: inputs.declining_signals,
        tagged_posts: inputs.tagged_posts,
        questions: inputs.questions,
        news: inputs.news,
        theme: inputs.theme,
        engagement_candidates,
    }
}

/// Markers found in `text`, preserving the configured order.
fn find_markers(text: &str, markers: &[String]) -> Vec<String> {
    let lower = text.to_lowercase();
    markers
        .iter()
        .filter(|marker| lower.contains(marker.as_str()))
        .cloned()
        .collect()
}

/// Select the top engagement candidates from tagged posts and questions.
///
/// A post qualifies when it carries a help-seeking marker, was posted inside
/// the recency window, and clears the score-or-comments gate. Questions
/// qualify on markers alone (they carry no score or timestamp) and rank
/// after posts. Ordering: score descending, NEW before RETURNING on ties.
fn select_engagement_candidates(
    run_date: NaiveDate,
    tagged_posts: &[PostRecord],
    questions: &BTreeSet<String>,
    signals: &[EmergingSignal],
    config: &EngagementConfig,
) -> Vec<EngagementCandidate> {
    let markers = config.effective_markers();
    let cutoff = run_date - Duration::days(config.recency_days);

    let mut candidates: Vec<EngagementCandidate> = tagged_posts
        .iter()
        .filter_map(|post| {
            let text = match &post.snippet {
                Some(snippet) => format!("{} {snippet}", post.title),
                None => post.title.clone(),
            };
            let found = find_markers(&text, &markers);
            if found.is_empty()
                || post.created_at.date_naive() < cutoff
                || (post.score < config.min_score && post.comment_count < config.min_comments)
            {
                return None;
            }
            Some(EngagementCandidate {
                title: post.title.clone(),
                url: post.url.clone(),
                source: post.source.clone(),
                score: post.score,
                comment_count: post.comment_count,
                tag: post.tag,
                markers: found,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| tag_rank(a.tag).cmp(&tag_rank(b.tag)))
    });

    // Questions observed this week that carry a marker; NEW iff the
    // new-question detector surfaced them.
    let new_questions: BTreeSet<String> = signals
        .iter()
        .filter_map(|signal| match signal {
            EmergingSignal::NewQuestion { text } => Some(normalize_question(text)),
            _ => None,
        })
        .collect();

    for question in questions {
        let found = find_markers(question, &markers);
        if found.is_empty() {
            continue;
        }
        let tag = if new_questions.contains(&normalize_question(question)) {
            PostTag::New
        } else {
            PostTag::Returning
        };
        candidates.push(EngagementCandidate {
            title: question.clone(),
            url: None,
            source: "questions".to_string(),
            score: 0,
            comment_count: 0,
            tag,
            markers: found,
        });
    }

    candidates.truncate(config.max_candidates);
    candidates
}

/// NEW sorts ahead of RETURNING.
fn tag_rank(tag: PostTag) -> u8 {
    match tag {
        PostTag::New => 0,
        PostTag::Returning => 1,
    }
}
