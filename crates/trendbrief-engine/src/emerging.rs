//! Emerging-signal detection: four independent set-difference detectors.
//!
//! Each detector compares the current week against the immediately prior
//! snapshot and surfaces only items that did not exist there. With no prior
//! snapshot every detector returns an empty list — the baseline-week law.

use std::collections::{BTreeMap, BTreeSet};

use trendbrief_core::{EmergingSignal, KeywordSeries, PostRecord, Snapshot};

use crate::delta::pct_change;
use crate::fingerprint::{normalize_question, title_terms};

/// Tuning for the detectors. Values are configuration, not law.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum term length for topic fingerprinting.
    pub min_term_len: usize,
    /// Pageview change (percent) above which an article is a breakout.
    pub breakout_threshold: f64,
    /// Minimum current daily-average pageviews for a breakout to count.
    /// Near-zero articles swing by huge percentages that mean nothing.
    pub pageview_noise_floor: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_term_len: 3,
            breakout_threshold: 15.0,
            pageview_noise_floor: 100.0,
        }
    }
}

/// Run all four detectors against the prior snapshot.
///
/// Output order: rising queries, new topics, pageview breakouts, new
/// questions — each internally ordered as its detector documents.
#[must_use]
pub fn detect_emerging_signals(
    current: &Snapshot,
    prior: Option<&Snapshot>,
    config: &DetectorConfig,
) -> Vec<EmergingSignal> {
    let mut signals = detect_rising_queries(&current.keyword_series, prior);
    signals.extend(detect_new_topics(&current.forum_posts, prior, config));
    signals.extend(detect_pageview_breakouts(
        &current.pageview_series,
        prior,
        config,
    ));
    signals.extend(detect_new_questions(&current.questions, prior));
    signals
}

/// Rising queries present this week but absent from the prior week.
///
/// Ordered by the rank the source supplied (a query's best rank across
/// keywords), ties broken by lexical order of the term.
#[must_use]
pub fn detect_rising_queries(
    current: &KeywordSeries,
    prior: Option<&Snapshot>,
) -> Vec<EmergingSignal> {
    let Some(prior) = prior else {
        return Vec::new();
    };

    let prior_queries: BTreeSet<&str> = prior
        .keyword_series
        .values()
        .flat_map(|m| m.rising_queries.iter().map(String::as_str))
        .collect();

    // Best (lowest) source-supplied rank per new query.
    let mut best_rank: BTreeMap<&str, usize> = BTreeMap::new();
    for metrics in current.values() {
        for (rank, query) in metrics.rising_queries.iter().enumerate() {
            if prior_queries.contains(query.as_str()) {
                continue;
            }
            let entry = best_rank.entry(query.as_str()).or_insert(rank);
            if rank < *entry {
                *entry = rank;
            }
        }
    }

    let mut ranked: Vec<(usize, &str)> = best_rank.into_iter().map(|(q, r)| (r, q)).collect();
    ranked.sort_unstable();
    ranked
        .into_iter()
        .map(|(_, term)| EmergingSignal::RisingQuery {
            term: term.to_string(),
        })
        .collect()
}

/// Posts whose titles carry at least one term absent from the prior week's
/// topic fingerprint. One signal per flagged post, carrying only the novel
/// terms; ordered by post score descending.
#[must_use]
pub fn detect_new_topics(
    current_posts: &[PostRecord],
    prior: Option<&Snapshot>,
    config: &DetectorConfig,
) -> Vec<EmergingSignal> {
    let Some(prior) = prior else {
        return Vec::new();
    };

    let mut flagged: Vec<(i64, BTreeSet<String>)> = current_posts
        .iter()
        .filter_map(|post| {
            let terms = title_terms(&post.title, config.min_term_len);
            let novel: BTreeSet<String> = terms
                .into_iter()
                .filter(|term| !prior.topic_fingerprint.contains(term))
                .collect();
            if novel.is_empty() {
                None
            } else {
                Some((post.score, novel))
            }
        })
        .collect();

    flagged.sort_by(|a, b| b.0.cmp(&a.0));
    flagged
        .into_iter()
        .map(|(_, terms)| EmergingSignal::NewTopic { terms })
        .collect()
}

/// Articles present in both snapshots whose daily-average pageviews rose
/// past the breakout threshold while clearing the noise floor. All
/// simultaneous breakouts are reported, descending by `pct_change`.
#[must_use]
pub fn detect_pageview_breakouts(
    current: &BTreeMap<String, f64>,
    prior: Option<&Snapshot>,
    config: &DetectorConfig,
) -> Vec<EmergingSignal> {
    let Some(prior) = prior else {
        return Vec::new();
    };

    let mut breakouts: Vec<(f64, EmergingSignal)> = current
        .iter()
        .filter_map(|(article, &current_avg)| {
            let &prior_avg = prior.pageview_series.get(article)?;
            let change = pct_change(prior_avg, current_avg)?;
            if change > config.breakout_threshold && current_avg > config.pageview_noise_floor {
                Some((
                    change,
                    EmergingSignal::PageviewBreakout {
                        article: article.clone(),
                        current_avg,
                        prior_avg,
                        pct_change: change,
                    },
                ))
            } else {
                None
            }
        })
        .collect();

    // Descending by change; the BTreeMap source already fixes ties lexically.
    breakouts.sort_by(|a, b| b.0.total_cmp(&a.0));
    breakouts.into_iter().map(|(_, signal)| signal).collect()
}

/// Questions whose normalized text was not observed in the prior week.
/// Ordered lexically by normalized form; the surfaced text keeps its
/// original casing.
#[must_use]
pub fn detect_new_questions(
    current: &BTreeSet<String>,
    prior: Option<&Snapshot>,
) -> Vec<EmergingSignal> {
    let Some(prior) = prior else {
        return Vec::new();
    };

    let prior_normalized: BTreeSet<String> =
        prior.questions.iter().map(|q| normalize_question(q)).collect();

    let mut fresh: Vec<(String, &str)> = current
        .iter()
        .filter_map(|question| {
            let normalized = normalize_question(question);
            if prior_normalized.contains(&normalized) {
                None
            } else {
                Some((normalized, question.as_str()))
            }
        })
        .collect();

    fresh.sort_unstable();
    fresh.dedup_by(|a, b| a.0 == b.0);
    fresh
        .into_iter()
        .map(|(_, text)| EmergingSignal::NewQuestion {
            text: text.to_string(),
        })
        .collect()
}
