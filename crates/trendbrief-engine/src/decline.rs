//! Declining-signal detection — the inverse of the emerging diff.
//!
//! Surfaces tracked keywords and articles losing interest week over week so
//! the downstream brief can deprioritize them.

use std::collections::BTreeMap;

use trendbrief_core::{DecliningSignal, DeltaRecord, SignalSource, Snapshot};

use crate::delta::pct_change;

/// Tuning for decline detection. The floors keep low-volume items from
/// registering: a keyword at interest 2 dropping to 1 is noise, not a trend.
#[derive(Debug, Clone)]
pub struct DeclineConfig {
    /// Change (percent, negative) below which an item is declining.
    pub threshold: f64,
    /// Minimum current keyword interest for a decline to count.
    pub interest_floor: f64,
    /// Minimum current daily-average pageviews for a decline to count.
    pub pageview_floor: f64,
}

impl Default for DeclineConfig {
    fn default() -> Self {
        Self {
            threshold: -10.0,
            interest_floor: 15.0,
            pageview_floor: 50.0,
        }
    }
}

/// Detect keywords and articles trending downward vs. the prior run.
///
/// Keyword declines read the already-computed delta records; article
/// declines compare pageview averages between the two snapshots. Results are
/// ordered most-negative first, with article entries (underscores replaced
/// by spaces) deduplicated against keyword entries case-insensitively.
/// Baseline weeks produce nothing.
#[must_use]
pub fn detect_declining_signals(
    deltas: &BTreeMap<String, DeltaRecord>,
    current_pageviews: &BTreeMap<String, f64>,
    prior: Option<&Snapshot>,
    config: &DeclineConfig,
) -> Vec<DecliningSignal> {
    let Some(prior) = prior else {
        return Vec::new();
    };

    let mut declining: Vec<DecliningSignal> = deltas
        .iter()
        .filter_map(|(keyword, record)| {
            let change = record.vs_last_run_pct_change?;
            if change < config.threshold && record.current_value >= config.interest_floor {
                Some(DecliningSignal {
                    keyword: keyword.clone(),
                    pct_change: change,
                    source: SignalSource::Trends,
                })
            } else {
                None
            }
        })
        .collect();

    for (article, &current_avg) in current_pageviews {
        let Some(&prior_avg) = prior.pageview_series.get(article) else {
            continue;
        };
        let Some(change) = pct_change(prior_avg, current_avg) else {
            continue;
        };
        if change >= config.threshold || current_avg < config.pageview_floor {
            continue;
        }
        let title = article.replace('_', " ");
        let duplicate = declining
            .iter()
            .any(|d| d.keyword.eq_ignore_ascii_case(&title));
        if !duplicate {
            declining.push(DecliningSignal {
                keyword: title,
                pct_change: change,
                source: SignalSource::Pageviews,
            });
        }
    }

    declining.sort_by(|a, b| a.pct_change.total_cmp(&b.pct_change));
    declining
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use super::*;

    fn delta(current: f64, change: Option<f64>) -> DeltaRecord {
        DeltaRecord {
            current_value: current,
            prior_value: change.map(|_| current),
            wow_pct_change: change,
            vs_last_run_pct_change: change,
        }
    }

    fn prior_with_pageviews(pageviews: &[(&str, f64)]) -> Snapshot {
        Snapshot {
            run_date: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            keyword_series: BTreeMap::new(),
            forum_posts: Vec::new(),
            topic_fingerprint: BTreeSet::new(),
            pageview_series: pageviews
                .iter()
                .map(|(a, v)| ((*a).to_string(), *v))
                .collect(),
            questions: BTreeSet::new(),
            selected_theme: None,
        }
    }

    #[test]
    fn baseline_week_produces_nothing() {
        let deltas = BTreeMap::from([("sciatica".to_string(), delta(60.0, Some(-50.0)))]);
        let signals = detect_declining_signals(
            &deltas,
            &BTreeMap::new(),
            None,
            &DeclineConfig::default(),
        );
        assert!(signals.is_empty());
    }

    #[test]
    fn keyword_decline_needs_threshold_and_floor() {
        let prior = prior_with_pageviews(&[]);
        let deltas = BTreeMap::from([
            // Big drop with volume: flagged.
            ("sciatica".to_string(), delta(40.0, Some(-30.0))),
            // Big drop, no volume: ignored.
            ("text neck".to_string(), delta(4.0, Some(-60.0))),
            // Volume but mild drop: ignored.
            ("posture".to_string(), delta(80.0, Some(-5.0))),
        ]);

        let signals = detect_declining_signals(
            &deltas,
            &BTreeMap::new(),
            Some(&prior),
            &DeclineConfig::default(),
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].keyword, "sciatica");
        assert_eq!(signals[0].source, SignalSource::Trends);
    }

    #[test]
    fn pageview_decline_is_reported_and_deduplicated() {
        let prior = prior_with_pageviews(&[("Sciatica", 1000.0), ("Kyphosis", 900.0)]);
        let deltas = BTreeMap::from([("sciatica".to_string(), delta(40.0, Some(-30.0)))]);
        let current = BTreeMap::from([
            // Duplicates the keyword entry after underscore/case folding.
            ("Sciatica".to_string(), 600.0),
            ("Kyphosis".to_string(), 500.0),
        ]);

        let signals =
            detect_declining_signals(&deltas, &current, Some(&prior), &DeclineConfig::default());
        let names: Vec<&str> = signals.iter().map(|s| s.keyword.as_str()).collect();
        assert_eq!(names, vec!["Kyphosis", "sciatica"]);
    }

    #[test]
    fn most_negative_first() {
        let prior = prior_with_pageviews(&[]);
        let deltas = BTreeMap::from([
            ("neck pain".to_string(), delta(50.0, Some(-20.0))),
            ("sciatica".to_string(), delta(50.0, Some(-45.0))),
        ]);
        let signals = detect_declining_signals(
            &deltas,
            &BTreeMap::new(),
            Some(&prior),
            &DeclineConfig::default(),
        );
        assert_eq!(signals[0].keyword, "sciatica");
        assert_eq!(signals[1].keyword, "neck pain");
    }
}
