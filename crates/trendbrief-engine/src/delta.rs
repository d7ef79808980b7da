//! Per-keyword week-over-week delta computation.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use trendbrief_core::{DeltaRecord, KeywordSeries, Snapshot};

/// A prior run this many days old (or fewer) still counts as "one week ago"
/// for the nominal week-over-week field.
const WOW_MAX_GAP_DAYS: i64 = 7;

/// Percentage change from `prior` to `current`, or `None` when the prior
/// value is zero (an undefined change, not an infinite one).
pub(crate) fn pct_change(prior: f64, current: f64) -> Option<f64> {
    if prior == 0.0 {
        return None;
    }
    Some((current - prior) / prior * 100.0)
}

/// Compute a [`DeltaRecord`] for every keyword in the current series.
///
/// Baseline policy: when `prior` is `None`, or a keyword is absent from the
/// prior snapshot, that keyword's prior/percentage fields are all `None`.
///
/// `vs_last_run_pct_change` always compares against the immediately prior
/// run's recorded value, regardless of how long ago that run was.
/// `wow_pct_change` is the same comparison but only emitted while the run
/// gap is at most seven days — a stale prior is not a week-over-week
/// comparison.
///
/// Pure function of its inputs: deterministic and order-independent across
/// keywords.
#[must_use]
pub fn compute_deltas(
    run_date: NaiveDate,
    current: &KeywordSeries,
    prior: Option<&Snapshot>,
) -> BTreeMap<String, DeltaRecord> {
    current
        .iter()
        .map(|(keyword, metrics)| {
            let record = match prior.and_then(|p| {
                p.keyword_series
                    .get(keyword)
                    .map(|prior_metrics| (p.run_date, prior_metrics))
            }) {
                None => DeltaRecord {
                    current_value: metrics.current,
                    prior_value: None,
                    wow_pct_change: None,
                    vs_last_run_pct_change: None,
                },
                Some((prior_date, prior_metrics)) => {
                    let vs_last_run = pct_change(prior_metrics.current, metrics.current);
                    let gap_days = (run_date - prior_date).num_days();
                    let wow = if (0..=WOW_MAX_GAP_DAYS).contains(&gap_days) {
                        vs_last_run
                    } else {
                        None
                    };
                    DeltaRecord {
                        current_value: metrics.current,
                        prior_value: Some(prior_metrics.current),
                        wow_pct_change: wow,
                        vs_last_run_pct_change: vs_last_run,
                    }
                }
            };
            (keyword.clone(), record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use trendbrief_core::{KeywordMetrics, TrendDirection};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metrics(current: f64) -> KeywordMetrics {
        KeywordMetrics {
            current,
            previous_week: current,
            series_wow_pct: None,
            direction: TrendDirection::Stable,
            four_week_avg: current,
            rising_queries: Vec::new(),
        }
    }

    fn snapshot(run_date: NaiveDate, series: KeywordSeries) -> Snapshot {
        Snapshot {
            run_date,
            keyword_series: series,
            forum_posts: Vec::new(),
            topic_fingerprint: BTreeSet::new(),
            pageview_series: BTreeMap::new(),
            questions: BTreeSet::new(),
            selected_theme: None,
        }
    }

    #[test]
    fn no_prior_snapshot_yields_null_fields() {
        let current = BTreeMap::from([("sciatica".to_string(), metrics(60.0))]);
        let deltas = compute_deltas(date(2026, 8, 3), &current, None);

        let record = &deltas["sciatica"];
        assert!((record.current_value - 60.0).abs() < f64::EPSILON);
        assert!(record.prior_value.is_none());
        assert!(record.wow_pct_change.is_none());
        assert!(record.vs_last_run_pct_change.is_none());
    }

    #[test]
    fn keyword_absent_from_prior_yields_null_fields() {
        let current = BTreeMap::from([("dowager hump".to_string(), metrics(12.0))]);
        let prior = snapshot(
            date(2026, 7, 27),
            BTreeMap::from([("sciatica".to_string(), metrics(55.0))]),
        );

        let deltas = compute_deltas(date(2026, 8, 3), &current, Some(&prior));
        assert!(deltas["dowager hump"].prior_value.is_none());
        assert!(deltas["dowager hump"].wow_pct_change.is_none());
        assert!(deltas["dowager hump"].vs_last_run_pct_change.is_none());
    }

    #[test]
    fn week_over_week_change_is_computed() {
        let current = BTreeMap::from([("sciatica".to_string(), metrics(75.0))]);
        let prior = snapshot(
            date(2026, 7, 27),
            BTreeMap::from([("sciatica".to_string(), metrics(60.0))]),
        );

        let deltas = compute_deltas(date(2026, 8, 3), &current, Some(&prior));
        let record = &deltas["sciatica"];
        assert_eq!(record.prior_value, Some(60.0));
        assert!((record.wow_pct_change.unwrap() - 25.0).abs() < 1e-9);
        assert!((record.vs_last_run_pct_change.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn self_comparison_yields_zero_change() {
        let series = BTreeMap::from([
            ("sciatica".to_string(), metrics(60.0)),
            ("posture".to_string(), metrics(31.0)),
        ]);
        let snap = snapshot(date(2026, 8, 3), series.clone());

        let deltas = compute_deltas(snap.run_date, &series, Some(&snap));
        for record in deltas.values() {
            assert_eq!(record.wow_pct_change, Some(0.0));
            assert_eq!(record.vs_last_run_pct_change, Some(0.0));
        }
    }

    #[test]
    fn zero_prior_value_guards_division() {
        let current = BTreeMap::from([("text neck".to_string(), metrics(40.0))]);
        let prior = snapshot(
            date(2026, 7, 27),
            BTreeMap::from([("text neck".to_string(), metrics(0.0))]),
        );

        let deltas = compute_deltas(date(2026, 8, 3), &current, Some(&prior));
        let record = &deltas["text neck"];
        assert_eq!(record.prior_value, Some(0.0));
        assert!(record.wow_pct_change.is_none());
        assert!(record.vs_last_run_pct_change.is_none());
    }

    #[test]
    fn stale_prior_nulls_wow_but_keeps_vs_last_run() {
        // Two-week gap: the prior run is still "the last run" but its value
        // is not a week-over-week reference.
        let current = BTreeMap::from([("sciatica".to_string(), metrics(90.0))]);
        let prior = snapshot(
            date(2026, 7, 13),
            BTreeMap::from([("sciatica".to_string(), metrics(60.0))]),
        );

        let deltas = compute_deltas(date(2026, 8, 3), &current, Some(&prior));
        let record = &deltas["sciatica"];
        assert!(record.wow_pct_change.is_none());
        assert!((record.vs_last_run_pct_change.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn negative_change_is_signed() {
        let current = BTreeMap::from([("sciatica".to_string(), metrics(30.0))]);
        let prior = snapshot(
            date(2026, 7, 27),
            BTreeMap::from([("sciatica".to_string(), metrics(60.0))]),
        );

        let deltas = compute_deltas(date(2026, 8, 3), &current, Some(&prior));
        assert!((deltas["sciatica"].vs_last_run_pct_change.unwrap() - -50.0).abs() < 1e-9);
    }
}
