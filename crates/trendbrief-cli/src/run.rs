//! The weekly pipeline, stage by stage.
//!
//! Ordering is the only concurrency constraint: all current-week collection
//! completes before the differencing stages run, and those complete before
//! persistence. Everything between collection and persistence is pure.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::Args;

use trendbrief_collect::{collect_all, Collectors, SkipFlags};
use trendbrief_core::{AppConfig, Snapshot};
use trendbrief_engine::{
    assemble_brief, compute_deltas, detect_declining_signals, detect_emerging_signals,
    select_theme, tag_posts, topic_fingerprint, BriefInputs, DeclineConfig, DetectorConfig,
    EngagementConfig, ThemeConfig,
};
use trendbrief_render::{build_content_prompt, render_html};
use trendbrief_store::{save_artifact, SnapshotStore};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Run the full pipeline but persist nothing and print the brief HTML
    #[arg(long)]
    pub preview: bool,

    /// Replace an existing snapshot for the same run date
    #[arg(long)]
    pub overwrite: bool,

    /// Degrade the trends source to empty input
    #[arg(long)]
    pub skip_trends: bool,

    /// Degrade the forum source to empty input
    #[arg(long)]
    pub skip_forum: bool,

    /// Degrade the question source to empty input
    #[arg(long)]
    pub skip_questions: bool,

    /// Degrade the pageview source to empty input
    #[arg(long)]
    pub skip_pageviews: bool,

    /// Degrade the news source to empty input
    #[arg(long)]
    pub skip_news: bool,

    /// Override the data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the watchlist file
    #[arg(long)]
    pub watchlist: Option<PathBuf>,

    /// Run date (YYYY-MM-DD); defaults to today. Useful for backfills.
    #[arg(long)]
    pub run_date: Option<NaiveDate>,
}

/// Execute one full pipeline run.
pub async fn run_pipeline(config: AppConfig, args: RunArgs) -> anyhow::Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());
    let watchlist_path = args
        .watchlist
        .clone()
        .unwrap_or_else(|| config.watchlist_path.clone());
    let watchlist = trendbrief_core::load_watchlist(&watchlist_path)?;
    let run_date = args.run_date.unwrap_or_else(|| Utc::now().date_naive());

    tracing::info!(%run_date, data_dir = %data_dir.display(), "starting weekly run");

    // 1. Prior snapshot (or baseline).
    let store = SnapshotStore::open(&data_dir)?;
    let prior = store.load_prior(run_date)?;
    let baseline = prior.is_none();
    let prior_theme = prior.as_ref().and_then(|p| p.selected_theme.clone());
    if baseline {
        tracing::info!("no usable prior snapshot — baseline run, deltas suppressed");
    } else if let Some(theme) = &prior_theme {
        tracing::info!(prior_theme = %theme, "prior snapshot loaded");
    }

    // 2. Collect current-week data from all sources.
    let collectors = Collectors::from_config(&config)?;
    let skip = SkipFlags {
        trends: args.skip_trends,
        forum: args.skip_forum,
        questions: args.skip_questions,
        pageviews: args.skip_pageviews,
        news: args.skip_news,
    };
    let collected = collect_all(&collectors, &watchlist, run_date, skip).await;

    // 3. Tag posts against the prior snapshot.
    let tagged_posts = tag_posts(collected.posts, prior.as_ref());

    // 4. Build the current snapshot (theme filled in below, before save).
    let mut snapshot = Snapshot {
        run_date,
        keyword_series: collected.keyword_series,
        topic_fingerprint: topic_fingerprint(
            tagged_posts.iter().map(|p| p.title.as_str()),
            config.min_term_len,
        ),
        forum_posts: tagged_posts.clone(),
        pageview_series: collected.pageviews,
        questions: collected.questions,
        selected_theme: None,
    };

    // 5. Differencing stages — all pure (current, prior) transforms.
    let detector_config = DetectorConfig {
        min_term_len: config.min_term_len,
        breakout_threshold: config.breakout_threshold,
        pageview_noise_floor: config.pageview_noise_floor,
    };
    let deltas = compute_deltas(run_date, &snapshot.keyword_series, prior.as_ref());
    let emerging = detect_emerging_signals(&snapshot, prior.as_ref(), &detector_config);
    let declining = detect_declining_signals(
        &deltas,
        &snapshot.pageview_series,
        prior.as_ref(),
        &DeclineConfig {
            threshold: config.decline_threshold,
            ..DeclineConfig::default()
        },
    );
    tracing::info!(
        emerging = emerging.len(),
        declining = declining.len(),
        "signal detection complete"
    );

    // 6. Theme selection with source fallback.
    let theme_config = ThemeConfig {
        established_trend_threshold: config.established_trend_threshold,
        min_post_score: config.min_post_score,
        min_post_comments: config.min_post_comments,
        default_theme: watchlist.default_theme.clone(),
        tracked_keywords: watchlist.keywords.clone(),
    };
    let theme = select_theme(
        &deltas,
        &emerging,
        &tagged_posts,
        prior_theme.as_deref(),
        &theme_config,
    );
    tracing::info!(theme = %theme.theme, source = ?theme.source, continuation = theme.is_continuation, "theme selected");
    snapshot.selected_theme = Some(theme.theme.clone());

    // 7. Assemble the brief.
    let engagement_config = EngagementConfig {
        markers: watchlist.help_markers.clone(),
        recency_days: config.engagement_recency_days,
        max_candidates: config.max_engagement_candidates,
        ..EngagementConfig::default()
    };
    let brief = assemble_brief(
        BriefInputs {
            run_date,
            brief_number: store.count()? + 1,
            baseline,
            coverage: collected.coverage,
            deltas,
            emerging_signals: emerging,
            declining_signals: declining,
            tagged_posts,
            questions: snapshot.questions.clone(),
            news: collected.news,
            theme,
        },
        &engagement_config,
    );

    // 8. Render for the downstream collaborators.
    let prompt = build_content_prompt(&brief);
    let html = render_html(&brief);

    if args.preview {
        tracing::info!("preview mode — nothing persisted, nothing sent");
        println!("{html}");
        log_summary(&brief);
        return Ok(());
    }

    // 9. Persist: artifacts first, snapshot last. The snapshot write is the
    // run's commit point — a duplicate date without --overwrite fails here.
    save_artifact(&data_dir, "latest_brief.html", &html)?;
    save_artifact(&data_dir, "latest_prompt.txt", &prompt)?;
    save_artifact(
        &data_dir,
        "latest_brief.json",
        &serde_json::to_string_pretty(&brief)?,
    )?;
    store.save(&snapshot, args.overwrite)?;

    log_summary(&brief);
    Ok(())
}

/// End-of-run summary block.
fn log_summary(brief: &trendbrief_core::Brief) {
    tracing::info!(
        brief_number = brief.summary.brief_number,
        theme = %brief.theme.theme,
        baseline = brief.summary.baseline,
        emerging = brief.emerging_signals.len(),
        declining = brief.declining_signals.len(),
        engagement = brief.engagement_candidates.len(),
        "run complete"
    );
    for report in &brief.coverage {
        if let trendbrief_core::SourceOutcome::Skipped { reason } = &report.outcome {
            tracing::warn!(source = %report.source, reason = %reason, "source had no coverage this week");
        }
    }
}

/// `snapshots` subcommand: list stored run dates, newest first.
pub fn list_snapshots(config: &AppConfig) -> anyhow::Result<()> {
    let store = SnapshotStore::open(&config.data_dir)?;
    let dates = store.list()?;
    if dates.is_empty() {
        println!("no snapshots stored yet");
        return Ok(());
    }
    for date in &dates {
        println!("{date}");
    }
    println!("{} snapshot(s)", dates.len());
    Ok(())
}
