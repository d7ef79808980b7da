//! NEW/RETURNING tagging of forum posts against the prior snapshot.
//!
//! Identity is the platform-native post id and nothing else. Titles are
//! edited and truncated between fetches, so content similarity would produce
//! false negatives; the stable id is authoritative.

use std::collections::HashMap;

use trendbrief_core::{IncomingPost, PostRecord, PostTag, Snapshot};

/// Tag each incoming post as NEW or RETURNING by id-set membership.
///
/// RETURNING posts also carry the prior score and the score movement since
/// the last run. With no prior snapshot every post is NEW.
#[must_use]
pub fn tag_posts(current: Vec<IncomingPost>, prior: Option<&Snapshot>) -> Vec<PostRecord> {
    let prior_by_id: HashMap<&str, &PostRecord> = prior
        .map(|p| {
            p.forum_posts
                .iter()
                .map(|post| (post.id.as_str(), post))
                .collect()
        })
        .unwrap_or_default();

    current
        .into_iter()
        .map(|post| {
            let (tag, prior_score, score_delta) = match prior_by_id.get(post.id.as_str()) {
                Some(seen) => (
                    PostTag::Returning,
                    Some(seen.score),
                    Some(post.score - seen.score),
                ),
                None => (PostTag::New, None, None),
            };
            PostRecord {
                id: post.id,
                title: post.title,
                score: post.score,
                comment_count: post.comment_count,
                source: post.source,
                created_at: post.created_at,
                url: post.url,
                snippet: post.snippet,
                tag,
                prior_score,
                score_delta,
            }
        })
        .collect()
}
