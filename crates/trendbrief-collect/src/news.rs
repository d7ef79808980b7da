//! News headline collector (RSS search feed).
//!
//! Fetches a boolean search query from the news RSS endpoint and parses the
//! feed by hand with `quick-xml` — the payload is a flat `<item>` list and a
//! streaming reader keeps the dependency surface small.

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, Url};

use trendbrief_core::NewsItem;

use crate::error::CollectError;
use crate::retry::retry_with_backoff;
use crate::trends::encode_query;

const DEFAULT_BASE_URL: &str = "https://news.google.com/";
const MAX_ITEMS: usize = 7;

/// Client for the news RSS search endpoint.
pub struct NewsClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl NewsClient {
    /// Creates a client pointed at the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CollectError> {
        Self::with_base_url(
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the client cannot be constructed or
    /// [`CollectError::UnexpectedStatus`] if `base_url` does not parse.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, CollectError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|_| CollectError::UnexpectedStatus {
            status: 0,
            url: base_url.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetch recent headlines for the keyword set.
    ///
    /// The query keeps news actionable: any tracked keyword AND an
    /// application word (treatment, study, prevention, ...), restricted to
    /// the last seven days.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] if the request or the feed parse fails.
    pub async fn fetch(&self, keywords: &[String]) -> Result<Vec<NewsItem>, CollectError> {
        let subject = keywords
            .iter()
            .take(6)
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(" OR ");
        let query = format!(
            "({subject}) AND (\"treatment\" OR \"exercise\" OR \"study\" OR \"prevention\") when:7d"
        );
        let url = self
            .base_url
            .join(&format!(
                "rss/search?q={}&hl=en-US&gl=US&ceid=US:en",
                encode_query(&query)
            ))
            .map_err(|_| CollectError::UnexpectedStatus {
                status: 0,
                url: query.clone(),
            })?;

        let xml = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_text(url.clone())
        })
        .await?;

        let items = parse_rss_feed(&xml)?;
        tracing::info!(count = items.len(), "collected news headlines");
        Ok(items)
    }

    async fn request_text(&self, url: Url) -> Result<String, CollectError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(CollectError::RateLimited {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CollectError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Parse an RSS feed body into at most [`MAX_ITEMS`] news items.
///
/// # Errors
///
/// Returns [`CollectError::Xml`] if the XML is malformed.
pub(crate) fn parse_rss_feed(xml: &str) -> Result<Vec<NewsItem>, CollectError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut link = String::new();
    let mut outlet = String::new();
    let mut published = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "item" {
                    in_item = true;
                    title.clear();
                    link.clear();
                    outlet.clear();
                    published.clear();
                } else {
                    current_tag = name;
                }
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    if !title.is_empty() && !link.is_empty() {
                        items.push(NewsItem {
                            title: title.clone(),
                            outlet: if outlet.is_empty() {
                                "news".to_string()
                            } else {
                                outlet.clone()
                            },
                            url: link.clone(),
                            published: if published.is_empty() {
                                None
                            } else {
                                Some(published.clone())
                            },
                        });
                        if items.len() >= MAX_ITEMS {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    assign_field(&current_tag, &text, &mut title, &mut link, &mut outlet, &mut published);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    assign_field(&current_tag, &text, &mut title, &mut link, &mut outlet, &mut published);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CollectError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn assign_field(
    tag: &str,
    text: &str,
    title: &mut String,
    link: &mut String,
    outlet: &mut String,
    published: &mut String,
) {
    match tag {
        "title" => *title = text.to_string(),
        "link" => *link = text.to_string(),
        "source" => *outlet = text.to_string(),
        "pubDate" => *published = text.to_string(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>search results</title>
  <item>
    <title>New sciatica treatment shows promise in trial</title>
    <link>https://example.com/sciatica-trial</link>
    <source url="https://example.com">Example Health</source>
    <pubDate>Mon, 03 Aug 2026 07:00:00 GMT</pubDate>
  </item>
  <item>
    <title><![CDATA[Desk workers & back pain: what a new study says]]></title>
    <link>https://example.com/desk-study</link>
  </item>
</channel></rss>"#;

    #[test]
    fn parses_items_with_source_and_date() {
        let items = parse_rss_feed(FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "New sciatica treatment shows promise in trial");
        assert_eq!(items[0].outlet, "Example Health");
        assert_eq!(
            items[0].published.as_deref(),
            Some("Mon, 03 Aug 2026 07:00:00 GMT")
        );
    }

    #[test]
    fn cdata_title_and_missing_source_get_defaults() {
        let items = parse_rss_feed(FEED).unwrap();
        assert_eq!(
            items[1].title,
            "Desk workers & back pain: what a new study says"
        );
        assert_eq!(items[1].outlet, "news");
        assert!(items[1].published.is_none());
    }

    #[test]
    fn item_without_link_is_dropped() {
        let xml = r#"<rss><channel><item><title>orphan</title></item></channel></rss>"#;
        assert!(parse_rss_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn item_cap_is_enforced() {
        let mut xml = String::from("<rss><channel>");
        for i in 0..12 {
            xml.push_str(&format!(
                "<item><title>headline {i}</title><link>https://example.com/{i}</link></item>"
            ));
        }
        xml.push_str("</channel></rss>");
        assert_eq!(parse_rss_feed(&xml).unwrap().len(), MAX_ITEMS);
    }
}
