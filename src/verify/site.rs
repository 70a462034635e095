use crate::config::VerifyConfig;
use crate::error::{JanitorError, Result};
use crate::verify::PageFetcher;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Found { chunk: String, url: String, target: String },
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub page_url: String,
    pub chunks: Vec<String>,
    pub fetched: Vec<String>,
    pub targets: Vec<String>,
    pub outcome: VerificationOutcome,
}

impl VerificationReport {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, VerificationOutcome::Found { .. })
    }
}

/// Checks that a deployed page ships script bundles containing one of a set
/// of target snippets.
pub struct SiteVerifier<F: PageFetcher> {
    fetcher: F,
    base_url: Url,
    chunk_pattern: Regex,
    targets: Vec<String>,
}

impl<F: PageFetcher> SiteVerifier<F> {
    pub fn new(
        fetcher: F,
        base_url: &str,
        chunk_pattern: &str,
        targets: Vec<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|_| JanitorError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        let chunk_pattern = Regex::new(chunk_pattern).map_err(|e| JanitorError::Config {
            message: format!("Invalid chunk pattern: {}", e),
        })?;
        let targets = targets.into_iter().filter(|t| !t.is_empty()).collect();

        Ok(Self {
            fetcher,
            base_url,
            chunk_pattern,
            targets,
        })
    }

    pub fn from_config(config: &VerifyConfig, fetcher: F) -> Result<Self> {
        Self::new(
            fetcher,
            &config.base_url,
            &config.chunk_pattern,
            config.targets.clone(),
        )
    }

    /// Script paths referenced by the page, in document order.
    pub fn extract_chunk_paths(&self, html: &str) -> Vec<String> {
        self.chunk_pattern
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    fn chunk_url(&self, chunk: &str) -> Result<Url> {
        self.base_url.join(chunk).map_err(|_| JanitorError::InvalidUrl {
            url: format!("{}{}", self.base_url, chunk),
        })
    }

    fn matching_target(&self, body: &str) -> Option<&str> {
        self.targets
            .iter()
            .find(|t| body.contains(t.as_str()))
            .map(|t| t.as_str())
    }

    /// Fetch the page, then each chunk in order until one contains a target.
    /// `on_fetch` is called with every chunk path before it is requested; an
    /// error from it stops the run before that fetch.
    pub async fn verify<C>(&self, mut on_fetch: C) -> Result<VerificationReport>
    where
        C: FnMut(&str) -> Result<()> + Send,
    {
        let html = self.fetcher.fetch_text(&self.base_url).await?;
        let chunks = self.extract_chunk_paths(&html);
        info!(page = %self.base_url, chunks = chunks.len(), "extracted script chunks");

        let mut fetched = Vec::new();
        let mut outcome = VerificationOutcome::NotFound;

        for chunk in &chunks {
            on_fetch(chunk)?;
            let url = self.chunk_url(chunk)?;
            let body = self.fetcher.fetch_text(&url).await?;
            fetched.push(chunk.clone());

            if let Some(target) = self.matching_target(&body) {
                debug!(chunk = %chunk, matched = target, "target found");
                outcome = VerificationOutcome::Found {
                    chunk: chunk.clone(),
                    url: url.to_string(),
                    target: target.to_string(),
                };
                break;
            }
        }

        Ok(VerificationReport {
            page_url: self.base_url.to_string(),
            chunks,
            fetched,
            targets: self.targets.clone(),
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const PAGE: &str = r#"<!DOCTYPE html><html><head>
        <script src="/_next/static/chunks/webpack-8f1e.js" async=""></script>
        <link rel="preload" href="/_next/static/css/app.css" as="style"/>
        </head><body>
        <script src="/_next/static/chunks/app/layout-3c2a.js" async=""></script>
        </body></html>"#;

    struct FixtureFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FixtureFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FixtureFetcher {
        async fn fetch_text(&self, url: &Url) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| JanitorError::Network {
                    url: url.to_string(),
                    message: "404 Not Found".to_string(),
                })
        }
    }

    fn verifier(fetcher: FixtureFetcher) -> SiteVerifier<FixtureFetcher> {
        SiteVerifier::from_config(
            &VerifyConfig {
                base_url: "https://shop.example".to_string(),
                ..VerifyConfig::default()
            },
            fetcher,
        )
        .unwrap()
    }

    #[test]
    fn test_extract_chunk_paths() {
        let v = verifier(FixtureFetcher::new(&[]));
        assert_eq!(
            v.extract_chunk_paths(PAGE),
            vec![
                "/_next/static/chunks/webpack-8f1e.js",
                "/_next/static/chunks/app/layout-3c2a.js"
            ]
        );
        assert!(v.extract_chunk_paths("<html></html>").is_empty());
    }

    #[tokio::test]
    async fn test_match_in_second_chunk() {
        let fetcher = FixtureFetcher::new(&[
            ("https://shop.example/", PAGE),
            ("https://shop.example/_next/static/chunks/webpack-8f1e.js", "(()=>{})()"),
            (
                "https://shop.example/_next/static/chunks/app/layout-3c2a.js",
                r#"children:"고객센터 1588-0000""#,
            ),
        ]);
        let v = verifier(fetcher);

        let mut announced = Vec::new();
        let report = v
            .verify(|c| {
                announced.push(c.to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert!(report.is_found());
        assert_eq!(
            report.outcome,
            VerificationOutcome::Found {
                chunk: "/_next/static/chunks/app/layout-3c2a.js".to_string(),
                url: "https://shop.example/_next/static/chunks/app/layout-3c2a.js".to_string(),
                target: "고객센터".to_string(),
            }
        );
        assert_eq!(report.fetched.len(), 2);
        assert_eq!(announced.len(), 2);
    }

    #[tokio::test]
    async fn test_stops_at_first_match() {
        let page = format!(
            "{}<script src=\"/_next/static/chunks/never-fetched.js\"></script>",
            PAGE
        );
        let fetcher = FixtureFetcher::new(&[
            ("https://shop.example/", page.as_str()),
            ("https://shop.example/_next/static/chunks/webpack-8f1e.js", "noop"),
            (
                "https://shop.example/_next/static/chunks/app/layout-3c2a.js",
                "Customer Support",
            ),
        ]);
        let v = verifier(fetcher);

        let report = v.verify(|_| Ok(())).await.unwrap();
        assert!(report.is_found());
        assert_eq!(report.chunks.len(), 3);

        let requested = v.fetcher.requested.lock().unwrap();
        assert_eq!(requested.len(), 3);
        assert!(!requested.iter().any(|u| u.contains("never-fetched")));
    }

    #[tokio::test]
    async fn test_not_found_is_a_result() {
        let fetcher = FixtureFetcher::new(&[
            ("https://shop.example/", PAGE),
            ("https://shop.example/_next/static/chunks/webpack-8f1e.js", "a"),
            ("https://shop.example/_next/static/chunks/app/layout-3c2a.js", "b"),
        ]);
        let report = verifier(fetcher).verify(|_| Ok(())).await.unwrap();

        assert_eq!(report.outcome, VerificationOutcome::NotFound);
        assert_eq!(report.fetched.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_network_error() {
        let fetcher = FixtureFetcher::new(&[("https://shop.example/", PAGE)]);
        let result = verifier(fetcher).verify(|_| Ok(())).await;
        assert!(matches!(result, Err(JanitorError::Network { .. })));
    }

    #[tokio::test]
    async fn test_callback_error_stops_before_next_fetch() {
        let fetcher = FixtureFetcher::new(&[
            ("https://shop.example/", PAGE),
            ("https://shop.example/_next/static/chunks/webpack-8f1e.js", "a"),
            ("https://shop.example/_next/static/chunks/app/layout-3c2a.js", "고객센터"),
        ]);
        let v = verifier(fetcher);

        let mut calls = 0;
        let result = v
            .verify(|_| {
                calls += 1;
                if calls > 1 {
                    Err(JanitorError::Cancelled)
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(JanitorError::Cancelled)));
        let requested = v.fetcher.requested.lock().unwrap();
        assert_eq!(requested.len(), 2);
        assert!(!requested.iter().any(|u| u.contains("layout-3c2a")));
    }

    #[test]
    fn test_unjoinable_chunk_keeps_path_in_error() {
        let v = SiteVerifier::new(
            FixtureFetcher::new(&[]),
            "data:text/html,shop",
            r#"src="([^"]+\.js)""#,
            vec!["Footer".to_string()],
        )
        .unwrap();

        match v.chunk_url("/_next/static/chunks/app.js") {
            Err(JanitorError::InvalidUrl { url }) => {
                assert!(url.ends_with("/_next/static/chunks/app.js"), "got {}", url)
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_custom_targets() {
        let v = SiteVerifier::new(
            FixtureFetcher::new(&[]),
            "https://shop.example",
            r#"src="([^"]+\.js)""#,
            vec!["Footer v2".to_string(), String::new()],
        )
        .unwrap();
        assert_eq!(v.targets, vec!["Footer v2"]);
        assert_eq!(v.matching_target("<footer>Footer v2</footer>"), Some("Footer v2"));
        assert_eq!(v.matching_target("<footer></footer>"), None);
    }
}
