use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::bazarr::{BazarrApi, DownloadRequest, ItemDetail, TranslateRequest, WantedItem};
use crate::config::WorkflowConfig;
use crate::selector::select_candidate;

/// Why an item was left alone for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    DetailFetchFailed,
    SearchFailed,
    NoCandidates,
    ScoreBelowThreshold,
    DownloadFailed,
    RefetchFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::DetailFetchFailed => "detail fetch failed",
            SkipReason::SearchFailed => "search failed",
            SkipReason::NoCandidates => "no candidates",
            SkipReason::ScoreBelowThreshold => "score below threshold",
            SkipReason::DownloadFailed => "download timed out/failed",
            SkipReason::RefetchFailed => "re-fetch failed",
        };
        f.write_str(reason)
    }
}

/// Terminal state of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    NoActionNeeded,
    /// A translate request was issued; it may still have failed remotely
    Translated,
}

/// Per-item decision pipeline: search, download and translate as needed
pub struct ItemPipeline<'a> {
    api: &'a dyn BazarrApi,
    config: &'a WorkflowConfig,
}

impl<'a> ItemPipeline<'a> {
    pub fn new(api: &'a dyn BazarrApi, config: &'a WorkflowConfig) -> Self {
        Self { api, config }
    }

    pub async fn process(&self, item: &WantedItem) -> Outcome {
        let name = item.display_name();
        let source = self.config.source_language.as_str();

        // Step 1: Current state
        let Some(mut detail) = self.fetch_detail(item, "fetch").await else {
            return Outcome::Skipped(SkipReason::DetailFetchFailed);
        };

        // Step 2: Search and download only when no source subtitle exists yet
        if self.config.search && !detail.has_usable(source) {
            if let Err(reason) = self.search_and_download(item, &name).await {
                return Outcome::Skipped(reason);
            }

            let Some(refreshed) = self.fetch_detail(item, "re-fetch").await else {
                return Outcome::Skipped(SkipReason::RefetchFailed);
            };
            detail = refreshed;
        }

        // Step 3: Gate checks on the freshest detail
        if detail.missing_languages.is_empty() {
            debug!("{} has no missing languages", name);
            return Outcome::NoActionNeeded;
        }
        if detail.subtitles.is_empty() {
            debug!("{} has no subtitles", name);
            return Outcome::NoActionNeeded;
        }
        let Some(path) = detail.usable_paths(source).next() else {
            debug!("{} has no usable '{}' subtitle", name, source);
            return Outcome::NoActionNeeded;
        };

        let target = self.config.target_language.as_str();
        if !detail.is_missing(target) {
            debug!("{} is not missing '{}'", name, target);
            return Outcome::NoActionNeeded;
        }

        // Step 4: Translate, best effort
        let request = TranslateRequest {
            language: target.to_string(),
            path: path.to_string(),
            kind: item.kind.as_str().to_string(),
            id: item.id,
        };

        info!("Translating sub for {}", name);
        let started = Instant::now();
        match self.api.translate(&request).await {
            Ok(()) => info!("Translated sub for {} in {:.2?}", name, started.elapsed()),
            Err(e) => error!("Error translating sub for {}: {}", name, e),
        }

        Outcome::Translated
    }

    async fn fetch_detail(&self, item: &WantedItem, phase: &str) -> Option<ItemDetail> {
        match self.api.detail(item).await {
            Ok(Some(detail)) => {
                if self.config.debug {
                    debug!(kind = %item.kind, id = item.id, "{} detail: {:?}", phase, detail);
                }
                Some(detail)
            }
            Ok(None) => {
                warn!(kind = %item.kind, id = item.id, "Bazarr returned no record on {}", phase);
                None
            }
            Err(e) => {
                error!(kind = %item.kind, id = item.id, "Unable to {} data from Bazarr: {}", phase, e);
                None
            }
        }
    }

    async fn search_and_download(&self, item: &WantedItem, name: &str) -> Result<(), SkipReason> {
        info!("Searching subs for {}", name);
        let started = Instant::now();

        let candidates = self.api.search(item).await.map_err(|e| {
            error!("Unable to search subs for {} from Bazarr: {}", name, e);
            SkipReason::SearchFailed
        })?;
        info!("Searched subs for {} in {:.2?}", name, started.elapsed());

        let Some(candidate) = select_candidate(&candidates) else {
            info!("Found 0 subtitles for {}, skipping", name);
            return Err(SkipReason::NoCandidates);
        };
        info!(
            provider = %candidate.provider,
            score = candidate.score,
            "Found {} subtitles for {}",
            candidates.len(),
            name
        );

        if candidate.score < self.config.minimum_score {
            info!(
                "Subtitle score of {} is lower than minimum score of {}, skipping",
                candidate.score, self.config.minimum_score
            );
            return Err(SkipReason::ScoreBelowThreshold);
        }

        info!("Downloading subs for {}", name);
        let started = Instant::now();
        let deadline = self.config.download_timeout();
        let request = DownloadRequest::from(candidate);

        match tokio::time::timeout(deadline, self.api.download(item, &request, deadline)).await {
            Ok(Ok(())) => {
                info!("Downloaded subs for {} in {:.2?}", name, started.elapsed());
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Download of subs for {} failed: {}", name, e);
                Err(SkipReason::DownloadFailed)
            }
            Err(_) => {
                error!("Download of subs for {} took longer than {:?}, skipping", name, deadline);
                Err(SkipReason::DownloadFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bazarr::{
        EpisodeInfo, ItemKind, Language, MockBazarrApi, SearchCandidate, SubtitleFile,
    };
    use crate::error::BazarrError;
    use mockall::Sequence;
    use serde_json::Value;
    use std::time::Duration;

    fn episode() -> WantedItem {
        WantedItem {
            kind: ItemKind::Episode,
            year: None,
            id: 42,
            title: "The Wire".to_string(),
            episode: Some(EpisodeInfo {
                series_id: 7,
                number: "1x02".to_string(),
                title: "The Detail".to_string(),
            }),
        }
    }

    fn detail(missing: &[&str], subtitles: &[(Option<&str>, &str)]) -> ItemDetail {
        ItemDetail {
            missing_languages: missing
                .iter()
                .map(|code| Language { code2: code.to_string(), name: None })
                .collect(),
            subtitles: subtitles
                .iter()
                .map(|(path, code)| SubtitleFile {
                    path: path.map(str::to_string),
                    code2: code.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn candidate(provider: &str, score: f64) -> SearchCandidate {
        SearchCandidate {
            provider: provider.to_string(),
            score,
            hearing_impaired: false,
            forced: false,
            original_format: "False".to_string(),
            subtitle: Value::String("payload".to_string()),
        }
    }

    fn config() -> WorkflowConfig {
        WorkflowConfig {
            minimum_score: 80.0,
            ..Default::default()
        }
    }

    fn api_error() -> BazarrError {
        BazarrError::Api {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_detail_fetch_failure_skips() {
        let mut api = MockBazarrApi::new();
        api.expect_detail().times(1).returning(|_| Err(api_error()));
        api.expect_search().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::DetailFetchFailed));
    }

    #[tokio::test]
    async fn test_missing_record_skips() {
        let mut api = MockBazarrApi::new();
        api.expect_detail().times(1).returning(|_| Ok(None));

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::DetailFetchFailed));
    }

    #[tokio::test]
    async fn test_satisfied_item_needs_nothing() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["de"], &[(Some("/tv/a.en.srt"), "en")]))));
        api.expect_search().never();
        api.expect_download().never();
        api.expect_translate().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::NoActionNeeded);
    }

    #[tokio::test]
    async fn test_no_missing_languages_is_left_alone() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&[], &[(Some("/tv/a.en.srt"), "en")]))));
        api.expect_translate().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::NoActionNeeded);
    }

    #[tokio::test]
    async fn test_no_subtitles_with_search_disabled() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["is"], &[]))));
        api.expect_search().never();
        api.expect_translate().never();

        let config = WorkflowConfig {
            search: false,
            ..config()
        };
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::NoActionNeeded);
    }

    #[tokio::test]
    async fn test_unmaterialized_english_triggers_search() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["is"], &[(None, "en")]))));
        api.expect_search().times(1).returning(|_| Ok(vec![]));
        api.expect_download().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::NoCandidates));
    }

    #[tokio::test]
    async fn test_search_failure_skips() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["is"], &[]))));
        api.expect_search().times(1).returning(|_| Err(api_error()));

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::SearchFailed));
    }

    #[tokio::test]
    async fn test_score_below_threshold_never_downloads() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["is"], &[]))));
        api.expect_search()
            .times(1)
            .returning(|_| Ok(vec![candidate("embeddedsubtitles", 79.99), candidate("x", 99.0)]));
        api.expect_download().never();
        api.expect_translate().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::ScoreBelowThreshold));
    }

    #[tokio::test]
    async fn test_score_equal_to_threshold_downloads() {
        let mut api = MockBazarrApi::new();
        let mut seq = Sequence::new();
        api.expect_detail()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(detail(&["is"], &[]))));
        api.expect_search()
            .times(1)
            .returning(|_| Ok(vec![candidate("x", 80.0)]));
        api.expect_download().times(1).returning(|_, _, _| Ok(()));
        api.expect_detail()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(detail(&[], &[(Some("/tv/a.en.srt"), "en")]))));

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::NoActionNeeded);
    }

    #[tokio::test]
    async fn test_download_failure_skips_without_refetch() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["is"], &[]))));
        api.expect_search()
            .times(1)
            .returning(|_| Ok(vec![candidate("x", 90.0)]));
        api.expect_download()
            .times(1)
            .returning(|_, _, _| Err(BazarrError::Timeout(Duration::from_secs(180))));
        api.expect_translate().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::DownloadFailed));
    }

    #[tokio::test]
    async fn test_refetch_failure_skips() {
        let mut api = MockBazarrApi::new();
        let mut seq = Sequence::new();
        api.expect_detail()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(detail(&["is"], &[]))));
        api.expect_search()
            .times(1)
            .returning(|_| Ok(vec![candidate("x", 90.0)]));
        api.expect_download().times(1).returning(|_, _, _| Ok(()));
        api.expect_detail()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        api.expect_translate().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::RefetchFailed));
    }

    #[tokio::test]
    async fn test_end_to_end_download_then_translate() {
        let mut api = MockBazarrApi::new();
        let mut seq = Sequence::new();
        api.expect_detail()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(detail(&["en", "is"], &[]))));
        api.expect_search()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![candidate("opensubtitles", 95.0), candidate("embeddedsubtitles", 85.0)]));
        api.expect_download()
            .withf(|item, request, timeout| {
                item.id == 42
                    && request.provider == "embeddedsubtitles"
                    && request.subtitle == Value::String("payload".to_string())
                    && *timeout == Duration::from_secs(180)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        api.expect_detail()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(Some(detail(
                    &["is"],
                    &[(Some("/tv/a.de.srt"), "de"), (Some("/tv/a.en.srt"), "en")],
                )))
            });
        api.expect_translate()
            .withf(|request| {
                request.language == "is"
                    && request.path == "/tv/a.en.srt"
                    && request.kind == "episode"
                    && request.id == 42
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Translated);
    }

    #[tokio::test]
    async fn test_target_not_missing_skips_translation() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["de", "fr"], &[(Some("/tv/a.en.srt"), "en")]))));
        api.expect_translate().never();

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::NoActionNeeded);
    }

    #[tokio::test]
    async fn test_translate_failure_keeps_classification() {
        let mut api = MockBazarrApi::new();
        api.expect_detail()
            .times(1)
            .returning(|_| Ok(Some(detail(&["is"], &[(Some("/tv/a.en.srt"), "en")]))));
        api.expect_search().never();
        api.expect_translate().times(1).returning(|_| Err(api_error()));

        let config = config();
        let outcome = ItemPipeline::new(&api, &config).process(&episode()).await;
        assert_eq!(outcome, Outcome::Translated);
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::DownloadFailed.to_string(), "download timed out/failed");
        assert_eq!(SkipReason::ScoreBelowThreshold.to_string(), "score below threshold");
    }
}
