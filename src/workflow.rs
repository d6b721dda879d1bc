use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::bazarr::{BazarrApi, BazarrClient, ItemKind, WantedItem};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{ItemPipeline, Outcome, SkipReason};

/// Tally of one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub kind: ItemKind,
    pub total: usize,
    /// Items that had a translate request issued
    pub translated: usize,
    pub no_action: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn new(kind: ItemKind, total: usize) -> Self {
        Self {
            kind,
            total,
            translated: 0,
            no_action: 0,
            skipped: BTreeMap::new(),
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Translated => self.translated += 1,
            Outcome::NoActionNeeded => self.no_action += 1,
            Outcome::Skipped(reason) => *self.skipped.entry(reason).or_insert(0) += 1,
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Batch orchestrator over Bazarr's wanted lists
pub struct Workflow {
    config: Config,
    api: Box<dyn BazarrApi>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api = BazarrClient::new(&config.bazarr)?;
        Ok(Self::with_api(config, Box::new(api)))
    }

    pub fn with_api(config: Config, api: Box<dyn BazarrApi>) -> Self {
        Self { config, api }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every wanted item of `kind` one at a time.
    ///
    /// Only a failure to list wanted items is returned as an error; per-item
    /// problems end up in the summary.
    pub async fn run(&self, kind: ItemKind) -> Result<BatchSummary> {
        let started = Instant::now();
        info!("Fetching {} with missing subtitles", kind.plural().to_lowercase());

        let mut items = self.api.wanted(kind).await?;
        info!("GET {}: {} items in {:.2?}", kind.plural(), items.len(), started.elapsed());
        if self.config.workflow.debug {
            debug!("Wanted {}: {:#?}", kind.plural().to_lowercase(), items);
        }

        sort_wanted(&mut items);

        let pipeline = ItemPipeline::new(self.api.as_ref(), &self.config.workflow);
        let mut summary = BatchSummary::new(kind, items.len());

        for (index, item) in items.iter().enumerate() {
            debug!("[{}/{}] {}", index + 1, items.len(), item.display_name());
            let outcome = pipeline.process(item).await;
            if let Outcome::Skipped(reason) = outcome {
                warn!("Skipped {}: {}", item.display_name(), reason);
            }
            summary.record(outcome);
        }

        summary.elapsed = started.elapsed();
        info!(
            translated = summary.translated,
            no_action = summary.no_action,
            skipped = summary.skipped_total(),
            "Finished {} {} in {:.2?}",
            summary.total,
            kind.plural().to_lowercase(),
            summary.elapsed
        );

        Ok(summary)
    }
}

/// Ordering key: lower-cased title without a leading "the "/"a ", with the
/// episode number appended for episodes
pub fn sort_key(item: &WantedItem) -> String {
    let key = match &item.episode {
        Some(episode) => format!("{}.{}", item.title.to_lowercase(), episode.number),
        None => item.title.to_lowercase(),
    };

    for article in ["the ", "a "] {
        if let Some(rest) = key.strip_prefix(article) {
            return rest.to_string();
        }
    }
    key
}

/// Stable sort by `sort_key`; equal keys keep listing order
pub fn sort_wanted(items: &mut [WantedItem]) {
    items.sort_by_cached_key(sort_key);
}
