use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ItemKind;

/// Every Bazarr response wraps its payload in `data`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// One entry of a wanted listing, normalized across episodes and movies
#[derive(Debug, Clone, PartialEq)]
pub struct WantedItem {
    pub kind: ItemKind,
    /// Sonarr episode id or Radarr movie id
    pub id: i64,
    /// Series title for episodes, movie title for movies
    pub title: String,
    /// Release year, movies only
    pub year: Option<i32>,
    pub episode: Option<EpisodeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeInfo {
    pub series_id: i64,
    /// Season/episode numbering as Bazarr renders it, e.g. "1x02"
    pub number: String,
    pub title: String,
}

impl WantedItem {
    /// Human readable name used in log lines
    pub fn display_name(&self) -> String {
        match &self.episode {
            Some(episode) => format!("{} ({}) {}", self.title, episode.number, episode.title),
            None => match self.year {
                Some(year) => format!("{} ({})", self.title, year),
                None => self.title.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WantedEpisode {
    #[serde(default, deserialize_with = "null_as_default")]
    series_title: String,
    #[serde(rename = "episode_number", default, deserialize_with = "null_as_default")]
    episode_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    episode_title: String,
    sonarr_series_id: i64,
    sonarr_episode_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WantedMovie {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default)]
    year: Option<i32>,
    radarr_id: i64,
}

impl From<WantedEpisode> for WantedItem {
    fn from(raw: WantedEpisode) -> Self {
        Self {
            kind: ItemKind::Episode,
            id: raw.sonarr_episode_id,
            title: raw.series_title,
            year: None,
            episode: Some(EpisodeInfo {
                series_id: raw.sonarr_series_id,
                number: raw.episode_number,
                title: raw.episode_title,
            }),
        }
    }
}

impl From<WantedMovie> for WantedItem {
    fn from(raw: WantedMovie) -> Self {
        Self {
            kind: ItemKind::Movie,
            id: raw.radarr_id,
            title: raw.title,
            year: raw.year,
            episode: None,
        }
    }
}

/// Current subtitle state of one item as Bazarr reports it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemDetail {
    #[serde(rename = "missing_subtitles", default, deserialize_with = "null_as_default")]
    pub missing_languages: Vec<Language>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitles: Vec<SubtitleFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Language {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code2: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubtitleFile {
    /// `None` when the subtitle is known but not on disk
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code2: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub forced: bool,
    #[serde(default, deserialize_with = "flag")]
    pub hi: bool,
}

impl ItemDetail {
    /// Paths of subtitles in `language` that exist on disk, in Bazarr's order
    pub fn usable_paths<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.subtitles
            .iter()
            .filter(move |s| s.code2 == language)
            .filter_map(|s| s.path.as_deref())
    }

    pub fn has_usable(&self, language: &str) -> bool {
        self.usable_paths(language).next().is_some()
    }

    pub fn is_missing(&self, language: &str) -> bool {
        self.missing_languages.iter().any(|l| l.code2 == language)
    }
}

/// One provider search result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchCandidate {
    pub provider: String,
    #[serde(deserialize_with = "score")]
    pub score: f64,
    #[serde(default, deserialize_with = "flag")]
    pub hearing_impaired: bool,
    #[serde(default, deserialize_with = "flag")]
    pub forced: bool,
    #[serde(default, deserialize_with = "text")]
    pub original_format: String,
    /// Opaque handle Bazarr needs back to download this result
    #[serde(default)]
    pub subtitle: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub hi: bool,
    pub forced: bool,
    pub original_format: String,
    pub provider: String,
    pub subtitle: Value,
}

impl From<&SearchCandidate> for DownloadRequest {
    fn from(candidate: &SearchCandidate) -> Self {
        Self {
            hi: candidate.hearing_impaired,
            forced: candidate.forced,
            original_format: candidate.original_format.clone(),
            provider: candidate.provider.clone(),
            subtitle: candidate.subtitle.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslateRequest {
    pub language: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Bazarr renders python booleans as "True"/"False" in several payloads.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!("expected boolean, got {}", other))),
    }
}

fn score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("score out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid score '{}': {}", s, e))),
        other => Err(serde::de::Error::custom(format!("expected score, got {}", other))),
    }
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
