use crate::bazarr::SearchCandidate;

/// Provider whose results are taken from the media container itself
pub const EMBEDDED_PROVIDER: &str = "embeddedsubtitles";

/// Pick the candidate to download.
///
/// The first embedded-subtitles result wins regardless of score; otherwise the
/// first result is taken as-is, since Bazarr already orders results by score.
/// Returns `None` only for an empty slice.
pub fn select_candidate(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    candidates
        .iter()
        .find(|c| c.provider == EMBEDDED_PROVIDER)
        .or_else(|| candidates.first())
}
