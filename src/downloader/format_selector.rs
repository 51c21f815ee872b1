// FormatSelector - ranking and selection of probe variants
//
// Ranking never touches the descriptor; it builds a new ordered view.
// Order: height desc, then total bitrate desc, missing values as 0.
// Ties keep discovery order (stable sort), which decides "best".

use std::cmp::Ordering;

use super::errors::DownloadError;
use super::models::FormatVariant;

pub struct FormatSelector;

impl FormatSelector {
    /// Playable variants, best first
    pub fn rank(variants: &[FormatVariant]) -> Vec<&FormatVariant> {
        let mut ranked: Vec<&FormatVariant> =
            variants.iter().filter(|v| v.is_playable()).collect();

        // sort_by is stable
        ranked.sort_by(|a, b| Self::compare_quality(b, a));
        ranked
    }

    /// Head of a ranked sequence
    pub fn select_best<'a>(ranked: &[&'a FormatVariant]) -> Result<&'a FormatVariant, DownloadError> {
        ranked.first().copied().ok_or(DownloadError::NoPlayableFormat)
    }

    /// Exact lookup over the unfiltered set, so excluded variants
    /// (audio-only, no source) can still be requested on purpose
    pub fn select_by_id<'a>(
        variants: &'a [FormatVariant],
        format_id: &str,
    ) -> Result<&'a FormatVariant, DownloadError> {
        variants
            .iter()
            .find(|v| v.format_id == format_id)
            .ok_or_else(|| DownloadError::FormatNotFound(format_id.to_string()))
    }

    /// Requested variant if given, otherwise the best ranked one
    pub fn resolve<'a>(
        variants: &'a [FormatVariant],
        requested: Option<&str>,
    ) -> Result<&'a FormatVariant, DownloadError> {
        match requested {
            Some(id) => Self::select_by_id(variants, id),
            None => Self::select_best(&Self::rank(variants)),
        }
    }

    fn compare_quality(a: &FormatVariant, b: &FormatVariant) -> Ordering {
        let h_a = a.height.unwrap_or(0);
        let h_b = b.height.unwrap_or(0);
        h_a.cmp(&h_b).then_with(|| {
            let t_a = a.tbr.unwrap_or(0.0);
            let t_b = b.tbr.unwrap_or(0.0);
            t_a.total_cmp(&t_b)
        })
    }
}
