//! Syncable-pair discovery between a language's audio and text filesets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::TimingIndex;
use crate::fileset_id::{FilesetId, DRAMATIZED_VARIANT, PLAIN_VARIANT};

/// Prefix length compared between audio and text identifiers.
pub const PREFIX_MATCH_LEN: usize = 7;

/// Audio identifiers shorter than this never match.
pub const MIN_AUDIO_ID_LEN: usize = 6;

/// An audio fileset and the text filesets it can be time-aligned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncablePair {
    pub audio_fileset_id: FilesetId,
    /// Sorted.
    pub text_fileset_id: Vec<FilesetId>,
}

/// Drop dramatized variants when a plain reading of the same recording exists.
///
/// Identifiers are grouped by [`FilesetId::dramatization_key`]. A group with
/// both a `1` and a `2` variant keeps only its non-`2` members; any other
/// group is kept whole. Output preserves group first-appearance order.
/// Identifiers shorter than three characters have no key and are dropped.
pub fn filter_dramatized_versions(ids: &[FilesetId]) -> Vec<FilesetId> {
    let mut groups: Vec<Vec<&FilesetId>> = Vec::new();
    let mut group_of: HashMap<String, usize> = HashMap::new();

    for id in ids {
        let Some(key) = id.dramatization_key() else {
            continue;
        };
        let index = *group_of.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(id);
    }

    let mut filtered = Vec::with_capacity(ids.len());
    for group in groups {
        let has_plain = group
            .iter()
            .any(|id| id.variant_marker() == Some(PLAIN_VARIANT));
        let has_dramatized = group
            .iter()
            .any(|id| id.variant_marker() == Some(DRAMATIZED_VARIANT));

        if has_plain && has_dramatized {
            filtered.extend(
                group
                    .into_iter()
                    .filter(|id| id.variant_marker() != Some(DRAMATIZED_VARIANT))
                    .cloned(),
            );
        } else {
            filtered.extend(group.into_iter().cloned());
        }
    }

    filtered
}

/// Text identifiers sharing a prefix of `min(7, text length)` with `audio`.
pub fn match_audio_to_text(audio: &FilesetId, texts: &[FilesetId]) -> Vec<FilesetId> {
    let audio_bytes = audio.as_str().as_bytes();
    if audio_bytes.len() < MIN_AUDIO_ID_LEN {
        return Vec::new();
    }

    let mut matches: Vec<FilesetId> = texts
        .iter()
        .filter(|text| {
            let text_bytes = text.as_str().as_bytes();
            let n = PREFIX_MATCH_LEN.min(text_bytes.len());
            n > 0 && audio_bytes.len() >= n && audio_bytes[..n] == text_bytes[..n]
        })
        .cloned()
        .collect();

    matches.sort();
    matches
}

/// Syncable pairs for one language.
///
/// Timing-capable audio is removed first (timing and sync are alternative
/// data sources), then dramatized duplicates, then each survivor is matched
/// against every text identifier.
pub fn compute_syncable_pairs(
    audio: &[FilesetId],
    text: &[FilesetId],
    timing: &TimingIndex,
) -> Vec<SyncablePair> {
    let without_timing: Vec<FilesetId> = audio
        .iter()
        .filter(|id| !timing.has_timing(id))
        .cloned()
        .collect();

    filter_dramatized_versions(&without_timing)
        .into_iter()
        .filter_map(|audio_id| {
            let matches = match_audio_to_text(&audio_id, text);
            if matches.is_empty() {
                None
            } else {
                Some(SyncablePair {
                    audio_fileset_id: audio_id,
                    text_fileset_id: matches,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<FilesetId> {
        raw.iter().map(|s| FilesetId::new(*s)).collect()
    }

    #[test]
    fn test_filter_keeps_plain_when_both_exist() {
        let filtered = filter_dramatized_versions(&ids(&["ENGWEBN1DA", "ENGWEBN2DA"]));
        assert_eq!(filtered, ids(&["ENGWEBN1DA"]));
    }

    #[test]
    fn test_filter_keeps_lone_dramatized() {
        let filtered = filter_dramatized_versions(&ids(&["ENGWEBN2DA", "ENGKJVO1DA"]));
        assert_eq!(filtered, ids(&["ENGWEBN2DA", "ENGKJVO1DA"]));
    }

    #[test]
    fn test_filter_groups_only_matching_suffixes() {
        // Different suffixes land in different groups.
        let filtered =
            filter_dramatized_versions(&ids(&["ENGWEBN1DA", "ENGWEBN2DA-opus16"]));
        assert_eq!(filtered, ids(&["ENGWEBN1DA", "ENGWEBN2DA-opus16"]));
    }

    #[test]
    fn test_filter_keeps_other_variants_in_mixed_group() {
        let filtered =
            filter_dramatized_versions(&ids(&["ENGWEBN1DA", "ENGWEBN2DA", "ENGWEBN3DA"]));
        assert_eq!(filtered, ids(&["ENGWEBN1DA", "ENGWEBN3DA"]));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let input = ids(&[
            "ENGWEBN1DA",
            "ENGWEBN2DA",
            "ENGKJVO2DA",
            "SPNBDAN1DA-opus16",
            "SPNBDAN2DA-opus16",
        ]);
        let once = filter_dramatized_versions(&input);
        let twice = filter_dramatized_versions(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_drops_very_short_ids() {
        assert!(filter_dramatized_versions(&ids(&["AB"])).is_empty());
    }

    #[test]
    fn test_match_seven_char_prefix() {
        let matches = match_audio_to_text(
            &FilesetId::new("ENGWEBN1DA"),
            &ids(&["ENGWEBN_ET-json", "ENGWEBN_ET", "ENGWEBO_ET", "ENGKJV_ET"]),
        );
        assert_eq!(matches, ids(&["ENGWEBN_ET", "ENGWEBN_ET-json"]));
    }

    #[test]
    fn test_match_short_text_uses_text_length() {
        let matches = match_audio_to_text(&FilesetId::new("ENGWEBN1DA"), &ids(&["ENGWE"]));
        assert_eq!(matches, ids(&["ENGWE"]));

        let matches = match_audio_to_text(&FilesetId::new("ENGWEB"), &ids(&["ENGWE"]));
        assert_eq!(matches, ids(&["ENGWE"]));
    }

    #[test]
    fn test_match_short_audio_never_matches() {
        assert!(match_audio_to_text(&FilesetId::new("ENGWE"), &ids(&["ENGWE"])).is_empty());
        // Audio shorter than the compare length.
        assert!(
            match_audio_to_text(&FilesetId::new("ENGWEB"), &ids(&["ENGWEBN_ET"])).is_empty()
        );
    }

    #[test]
    fn test_compute_pairs_scenario() {
        let pairs = compute_syncable_pairs(
            &ids(&["ENGWEBN1DA", "ENGWEBN2DA"]),
            &ids(&["ENGWEBN_ET"]),
            &TimingIndex::default(),
        );
        assert_eq!(
            pairs,
            vec![SyncablePair {
                audio_fileset_id: FilesetId::new("ENGWEBN1DA"),
                text_fileset_id: ids(&["ENGWEBN_ET"]),
            }]
        );
    }

    #[test]
    fn test_compute_pairs_excludes_timing_audio() {
        let timing = TimingIndex::new(["ENGWEBN1DA"]);
        let pairs = compute_syncable_pairs(
            &ids(&["ENGWEBN1DA-opus16", "ENGWEBN2DA"]),
            &ids(&["ENGWEBN_ET"]),
            &timing,
        );
        // The plain reading has timing, so only the dramatized one is left to sync.
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].audio_fileset_id, FilesetId::new("ENGWEBN2DA"));
        assert!(pairs
            .iter()
            .all(|p| !timing.has_timing(&p.audio_fileset_id)));
    }

    #[test]
    fn test_compute_pairs_without_text() {
        let pairs =
            compute_syncable_pairs(&ids(&["ENGWEBN1DA"]), &[], &TimingIndex::default());
        assert!(pairs.is_empty());
    }
}
