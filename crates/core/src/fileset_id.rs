//! Fileset identifier parsing.
//!
//! Catalog fileset codes encode their meaning at fixed character offsets:
//!
//! ```text
//! ENGWEB N 1 DA -opus16
//! |      | | |  `- format suffix (codec or markup variant)
//! |      | | `---- content type (DA audio, ET text, SA streaming adaptation)
//! |      | `------ variant (1 plain reading, 2 dramatized)
//! |      `-------- collection marker (O, N, C, P, S)
//! `--------------- work stem (language + version)
//! ```
//!
//! Every offset query used by classification, matching and acquisition lives
//! on [`FilesetId`] so the arithmetic exists in exactly one place.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Audio format suffixes, most specific first.
pub const AUDIO_FORMAT_SUFFIXES: [&str; 5] = ["-opus16", "-opus32", "-mp3-64", "-mp3-128", "-mp3"];

/// Text format suffixes.
pub const TEXT_FORMAT_SUFFIXES: [&str; 2] = ["-json", "-usx"];

/// Text suffixes stripped when deriving a work stem from a text fileset.
const TEXT_STEM_SUFFIXES: [&str; 3] = ["_ET-json", "_ET-usx", "_ET"];

/// Variant markers at the third-from-last position.
pub const PLAIN_VARIANT: char = '1';
pub const DRAMATIZED_VARIANT: char = '2';

/// Collection marker found at position 7 (1-indexed) of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionMarker {
    OldTestament,
    NewTestament,
    Complete,
    Partial,
    Story,
}

impl CollectionMarker {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'O' => Some(Self::OldTestament),
            'N' => Some(Self::NewTestament),
            'C' => Some(Self::Complete),
            'P' => Some(Self::Partial),
            'S' => Some(Self::Story),
            _ => None,
        }
    }
}

/// Audio encoding family, used for download priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioFormat {
    /// Plain MP3 (no codec suffix or an mp3 suffix).
    Plain,
    /// Compressed opus variant.
    Compressed,
}

/// Text representation family, ordered by download priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextFormat {
    /// Plain verse text (`_ET` with no format suffix).
    Plain,
    /// USX structured markup.
    Markup,
    /// JSON-tagged verses.
    Json,
    /// Anything else.
    Other,
}

/// A catalog fileset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilesetId(String);

impl FilesetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the identifier.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// The raw character at position 7 (1-indexed), if any.
    pub fn collection_char(&self) -> Option<char> {
        self.0.chars().nth(6)
    }

    /// The testament/collection marker at position 7, if it is a known one.
    pub fn testament_marker(&self) -> Option<CollectionMarker> {
        self.collection_char().and_then(CollectionMarker::from_char)
    }

    /// The character at position `length - 3` (third from the end).
    ///
    /// Evaluated on the identifier exactly as written, format suffix included.
    pub fn variant_marker(&self) -> Option<char> {
        self.0.chars().rev().nth(2)
    }

    /// Grouping key for dramatization deduplication: the identifier with the
    /// variant character removed. `None` for identifiers shorter than three
    /// characters.
    pub fn dramatization_key(&self) -> Option<String> {
        let len = self.char_len();
        if len < 3 {
            return None;
        }
        let skip = len - 3;
        Some(
            self.0
                .chars()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, c)| c)
                .collect(),
        )
    }

    /// Whether the underlying recording is the dramatized variant.
    ///
    /// Looks at the variant marker after removing any format suffix, so
    /// `ENGWEBN2DA-opus16` is dramatized just like `ENGWEBN2DA`.
    pub fn is_dramatized(&self) -> bool {
        FilesetId::new(self.strip_format_suffix()).variant_marker() == Some(DRAMATIZED_VARIANT)
    }

    /// Whether the identifier marks a streaming-only adaptation (`SA` in the
    /// content-type slot, characters 9-10).
    pub fn is_streaming_adaptation(&self) -> bool {
        self.0.get(8..10) == Some("SA")
    }

    /// The identifier with a single audio format suffix removed.
    ///
    /// This is the key the timing-capability list is published under.
    pub fn timing_key(&self) -> &str {
        strip_first_suffix(&self.0, &AUDIO_FORMAT_SUFFIXES)
    }

    /// The identifier with its audio or text format suffix removed.
    pub fn strip_format_suffix(&self) -> &str {
        let stripped = strip_first_suffix(&self.0, &AUDIO_FORMAT_SUFFIXES);
        if stripped.len() != self.0.len() {
            return stripped;
        }
        strip_first_suffix(&self.0, &TEXT_FORMAT_SUFFIXES)
    }

    pub fn audio_format(&self) -> AudioFormat {
        if self.0.contains("-opus") {
            AudioFormat::Compressed
        } else {
            AudioFormat::Plain
        }
    }

    pub fn text_format(&self) -> TextFormat {
        if self.0.ends_with("_ET") && !self.0.contains('-') {
            TextFormat::Plain
        } else if self.0.ends_with("-usx") {
            TextFormat::Markup
        } else if self.0.ends_with("-json") {
            TextFormat::Json
        } else {
            TextFormat::Other
        }
    }

    /// Heuristic work stem for filesets whose catalog entry has no
    /// abbreviation: strips format suffixes, then testament/type tags.
    ///
    /// `AAAMLTN2DA-opus16` -> `AAAMLT`, `ENGESV_ET-usx` -> `ENGESV`.
    pub fn derived_work_stem(&self) -> String {
        let base = strip_first_suffix(&self.0, &AUDIO_FORMAT_SUFFIXES);
        let base = strip_first_suffix(base, &TEXT_STEM_SUFFIXES);

        if base.chars().count() <= 6 || !base.is_ascii() {
            return base.to_string();
        }

        let len = base.len();
        let tag = &base[len - 4..len - 2];
        if matches!(tag, "N1" | "O1" | "N2" | "O2") && base.ends_with("DA") {
            base[..len - 4].to_string()
        } else if base.ends_with("DA") {
            base[..len - 3].to_string()
        } else {
            base.to_string()
        }
    }
}

fn strip_first_suffix<'a>(id: &'a str, suffixes: &[&str]) -> &'a str {
    suffixes
        .iter()
        .find_map(|suffix| id.strip_suffix(suffix))
        .unwrap_or(id)
}

impl fmt::Display for FilesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilesetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FilesetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for FilesetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FilesetId {
        FilesetId::new(s)
    }

    #[test]
    fn test_testament_marker_position_seven() {
        assert_eq!(
            id("AAAMLTN1DA").testament_marker(),
            Some(CollectionMarker::NewTestament)
        );
        assert_eq!(
            id("ENGESVO2DA").testament_marker(),
            Some(CollectionMarker::OldTestament)
        );
        assert_eq!(
            id("ENGKJVC1DA").testament_marker(),
            Some(CollectionMarker::Complete)
        );
        assert_eq!(
            id("AAAMLTP1DA").testament_marker(),
            Some(CollectionMarker::Partial)
        );
        assert_eq!(
            id("XYZABCS1DA").testament_marker(),
            Some(CollectionMarker::Story)
        );
        assert_eq!(id("ENGESV_ET").testament_marker(), None);
        assert_eq!(id("ENGESV").testament_marker(), None);
    }

    #[test]
    fn test_collection_char() {
        assert_eq!(id("ENGWEBN_ET").collection_char(), Some('N'));
        assert_eq!(id("ENGESV_ET").collection_char(), Some('_'));
        assert_eq!(id("SHORT").collection_char(), None);
    }

    #[test]
    fn test_variant_marker_is_third_from_end() {
        assert_eq!(id("ENGWEBN1DA").variant_marker(), Some('1'));
        assert_eq!(id("ENGWEBN2DA").variant_marker(), Some('2'));
        // Raw identifier: suffix characters count.
        assert_eq!(id("ENGWEBN2DA-opus16").variant_marker(), Some('s'));
        assert_eq!(id("AB").variant_marker(), None);
    }

    #[test]
    fn test_dramatization_key_removes_variant_char() {
        assert_eq!(
            id("ENGWEBN1DA").dramatization_key().as_deref(),
            Some("ENGWEBNDA")
        );
        assert_eq!(
            id("ENGWEBN2DA").dramatization_key(),
            id("ENGWEBN1DA").dramatization_key()
        );
        assert_eq!(id("ABC").dramatization_key().as_deref(), Some("BC"));
        assert_eq!(id("AB").dramatization_key(), None);
    }

    #[test]
    fn test_is_dramatized_ignores_format_suffix() {
        assert!(!id("ENGWEBN1DA").is_dramatized());
        assert!(id("ENGWEBN2DA").is_dramatized());
        assert!(id("ENGWEBN2DA-opus16").is_dramatized());
        assert!(!id("ENGWEBN1DA-opus16").is_dramatized());
        assert!(!id("ENGWEBN_ET").is_dramatized());
    }

    #[test]
    fn test_streaming_adaptation_marker() {
        assert!(id("ENGWEBN1SA").is_streaming_adaptation());
        assert!(id("ENGWEBO2SA").is_streaming_adaptation());
        assert!(id("ENGWEBN1SA-opus16").is_streaming_adaptation());
        assert!(!id("ENGWEBN1DA").is_streaming_adaptation());
        // "SA" in the work stem is not the content-type slot.
        assert!(!id("SAMSANN1DA").is_streaming_adaptation());
        assert!(!id("ENGSA").is_streaming_adaptation());
    }

    #[test]
    fn test_timing_key_strips_one_audio_suffix() {
        assert_eq!(id("ENGWEBN1DA-opus16").timing_key(), "ENGWEBN1DA");
        assert_eq!(id("ENGWEBN1DA-opus32").timing_key(), "ENGWEBN1DA");
        assert_eq!(id("ENGWEBN1DA-mp3-64").timing_key(), "ENGWEBN1DA");
        assert_eq!(id("ENGWEBN1DA-mp3-128").timing_key(), "ENGWEBN1DA");
        assert_eq!(id("ENGWEBN1DA-mp3").timing_key(), "ENGWEBN1DA");
        assert_eq!(id("ENGWEBN1DA").timing_key(), "ENGWEBN1DA");
        // Text suffixes are not audio suffixes.
        assert_eq!(id("ENGWEBN_ET-json").timing_key(), "ENGWEBN_ET-json");
    }

    #[test]
    fn test_strip_format_suffix() {
        assert_eq!(id("AAAMLTN1DA-opus16").strip_format_suffix(), "AAAMLTN1DA");
        assert_eq!(id("ENGESV_ET-json").strip_format_suffix(), "ENGESV_ET");
        assert_eq!(id("ENGESV_ET-usx").strip_format_suffix(), "ENGESV_ET");
        assert_eq!(id("ENGESV_ET").strip_format_suffix(), "ENGESV_ET");
    }

    #[test]
    fn test_audio_format() {
        assert_eq!(id("ENGWEBN1DA").audio_format(), AudioFormat::Plain);
        assert_eq!(id("ENGWEBN1DA-mp3-64").audio_format(), AudioFormat::Plain);
        assert_eq!(
            id("ENGWEBN1DA-opus16").audio_format(),
            AudioFormat::Compressed
        );
        assert!(AudioFormat::Plain < AudioFormat::Compressed);
    }

    #[test]
    fn test_text_format_ranking() {
        assert_eq!(id("ENGWEBN_ET").text_format(), TextFormat::Plain);
        assert_eq!(id("ENGWEBN_ET-usx").text_format(), TextFormat::Markup);
        assert_eq!(id("ENGWEBN_ET-json").text_format(), TextFormat::Json);
        assert_eq!(id("ENGWEBN_ET-xml").text_format(), TextFormat::Other);
        assert!(TextFormat::Plain < TextFormat::Markup);
        assert!(TextFormat::Markup < TextFormat::Json);
        assert!(TextFormat::Json < TextFormat::Other);
    }

    #[test]
    fn test_derived_work_stem() {
        assert_eq!(id("AAAMLTN1DA").derived_work_stem(), "AAAMLT");
        assert_eq!(id("AAAMLTN2DA-opus16").derived_work_stem(), "AAAMLT");
        assert_eq!(id("ENGESVO1DA").derived_work_stem(), "ENGESV");
        assert_eq!(id("ENGESV_ET").derived_work_stem(), "ENGESV");
        assert_eq!(id("ENGESV_ET-json").derived_work_stem(), "ENGESV");
        assert_eq!(id("ENGESVC1DA").derived_work_stem(), "ENGESVC");
        assert_eq!(id("ENGKJV").derived_work_stem(), "ENGKJV");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&id("ENGWEBN1DA")).unwrap();
        assert_eq!(json, "\"ENGWEBN1DA\"");
        let parsed: FilesetId = serde_json::from_str("\"ENGWEBN_ET\"").unwrap();
        assert_eq!(parsed.as_str(), "ENGWEBN_ET");
    }

    #[test]
    fn test_non_ascii_identifiers_do_not_panic() {
        let weird = id("ÉNGWEBN1DA");
        let _ = weird.is_streaming_adaptation();
        let _ = weird.derived_work_stem();
        let _ = weird.dramatization_key();
        assert_eq!(weird.testament_marker(), Some(CollectionMarker::NewTestament));
    }
}
