//! Output path scheme.
//!
//! ```text
//! {root}/{language}/{work}/{BOOK}/{BOOK}_{ccc}_{FILESET}.mp3
//! {root}/{language}/{work}/{BOOK}/{BOOK}_{ccc}_{FILESET}.txt
//! {root}/{language}/{work}/{BOOK}/{BOOK}_{ccc}_{FILESET}_timing.json
//! ```
//!
//! Language, work and fileset names come from the catalog and are passed
//! through [`path_component`], so none of them can leave its directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::fileset_id::FilesetId;

/// Kind of stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Audio,
    Text,
    Timing,
}

impl ArtifactKind {
    /// File name suffix following the fileset identifier.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Audio => ".mp3",
            Self::Text => ".txt",
            Self::Timing => "_timing.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Text => "text",
            Self::Timing => "timing",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps (language, work, book, chapter, fileset) to output paths.
#[derive(Debug, Clone)]
pub struct ContentLayout {
    root: PathBuf,
}

impl ContentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn book_dir(&self, language: &str, work: &str, book: &str) -> PathBuf {
        self.root
            .join(path_component(language))
            .join(path_component(work))
            .join(path_component(book))
    }

    pub fn artifact_path(
        &self,
        language: &str,
        work: &str,
        book: &str,
        chapter: u32,
        fileset: &FilesetId,
        kind: ArtifactKind,
    ) -> PathBuf {
        self.book_dir(language, work, book)
            .join(artifact_file_name(book, chapter, fileset, kind))
    }
}

/// Replace separators and control characters with `_`; `.`, `..` and empty
/// names become underscores too.
pub fn path_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" => "_".to_string(),
        "." | ".." => "_".repeat(cleaned.len()),
        _ => cleaned,
    }
}

/// `{BOOK}_{ccc}_`, the prefix shared by every artifact of one chapter.
pub fn chapter_prefix(book: &str, chapter: u32) -> String {
    format!("{}_{:03}_", book, chapter)
}

pub fn artifact_file_name(
    book: &str,
    chapter: u32,
    fileset: &FilesetId,
    kind: ArtifactKind,
) -> String {
    format!(
        "{}{}{}",
        chapter_prefix(book, chapter),
        path_component(fileset.as_str()),
        kind.suffix()
    )
}

/// Recover the fileset identifier from an artifact file name.
///
/// Returns `None` if the name belongs to another chapter or kind.
pub fn parse_artifact_name(
    file_name: &str,
    book: &str,
    chapter: u32,
    kind: ArtifactKind,
) -> Option<FilesetId> {
    let fileset = file_name
        .strip_prefix(&chapter_prefix(book, chapter))?
        .strip_suffix(kind.suffix())?;
    if fileset.is_empty() {
        return None;
    }
    Some(FilesetId::new(fileset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        let layout = ContentLayout::new("/downloads/BB");
        let id = FilesetId::new("ENGWEBN1DA-opus16");

        assert_eq!(
            layout.artifact_path("eng", "ENGWEB", "MAT", 5, &id, ArtifactKind::Audio),
            PathBuf::from("/downloads/BB/eng/ENGWEB/MAT/MAT_005_ENGWEBN1DA-opus16.mp3")
        );
        assert_eq!(
            layout.artifact_path("eng", "ENGWEB", "PSA", 117, &id, ArtifactKind::Timing),
            PathBuf::from("/downloads/BB/eng/ENGWEB/PSA/PSA_117_ENGWEBN1DA-opus16_timing.json")
        );
    }

    #[test]
    fn test_path_component() {
        assert_eq!(path_component("ENGWEB"), "ENGWEB");
        assert_eq!(path_component("ENG/WEB"), "ENG_WEB");
        assert_eq!(path_component("..\\evil"), ".._evil");
        assert_eq!(path_component(".."), "__");
        assert_eq!(path_component("."), "_");
        assert_eq!(path_component(""), "_");
        assert_eq!(path_component("a\nb"), "a_b");
    }

    #[test]
    fn test_catalog_names_stay_under_root() {
        let layout = ContentLayout::new("/downloads/BB");
        let id = FilesetId::new("../../ENGWEBN1DA");

        let path = layout.artifact_path("../eng", "..", "MAT", 1, &id, ArtifactKind::Audio);
        assert_eq!(
            path,
            PathBuf::from("/downloads/BB/.._eng/__/MAT/MAT_001_.._.._ENGWEBN1DA.mp3")
        );
        assert!(path
            .components()
            .all(|c| !matches!(c, std::path::Component::ParentDir)));
        assert_eq!(
            layout.book_dir("eng", "ENG/WEB", "MAT"),
            PathBuf::from("/downloads/BB/eng/ENG_WEB/MAT")
        );
    }

    #[test]
    fn test_parse_artifact_name() {
        assert_eq!(
            parse_artifact_name("MAT_001_ENGWEBN1DA.mp3", "MAT", 1, ArtifactKind::Audio),
            Some(FilesetId::new("ENGWEBN1DA"))
        );
        assert_eq!(
            parse_artifact_name("MAT_001_ENGWEB_ET.txt", "MAT", 1, ArtifactKind::Text),
            Some(FilesetId::new("ENGWEB_ET"))
        );
        assert_eq!(
            parse_artifact_name("MAT_001_ENGWEBN1DA_timing.json", "MAT", 1, ArtifactKind::Timing),
            Some(FilesetId::new("ENGWEBN1DA"))
        );
    }

    #[test]
    fn test_parse_rejects_other_units() {
        assert!(parse_artifact_name("MAT_002_ENGWEBN1DA.mp3", "MAT", 1, ArtifactKind::Audio).is_none());
        assert!(parse_artifact_name("MAT_001_ENGWEBN1DA_timing.json", "MAT", 1, ArtifactKind::Audio).is_none());
        assert!(parse_artifact_name("MAT_001_.mp3", "MAT", 1, ArtifactKind::Audio).is_none());
        assert!(parse_artifact_name("MAT_001_ENGWEBN1DA.mp3.part", "MAT", 1, ArtifactKind::Audio).is_none());
    }
}
