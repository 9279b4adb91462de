//! Types for the catalog snapshot (paginated `/bibles` pages).

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fileset_id::FilesetId;

/// Fileset types that carry audio.
pub const AUDIO_TYPES: [&str; 4] = ["audio", "audio_drama", "audio_stream", "audio_drama_stream"];

/// One cached catalog page.
///
/// Entries that do not decode as an object are kept as `Malformed` so the
/// rest of the page survives; `into_entries` drops and counts them.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    data: Vec<Lenient<CatalogEntry>>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl CatalogPage {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decoded entries in page order, plus the number of malformed ones.
    pub fn into_entries(self) -> (Vec<CatalogEntry>, usize) {
        let mut entries = Vec::with_capacity(self.data.len());
        let mut malformed = 0;
        for slot in self.data {
            match slot {
                Lenient::Valid(entry) => entries.push(entry),
                Lenient::Malformed(_) => malformed += 1,
            }
        }
        (entries, malformed)
    }
}

/// A list element that either decodes as `T` or is skipped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Malformed(IgnoredAny),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageMeta {
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_url: Option<String>,
}

/// A work (Bible translation/edition) as listed in the catalog.
///
/// Every field is optional on the wire; malformed entries are skipped by the
/// classifier rather than failing the whole page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub abbr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iso: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub language_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub autonym: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    /// Platform (storage bucket) -> filesets hosted there.
    #[serde(default)]
    pub filesets: Platforms,
}

impl CatalogEntry {
    /// Language code, if present and non-empty.
    pub fn language_code(&self) -> Option<&str> {
        self.iso.as_deref().filter(|iso| !iso.trim().is_empty())
    }

    /// All filesets across every platform, in catalog order.
    pub fn all_filesets(&self) -> impl Iterator<Item = &Fileset> {
        self.filesets.iter().flat_map(|(_, filesets)| filesets.iter())
    }
}

/// Platform name -> filesets, in the order the catalog lists them.
///
/// Decoding is lenient: anything other than an object (`[]`, `null`, a
/// string) is an empty set, a platform whose value is not a list hosts no
/// filesets, and list elements that are not objects are dropped.
#[derive(Debug, Clone, Default)]
pub struct Platforms(Vec<(String, Vec<Fileset>)>);

impl Platforms {
    /// Append a platform, merging into an existing one of the same name.
    pub fn insert(&mut self, platform: impl Into<String>, filesets: Vec<Fileset>) {
        let platform = platform.into();
        match self.0.iter_mut().find(|(name, _)| *name == platform) {
            Some((_, existing)) => existing.extend(filesets),
            None => self.0.push((platform, filesets)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Fileset])> {
        self.0.iter().map(|(name, filesets)| (name.as_str(), filesets.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Platforms {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, filesets) in &self.0 {
            map.serialize_entry(name, filesets)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Platforms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PlatformsVisitor)
    }
}

struct PlatformsVisitor;

impl<'de> Visitor<'de> for PlatformsVisitor {
    type Value = Platforms;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of platform names to fileset lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Platforms, A::Error> {
        let mut platforms = Platforms::default();
        while let Some(name) = map.next_key::<String>()? {
            let filesets = match map.next_value::<Lenient<Vec<Lenient<Fileset>>>>()? {
                Lenient::Valid(list) => list
                    .into_iter()
                    .filter_map(|slot| match slot {
                        Lenient::Valid(fileset) => Some(fileset),
                        Lenient::Malformed(_) => None,
                    })
                    .collect(),
                Lenient::Malformed(_) => Vec::new(),
            };
            platforms.insert(name, filesets);
        }
        Ok(platforms)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Platforms, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Platforms::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Platforms, E> {
        Ok(Platforms::default())
    }
}

/// One downloadable representation of a work.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Fileset {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub codec: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bitrate: Option<String>,
}

impl Fileset {
    /// Identifier, if present and non-empty.
    pub fn fileset_id(&self) -> Option<FilesetId> {
        self.id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(FilesetId::from)
    }

    pub fn declared_type(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    pub fn size_code(&self) -> &str {
        self.size.as_deref().unwrap_or("")
    }

    pub fn content_kind(&self) -> ContentKind {
        ContentKind::from_declared_type(self.declared_type())
    }
}

/// Broad content class derived from a fileset's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Audio,
    Text,
    Other,
}

impl ContentKind {
    pub fn from_declared_type(declared: &str) -> Self {
        if AUDIO_TYPES.contains(&declared) {
            Self::Audio
        } else if declared.starts_with("text") {
            Self::Text
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Text => "text",
            Self::Other => "other",
        }
    }
}

/// Accept a string, a number or null where the catalog is inconsistent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
