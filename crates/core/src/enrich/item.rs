//! Raw catalog entries awaiting enrichment.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::media::{CacheKey, MediaKind};

/// Why a catalog entry was skipped.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("malformed catalog item: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("neither `media_type` nor `type` names a known kind")]
    MissingKind,
}

/// One torrent attached to a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TorrentEntry {
    #[serde(default, deserialize_with = "lenient_int")]
    pub quality: Option<i64>,
}

/// A raw `items` entry.
///
/// Only `id` and the kind are required. Optional fields holding an
/// unexpected type are treated as absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawItem")]
pub struct CatalogItem {
    pub id: u64,
    pub media_type: MediaKind,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub torrents: Vec<TorrentEntry>,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(deserialize_with = "deserialize_id")]
    id: u64,
    #[serde(default)]
    media_type: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    first_air_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    last_air_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_torrents")]
    torrents: Vec<TorrentEntry>,
}

impl TryFrom<RawItem> for CatalogItem {
    type Error = ItemError;

    fn try_from(raw: RawItem) -> Result<Self, Self::Error> {
        // `media_type` wins; `type` is only consulted when it is unusable.
        let media_type = [raw.media_type, raw.kind]
            .into_iter()
            .flatten()
            .find_map(|v| MediaKind::deserialize(v).ok())
            .ok_or(ItemError::MissingKind)?;

        Ok(Self {
            id: raw.id,
            media_type,
            release_date: raw.release_date,
            first_air_date: raw.first_air_date,
            last_air_date: raw.last_air_date,
            torrents: raw.torrents,
        })
    }
}

impl CatalogItem {
    pub fn from_value(value: &Value) -> Result<Self, ItemError> {
        Ok(Self::deserialize(value)?)
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::from_unsigned(self.media_type, self.id)
    }

    /// Quality codes present on the item's torrents.
    pub fn quality_codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.torrents.iter().filter_map(|t| t.quality)
    }
}

/// Ids arrive as integers or numeric strings; negatives are rejected.
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Int(id) => u64::try_from(id)
            .map_err(|_| de::Error::custom(format!("negative id {}", id))),
        RawId::Text(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("non-numeric id {:?}", text))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_i64())
}

/// `null` or a non-array counts as no torrents; unreadable entries are skipped.
fn lenient_torrents<'de, D>(deserializer: D) -> Result<Vec<TorrentEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| TorrentEntry::deserialize(entry).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_movie_item() {
        let item = CatalogItem::from_value(&json!({
            "id": 603,
            "media_type": "movie",
            "release_date": "31.03.1999",
            "torrents": [{"quality": 200}, {"quality": 305}, {"size": 1}]
        }))
        .unwrap();

        assert_eq!(item.key(), CacheKey::new(MediaKind::Movie, 603).unwrap());
        assert_eq!(item.quality_codes().collect::<Vec<_>>(), vec![200, 305]);
    }

    #[test]
    fn test_accepts_string_id_and_type_alias() {
        let item = CatalogItem::from_value(&json!({"id": "1396", "type": "tv"})).unwrap();
        assert_eq!(item.id, 1396);
        assert_eq!(item.media_type, MediaKind::Series);
    }

    #[test]
    fn test_unexpected_optional_fields_are_ignored() {
        let item = CatalogItem::from_value(&json!({
            "id": 7,
            "media_type": "movie",
            "release_date": 1999,
            "first_air_date": null,
            "torrents": [{"quality": "1080p"}, {"quality": 305}, 42, {"quality": 2.5}]
        }))
        .unwrap();
        assert_eq!(item.release_date, None);
        assert_eq!(item.first_air_date, None);
        assert_eq!(item.quality_codes().collect::<Vec<_>>(), vec![305]);

        for torrents in [json!(null), json!("none"), json!({"quality": 200})] {
            let item = CatalogItem::from_value(&json!({
                "id": 7,
                "media_type": "movie",
                "torrents": torrents
            }))
            .unwrap();
            assert!(item.torrents.is_empty());
        }
    }

    #[test]
    fn test_media_type_wins_over_type() {
        let item =
            CatalogItem::from_value(&json!({"id": 1, "media_type": "movie", "type": "tv"}))
                .unwrap();
        assert_eq!(item.media_type, MediaKind::Movie);

        let item =
            CatalogItem::from_value(&json!({"id": 1, "media_type": null, "type": "tv"}))
                .unwrap();
        assert_eq!(item.media_type, MediaKind::Series);

        let item =
            CatalogItem::from_value(&json!({"id": 1, "media_type": "podcast", "type": "movie"}))
                .unwrap();
        assert_eq!(item.media_type, MediaKind::Movie);
    }

    #[test]
    fn test_rejects_malformed_items() {
        for value in [
            json!({"media_type": "movie"}),
            json!({"id": 5}),
            json!({"id": -5, "media_type": "movie"}),
            json!({"id": "abc", "media_type": "movie"}),
            json!({"id": 5, "media_type": "podcast"}),
            json!({"id": null, "media_type": "movie"}),
            json!({"id": 5, "media_type": null, "type": 3}),
            json!("just a string"),
        ] {
            assert!(CatalogItem::from_value(&value).is_err(), "{}", value);
        }
    }
}
