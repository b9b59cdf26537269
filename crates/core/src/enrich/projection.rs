//! Catalog entry + upstream record -> response item.

use serde::Serialize;
use serde_json::Value;

use super::CatalogItem;
use crate::media::{max_quality_label, normalize_date, MediaKind};
use crate::upstream::UpstreamRecord;

/// A catalog entry merged with its upstream record.
///
/// The common fields are always emitted (as `null` when upstream lacks
/// them); kind-specific fields only for their kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedItem {
    pub id: u64,
    pub media_type: MediaKind,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub backdrop_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_air_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_quality: Option<String>,
}

/// Merge `item` with `record`.
pub fn project(item: &CatalogItem, record: &UpstreamRecord) -> EnrichedItem {
    let text = |field: &str| record.str_field(field).map(str::to_string);

    let mut enriched = EnrichedItem {
        id: item.id,
        media_type: item.media_type,
        poster_path: text("poster_path"),
        overview: text("overview"),
        vote_average: record.f64_field("vote_average"),
        backdrop_path: text("backdrop_path"),
        title: None,
        original_title: None,
        release_date: None,
        name: None,
        original_name: None,
        first_air_date: None,
        last_air_date: None,
        number_of_seasons: None,
        seasons: None,
        release_quality: max_quality_label(item.quality_codes()).map(str::to_string),
    };

    match item.media_type {
        MediaKind::Movie => {
            enriched.title = text("title");
            enriched.original_title = text("original_title");
            enriched.release_date = prefer_date(&[
                item.release_date.as_deref(),
                record.str_field("release_date"),
            ]);
        }
        MediaKind::Series => {
            enriched.name = text("name");
            enriched.original_name = text("original_name");
            enriched.first_air_date = prefer_date(&[
                item.first_air_date.as_deref(),
                item.release_date.as_deref(),
                record.str_field("first_air_date"),
            ]);
            enriched.last_air_date = prefer_date(&[
                item.last_air_date.as_deref(),
                record.str_field("last_air_date"),
            ]);
            enriched.number_of_seasons = record.u64_field("number_of_seasons");
            enriched.seasons = record.get("seasons").cloned();
        }
    }

    enriched
}

/// First non-empty candidate, normalized.
fn prefer_date(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .find(|d| !d.trim().is_empty())
        .map(|d| normalize_date(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> CatalogItem {
        CatalogItem::from_value(&value).unwrap()
    }

    fn record(value: Value) -> UpstreamRecord {
        UpstreamRecord::from_value(value).unwrap()
    }

    #[test]
    fn test_movie_prefers_catalog_release_date() {
        let enriched = project(
            &item(json!({"id": 603, "media_type": "movie", "release_date": "31.03.1999"})),
            &record(json!({
                "title": "Матрица",
                "original_title": "The Matrix",
                "release_date": "1999-03-30",
                "poster_path": "/p.jpg",
                "overview": "...",
                "vote_average": 8.2,
                "backdrop_path": "/b.jpg"
            })),
        );

        assert_eq!(enriched.title.as_deref(), Some("Матрица"));
        assert_eq!(enriched.original_title.as_deref(), Some("The Matrix"));
        assert_eq!(enriched.release_date.as_deref(), Some("1999-03-31"));
        assert_eq!(enriched.vote_average, Some(8.2));
        assert!(enriched.name.is_none());
        assert!(enriched.release_quality.is_none());
    }

    #[test]
    fn test_movie_falls_back_to_upstream_date() {
        let enriched = project(
            &item(json!({"id": 1, "media_type": "movie", "release_date": ""})),
            &record(json!({"release_date": "2001-09-14"})),
        );
        assert_eq!(enriched.release_date.as_deref(), Some("2001-09-14"));
    }

    #[test]
    fn test_series_fields() {
        let enriched = project(
            &item(json!({
                "id": 1396,
                "media_type": "tv",
                "release_date": "20.01.2008",
                "torrents": [{"quality": 100}, {"quality": 203}]
            })),
            &record(json!({
                "name": "Во все тяжкие",
                "original_name": "Breaking Bad",
                "first_air_date": "2008-01-19",
                "last_air_date": "2013-09-29",
                "number_of_seasons": 5,
                "seasons": [{"season_number": 1}]
            })),
        );

        assert_eq!(enriched.original_name.as_deref(), Some("Breaking Bad"));
        assert_eq!(enriched.first_air_date.as_deref(), Some("2008-01-20"));
        assert_eq!(enriched.last_air_date.as_deref(), Some("2013-09-29"));
        assert_eq!(enriched.number_of_seasons, Some(5));
        assert_eq!(enriched.seasons, Some(json!([{"season_number": 1}])));
        assert_eq!(enriched.release_quality.as_deref(), Some("Remux 1080p"));
        assert!(enriched.title.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let enriched = project(
            &item(json!({"id": 9, "media_type": "movie"})),
            &record(json!({"title": "Nine"})),
        );
        let value = serde_json::to_value(&enriched).unwrap();

        assert_eq!(value["media_type"], "movie");
        assert_eq!(value["poster_path"], Value::Null);
        assert!(value.as_object().unwrap().contains_key("overview"));
        assert!(!value.as_object().unwrap().contains_key("name"));
        assert!(!value.as_object().unwrap().contains_key("release_quality"));
    }
}
