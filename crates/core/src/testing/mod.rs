//! Testing utilities and mock implementations.
//!
//! The mocks stand in for the upstream metadata API and the catalog
//! directory so pipeline behaviour can be exercised without network or disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use marquee_core::testing::{fixtures, MockMetadataSource};
//! use marquee_core::media::{CacheKey, MediaKind};
//!
//! let source = MockMetadataSource::new();
//! let key = CacheKey::from_unsigned(MediaKind::Movie, 550);
//! source.add_record(key, fixtures::movie_record(550, "Fight Club")).await;
//! source.fail_key(CacheKey::from_unsigned(MediaKind::Movie, 551)).await;
//! ```

mod mock_catalog_store;
mod mock_metadata_source;

pub use mock_catalog_store::MemoryCatalogStore;
pub use mock_metadata_source::MockMetadataSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::upstream::UpstreamRecord;

    /// An upstream movie record with the fields the projection reads.
    pub fn movie_record(id: u64, title: &str) -> UpstreamRecord {
        record(json!({
            "id": id,
            "title": title,
            "original_title": title,
            "overview": format!("{title} overview"),
            "poster_path": format!("/poster_{id}.jpg"),
            "backdrop_path": format!("/backdrop_{id}.jpg"),
            "vote_average": 7.5,
            "release_date": "2020-01-15",
        }))
    }

    /// An upstream TV record with two seasons.
    pub fn tv_record(id: u64, name: &str) -> UpstreamRecord {
        record(json!({
            "id": id,
            "name": name,
            "original_name": name,
            "overview": format!("{name} overview"),
            "poster_path": format!("/poster_{id}.jpg"),
            "backdrop_path": null,
            "vote_average": 8.1,
            "first_air_date": "2019-03-01",
            "last_air_date": "2021-05-20",
            "number_of_seasons": 2,
            "seasons": [
                {"season_number": 1, "episode_count": 8},
                {"season_number": 2, "episode_count": 10},
            ],
        }))
    }

    /// A catalog entry for a movie with one 1080p torrent.
    pub fn movie_item(id: u64) -> Value {
        json!({
            "id": id,
            "media_type": "movie",
            "release_date": "15.01.2020",
            "torrents": [{"quality": 200}],
        })
    }

    /// A catalog entry for a series using the legacy `type` field.
    pub fn tv_item(id: u64) -> Value {
        json!({
            "id": id,
            "type": "tv",
            "torrents": [{"quality": 101}, {"quality": 305}],
        })
    }

    /// An `items` catalog document holding the given entries.
    pub fn items_document(items: Vec<Value>) -> Value {
        json!({ "items": items })
    }

    fn record(value: Value) -> UpstreamRecord {
        match value {
            Value::Object(map) => UpstreamRecord::from(map),
            _ => unreachable!("fixture records are objects"),
        }
    }
}
