//! Media identity and the pure formatting helpers used when projecting
//! catalog entries.

mod date;
mod key;
mod quality;

pub use date::normalize_date;
pub use key::{CacheKey, KeyError, MediaKind};
pub use quality::{classify_quality, max_quality_label};
