//! Release quality codes to display labels.

/// Exact codes with a dedicated label.
const SCALAR_LABELS: &[(i64, &str)] = &[
    (100, "WEBDL 720p"),
    (101, "BDRip 720p"),
    (200, "WEBDL 1080p"),
    (201, "BDRip 1080p"),
    (202, "BDRip HEVC 1080p"),
    (203, "Remux 1080p"),
    (300, "WEBDL SDR 2160p"),
    (301, "WEBDL HDR 2160p"),
    (302, "WEBDL DV 2160p"),
    (303, "BDRip SDR 2160p"),
    (304, "BDRip HDR 2160p"),
    (305, "BDRip DV 2160p"),
    (306, "Remux SDR 2160p"),
    (307, "Remux HDR 2160p"),
    (308, "Remux DV 2160p"),
];

/// Inclusive ranges; `None` as the upper bound means unbounded.
const RANGE_LABELS: &[(i64, Option<i64>, &str)] = &[
    (0, Some(99), "SD"),
    (102, Some(199), "BDRip HEVC 720p"),
    (204, Some(299), "1080p"),
    (309, None, "2160p"),
];

/// Map a quality code to its label. Unknown codes give an empty string.
pub fn classify_quality(code: i64) -> &'static str {
    if let Some((_, label)) = SCALAR_LABELS.iter().find(|(c, _)| *c == code) {
        return label;
    }

    RANGE_LABELS
        .iter()
        .find(|(low, high, _)| code >= *low && high.is_none_or(|h| code <= h))
        .map(|(_, _, label)| *label)
        .unwrap_or("")
}

/// Label for the highest code in `codes`, or `None` when there are no codes
/// or the highest one has no label.
pub fn max_quality_label<I>(codes: I) -> Option<&'static str>
where
    I: IntoIterator<Item = i64>,
{
    let label = classify_quality(codes.into_iter().max()?);
    (!label.is_empty()).then_some(label)
}
