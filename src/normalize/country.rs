/// Placeholder for a missing or unrecognizable country.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Upper-cased codes and aliases mapped to one canonical country name.
static COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("USA", "United States"),
    ("U.S", "United States"),
    ("U.S.", "United States"),
    ("U.S.A.", "United States"),
    ("UNITED STATES OF AMERICA", "United States"),
    ("UK", "United Kingdom"),
    ("U.K.", "United Kingdom"),
    ("GB", "United Kingdom"),
    ("GBR", "United Kingdom"),
    ("GREAT BRITAIN", "United Kingdom"),
    ("ENGLAND", "United Kingdom"),
    ("SCOTLAND", "United Kingdom"),
    ("CN", "China"),
    ("CHN", "China"),
    ("PRC", "China"),
    ("P.R. CHINA", "China"),
    ("PEOPLE'S REPUBLIC OF CHINA", "China"),
    ("HK", "China"),
    ("HONG KONG", "China"),
    ("HONG KONG SAR", "China"),
    ("MO", "China"),
    ("MACAU", "China"),
    ("MACAO", "China"),
    ("MACAU SAR", "China"),
    ("KR", "South Korea"),
    ("KOR", "South Korea"),
    ("KOREA", "South Korea"),
    ("REPUBLIC OF KOREA", "South Korea"),
    ("KOREA, REPUBLIC OF", "South Korea"),
    ("DE", "Germany"),
    ("DEU", "Germany"),
    ("FR", "France"),
    ("FRA", "France"),
    ("CA", "Canada"),
    ("CAN", "Canada"),
    ("SG", "Singapore"),
    ("SGP", "Singapore"),
    ("AU", "Australia"),
    ("AUS", "Australia"),
    ("JP", "Japan"),
    ("JPN", "Japan"),
    ("IN", "India"),
    ("IND", "India"),
    ("ES", "Spain"),
    ("ESP", "Spain"),
    ("SE", "Sweden"),
    ("SWE", "Sweden"),
    ("NL", "Netherlands"),
    ("NLD", "Netherlands"),
    ("THE NETHERLANDS", "Netherlands"),
    ("BR", "Brazil"),
    ("BRA", "Brazil"),
    ("CH", "Switzerland"),
    ("CHE", "Switzerland"),
    ("IT", "Italy"),
    ("ITA", "Italy"),
    ("IL", "Israel"),
    ("ISR", "Israel"),
    ("TW", "Taiwan"),
    ("TWN", "Taiwan"),
];

/// Values that carry no country information.
static EMPTY_MARKERS: &[&str] = &["", "UNKNOWN", "N/A", "NA", "NONE", "NULL", "-"];

/// Institution-name substrings (lower-cased) that pin the institution's
/// country regardless of what the person record claims.
static INSTITUTION_COUNTRY_OVERRIDES: &[(&str, &str)] = &[
    ("bytedance", "China"),
    ("harbin institute of technology", "China"),
    ("tsinghua university", "China"),
    ("peking university", "China"),
    ("chinese academy of sciences", "China"),
    ("korea advanced institute of science and technology", "South Korea"),
];

/// Maps country codes and common aliases to one canonical name.
///
/// Unmapped values pass through trimmed; empty or placeholder values become
/// [`UNKNOWN_COUNTRY`].
pub fn normalize_country(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_COUNTRY.to_string();
    };
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let upper = trimmed.to_uppercase();

    if EMPTY_MARKERS.contains(&upper.as_str()) {
        return UNKNOWN_COUNTRY.to_string();
    }

    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(trimmed)
}

/// Returns the pinned country for an institution name, if any.
pub fn institution_country_override(institution: &str) -> Option<&'static str> {
    let lower = institution.to_lowercase();
    INSTITUTION_COUNTRY_OVERRIDES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, country)| *country)
}

pub(crate) fn is_known(country: &str) -> bool {
    country != UNKNOWN_COUNTRY
}
