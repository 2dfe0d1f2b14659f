//!
//! src/links.rs
//!
//! Converts the raw per-platform links mapping of an entity record
//! into canonical Link values. Platforms missing from the registry
//! are dropped, never surfaced as errors: the upstream adds services
//! faster than this client learns their names.
//!

use serde_json::Value;
use tracing::debug;

use crate::model::Link;
use crate::platform::PlatformName;

/// Literal placeholder the upstream leaves in country-scoped links.
pub const COUNTRY_PLACEHOLDER: &str = "{country}";

/// The two link-extraction policies observed across upstream API
/// revisions. Page-scrape payloads historically carried one canonical
/// link per platform (the first record); the creation API emits every
/// record. Each decoder names its policy explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    FirstPerPlatform,
    AllRecords,
}

/// Flattens a `platform -> [records]` mapping into Links. Emission
/// order follows the mapping's own key order with unregistered
/// platforms removed; duplicates are kept. Never fails: records
/// without a string `link` are skipped and malformed optional
/// sub-fields default to absent.
pub fn normalize_links(raw: Option<&Value>, source_country: &str, policy: LinkPolicy) -> Vec<Link> {
    let Some(map) = raw.and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (key, records) in map {
        let Some(platform) = PlatformName::parse(key) else {
            debug!(platform = %key, "link.platform.unsupported");
            continue;
        };
        let Some(records) = records.as_array() else {
            continue;
        };
        let kept = match policy {
            LinkPolicy::FirstPerPlatform => &records[..records.len().min(1)],
            LinkPolicy::AllRecords => &records[..],
        };
        for record in kept {
            let Some(link) = record.get("link").and_then(Value::as_str) else {
                continue;
            };
            let link = if link.contains(COUNTRY_PLACEHOLDER) {
                link.replace(COUNTRY_PLACEHOLDER, source_country)
            } else {
                link.to_string()
            };
            out.push(Link {
                platform,
                link,
                countries: country_list(record.get("countries")),
            });
        }
    }
    out
}

fn country_list(raw: Option<&Value>) -> Option<Vec<String>> {
    let list = raw?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unregistered_platforms_are_dropped_silently() {
        let raw = json!({
            "spotify": [{"link": "https://open.spotify.com/artist/x"}],
            "myspace": [{"link": "https://myspace.com/x"}],
            "deezer": [{"link": "https://deezer.com/artist/1"}]
        });
        let links = normalize_links(Some(&raw), "GB", LinkPolicy::AllRecords);
        assert_eq!(links.len(), 2);
        for link in &links {
            assert!(PlatformName::is_supported(link.platform.as_str()));
        }
    }

    #[test]
    fn order_follows_the_input_mapping() {
        let raw = json!({
            "tidal": [{"link": "https://tidal.com/1"}],
            "spotify": [{"link": "https://open.spotify.com/1"}],
            "bandcamp": [{"link": "https://x.bandcamp.com"}]
        });
        let links = normalize_links(Some(&raw), "GB", LinkPolicy::AllRecords);
        let order: Vec<_> = links.iter().map(|l| l.platform).collect();
        assert_eq!(
            order,
            vec![PlatformName::Tidal, PlatformName::Spotify, PlatformName::Bandcamp]
        );
    }

    #[test]
    fn country_placeholder_is_substituted() {
        let raw = json!({
            "itunes": [{"link": "https://music.apple.com/{country}/album/9"}]
        });
        let links = normalize_links(Some(&raw), "jp", LinkPolicy::FirstPerPlatform);
        assert_eq!(links[0].link, "https://music.apple.com/jp/album/9");
        assert!(!links[0].link.contains(COUNTRY_PLACEHOLDER));
    }

    #[test]
    fn first_per_platform_keeps_only_the_head_record() {
        let raw = json!({
            "youtube": [
                {"link": "https://youtube.com/watch?v=a"},
                {"link": "https://youtube.com/watch?v=b"}
            ]
        });
        let first = normalize_links(Some(&raw), "US", LinkPolicy::FirstPerPlatform);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].link, "https://youtube.com/watch?v=a");

        let all = normalize_links(Some(&raw), "US", LinkPolicy::AllRecords);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn countries_default_to_absent() {
        let raw = json!({
            "qobuz": [{"link": "https://qobuz.com/x"}],
            "napster": [{"link": "https://napster.com/x", "countries": ["US", "CA"]}]
        });
        let links = normalize_links(Some(&raw), "US", LinkPolicy::AllRecords);
        assert_eq!(links[0].countries, None);
        assert_eq!(
            links[1].countries,
            Some(vec!["US".to_string(), "CA".to_string()])
        );
    }

    #[test]
    fn records_without_a_link_are_skipped_not_errors() {
        let raw = json!({
            "spotify": [{"countries": ["US"]}, {"link": "https://open.spotify.com/2"}]
        });
        let links = normalize_links(Some(&raw), "US", LinkPolicy::AllRecords);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link, "https://open.spotify.com/2");
    }

    #[test]
    fn missing_or_non_object_input_yields_empty() {
        assert!(normalize_links(None, "US", LinkPolicy::AllRecords).is_empty());
        let raw = json!([1, 2, 3]);
        assert!(normalize_links(Some(&raw), "US", LinkPolicy::AllRecords).is_empty());
    }
}
