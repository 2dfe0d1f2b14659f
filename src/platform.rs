//!
//! src/platform.rs
//!
//! Closed enumerations for the platform identifiers and entity kinds
//! the upstream service emits. The platform set is the whitelist the
//! link normalizer filters against; the upstream grows faster than
//! this list, so unknown names are dropped rather than erroring.
//!

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlatformName {
    Deezer,
    Tidal,
    ItunesStore,
    Spotify,
    Twitter,
    Itunes,
    Youtube,
    YoutubeMusic,
    Facebook,
    Instagram,
    MusicBrainz,
    Wikipedia,
    Discogs,
    Qobuz,
    Pandora,
    Amazon,
    AmazonMusic,
    Napster,
    Audius,
    Audiomack,
    Gaana,
    Tiktok,
    LineMusic,
    Bandcamp,
    JioSaavn,
    Soundcloud,
}

pub const ALL_PLATFORMS: [PlatformName; 26] = [
    PlatformName::Deezer,
    PlatformName::Tidal,
    PlatformName::ItunesStore,
    PlatformName::Spotify,
    PlatformName::Twitter,
    PlatformName::Itunes,
    PlatformName::Youtube,
    PlatformName::YoutubeMusic,
    PlatformName::Facebook,
    PlatformName::Instagram,
    PlatformName::MusicBrainz,
    PlatformName::Wikipedia,
    PlatformName::Discogs,
    PlatformName::Qobuz,
    PlatformName::Pandora,
    PlatformName::Amazon,
    PlatformName::AmazonMusic,
    PlatformName::Napster,
    PlatformName::Audius,
    PlatformName::Audiomack,
    PlatformName::Gaana,
    PlatformName::Tiktok,
    PlatformName::LineMusic,
    PlatformName::Bandcamp,
    PlatformName::JioSaavn,
    PlatformName::Soundcloud,
];

impl PlatformName {
    /// Upstream spelling of the platform key.
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformName::Deezer       => "deezer",
            PlatformName::Tidal        => "tidal",
            PlatformName::ItunesStore  => "itunesStore",
            PlatformName::Spotify      => "spotify",
            PlatformName::Twitter      => "twitter",
            PlatformName::Itunes       => "itunes",
            PlatformName::Youtube      => "youtube",
            PlatformName::YoutubeMusic => "youtubeMusic",
            PlatformName::Facebook     => "facebook",
            PlatformName::Instagram    => "instagram",
            PlatformName::MusicBrainz  => "musicBrainz",
            PlatformName::Wikipedia    => "wikipedia",
            PlatformName::Discogs      => "discogs",
            PlatformName::Qobuz        => "qobuz",
            PlatformName::Pandora      => "pandora",
            PlatformName::Amazon       => "amazon",
            PlatformName::AmazonMusic  => "amazonMusic",
            PlatformName::Napster      => "napster",
            PlatformName::Audius       => "audius",
            PlatformName::Audiomack    => "audiomack",
            PlatformName::Gaana        => "gaana",
            PlatformName::Tiktok       => "tiktok",
            PlatformName::LineMusic    => "lineMusic",
            PlatformName::Bandcamp     => "bandcamp",
            PlatformName::JioSaavn     => "jioSaavn",
            PlatformName::Soundcloud   => "soundcloud",
        }
    }

    /// Membership test against the registry; unknown names yield None.
    pub fn parse(s: &str) -> Option<PlatformName> {
        match s {
            "deezer"       => Some(PlatformName::Deezer),
            "tidal"        => Some(PlatformName::Tidal),
            "itunesStore"  => Some(PlatformName::ItunesStore),
            "spotify"      => Some(PlatformName::Spotify),
            "twitter"      => Some(PlatformName::Twitter),
            "itunes"       => Some(PlatformName::Itunes),
            "youtube"      => Some(PlatformName::Youtube),
            "youtubeMusic" => Some(PlatformName::YoutubeMusic),
            "facebook"     => Some(PlatformName::Facebook),
            "instagram"    => Some(PlatformName::Instagram),
            "musicBrainz"  => Some(PlatformName::MusicBrainz),
            "wikipedia"    => Some(PlatformName::Wikipedia),
            "discogs"      => Some(PlatformName::Discogs),
            "qobuz"        => Some(PlatformName::Qobuz),
            "pandora"      => Some(PlatformName::Pandora),
            "amazon"       => Some(PlatformName::Amazon),
            "amazonMusic"  => Some(PlatformName::AmazonMusic),
            "napster"      => Some(PlatformName::Napster),
            "audius"       => Some(PlatformName::Audius),
            "audiomack"    => Some(PlatformName::Audiomack),
            "gaana"        => Some(PlatformName::Gaana),
            "tiktok"       => Some(PlatformName::Tiktok),
            "lineMusic"    => Some(PlatformName::LineMusic),
            "bandcamp"     => Some(PlatformName::Bandcamp),
            "jioSaavn"     => Some(PlatformName::JioSaavn),
            "soundcloud"   => Some(PlatformName::Soundcloud),
            _ => None,
        }
    }

    pub fn all() -> &'static [PlatformName] {
        &ALL_PLATFORMS
    }

    pub fn is_supported(s: &str) -> bool {
        PlatformName::parse(s).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Artist,
    Album,
    Track,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Artist => "artist",
            EntityType::Album  => "album",
            EntityType::Track  => "track",
        }
    }

    pub fn parse(s: &str) -> Option<EntityType> {
        match s {
            "artist" => Some(EntityType::Artist),
            "album"  => Some(EntityType::Album),
            "track"  => Some(EntityType::Track),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_platform() {
        for platform in PlatformName::all() {
            assert_eq!(PlatformName::parse(platform.as_str()), Some(*platform));
        }
    }

    #[test]
    fn unknown_platforms_are_unsupported() {
        assert!(!PlatformName::is_supported("myspace"));
        assert!(!PlatformName::is_supported(""));
        assert!(!PlatformName::is_supported("Spotify")); // case matters upstream
        assert!(PlatformName::is_supported("itunesStore"));
    }

    #[test]
    fn platform_serde_uses_upstream_spelling() {
        let json = serde_json::to_string(&PlatformName::YoutubeMusic).unwrap();
        assert_eq!(json, "\"youtubeMusic\"");
        let back: PlatformName = serde_json::from_str("\"jioSaavn\"").unwrap();
        assert_eq!(back, PlatformName::JioSaavn);
    }

    #[test]
    fn entity_type_round_trip() {
        for kind in [EntityType::Artist, EntityType::Album, EntityType::Track] {
            assert_eq!(EntityType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityType::parse("playlist"), None);
    }
}
