//!
//! src/assemble.rs
//!
//! Assembles whole responses from raw top-level payloads: the
//! page-scrape flow yields a batch of every entity the page carries,
//! the creation flow yields exactly one typed entity picked by the
//! `type` discriminator.
//!

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::errors::ApiError;
use crate::links::LinkPolicy;
use crate::model::{Artist, Entity, Response};
use crate::normalize;
use crate::platform::EntityType;

/// Per-shape link policies. Page payloads historically carry one
/// canonical link per platform; the creation API emits every record.
pub const PAGE_LINK_POLICY: LinkPolicy = LinkPolicy::FirstPerPlatform;
pub const CREATION_LINK_POLICY: LinkPolicy = LinkPolicy::AllRecords;

/// Normalizes every record of the page's `artists`/`albums`/`tracks`
/// id-keyed mappings unconditionally; a page about a single track
/// still carries its related artists and albums. Empty or missing
/// mappings produce empty sequences, never an error. Tracks and
/// albums referencing sibling artists by id get those artists
/// embedded by value.
pub fn page_response(state: &Value) -> Result<Response, ApiError> {
    let mut artists = Vec::new();
    let mut by_id: HashMap<i64, Artist> = HashMap::new();
    if let Some(map) = state.get("artists").and_then(Value::as_object) {
        for wrapper in map.values() {
            let artist = normalize::page_artist(wrapper, PAGE_LINK_POLICY)?;
            by_id.insert(artist.id, artist.clone());
            artists.push(artist);
        }
    }

    let mut albums = Vec::new();
    if let Some(map) = state.get("albums").and_then(Value::as_object) {
        for wrapper in map.values() {
            let (mut album, artist_ids) = normalize::page_album(wrapper, PAGE_LINK_POLICY)?;
            album.artists = resolve_artists(&by_id, &artist_ids);
            albums.push(album);
        }
    }

    let mut tracks = Vec::new();
    if let Some(map) = state.get("tracks").and_then(Value::as_object) {
        for wrapper in map.values() {
            let (mut track, artist_ids) = normalize::page_track(wrapper, PAGE_LINK_POLICY)?;
            track.artists = resolve_artists(&by_id, &artist_ids);
            tracks.push(track);
        }
    }

    Ok(Response { artists, albums, tracks })
}

/// Sibling references the page does not carry records for are skipped.
fn resolve_artists(by_id: &HashMap<i64, Artist>, ids: &[i64]) -> Vec<Artist> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        match by_id.get(id) {
            Some(artist) => resolved.push(artist.clone()),
            None => debug!(artist_id = id, "assemble.artist.unresolved"),
        }
    }
    resolved
}

/// Dispatches a creation payload to exactly one entity decoder. A
/// discriminator outside {artist, album, track} is the upstream's way
/// of saying it could not resolve the submitted URL, so it maps to
/// not-found rather than a parse failure.
pub fn creation_entity(payload: &Value) -> Result<Entity, ApiError> {
    let tag = payload
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ApiError::Malformed { field: "type", entity: None })?;

    match EntityType::parse(tag) {
        Some(EntityType::Artist) => Ok(Entity::Artist(normalize::creation_artist(
            payload,
            CREATION_LINK_POLICY,
        )?)),
        Some(EntityType::Album) => Ok(Entity::Album(normalize::creation_album(
            payload,
            CREATION_LINK_POLICY,
        )?)),
        Some(EntityType::Track) => Ok(Entity::Track(normalize::creation_track(
            payload,
            CREATION_LINK_POLICY,
        )?)),
        None => Err(ApiError::NotFound(format!("unknown entity type `{tag}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_state_fixture() -> Value {
        json!({
            "artists": {
                "103": {
                    "value": {
                        "type": "artist",
                        "id": 103,
                        "path": "kero-kero-bonito",
                        "name": "Kero Kero Bonito",
                        "sourceCountry": "GB",
                        "createdAtTimestamp": 1565193600000_i64,
                        "links": {"spotify": [{"link": "https://open.spotify.com/artist/4kla"}]}
                    },
                    "isPartial": false
                }
            },
            "albums": {
                "71": {
                    "value": {
                        "type": "album",
                        "id": 71,
                        "path": "bonito-generation",
                        "name": "Bonito Generation",
                        "sourceCountry": "GB",
                        "createdAtTimestamp": 1565193600000_i64,
                        "artistIds": [103]
                    },
                    "isPartial": true
                }
            },
            "tracks": {
                "9000": {
                    "value": {
                        "type": "track",
                        "id": 9000,
                        "path": "flamingo",
                        "name": "Flamingo",
                        "sourceCountry": "GB",
                        "createdAtTimestamp": 1565193600000_i64,
                        "artistIds": [103, 999]
                    },
                    "isPartial": false
                }
            }
        })
    }

    #[test]
    fn page_response_normalizes_all_three_mappings() {
        let response = page_response(&page_state_fixture()).unwrap();
        assert_eq!(response.artists.len(), 1);
        assert_eq!(response.albums.len(), 1);
        assert_eq!(response.tracks.len(), 1);
        assert_eq!(response.tracks[0].name, "Flamingo");
    }

    #[test]
    fn sibling_artist_ids_resolve_to_embedded_values() {
        let response = page_response(&page_state_fixture()).unwrap();
        let album = &response.albums[0];
        assert_eq!(album.artists.len(), 1);
        assert_eq!(album.artists[0].id, 103);
        // id 999 has no sibling record and is skipped
        let track = &response.tracks[0];
        assert_eq!(track.artists.len(), 1);
        assert_eq!(track.artists[0].name, "Kero Kero Bonito");
    }

    #[test]
    fn empty_mappings_yield_empty_response_not_failure() {
        let state = json!({"artists": {}, "albums": {}, "tracks": {}});
        let response = page_response(&state).unwrap();
        assert!(response.artists.is_empty());
        assert!(response.albums.is_empty());
        assert!(response.tracks.is_empty());

        // missing mappings behave the same
        let response = page_response(&json!({})).unwrap();
        assert_eq!(response, Response::default());
    }

    #[test]
    fn malformed_page_record_fails_the_batch() {
        let mut state = page_state_fixture();
        state["tracks"]["9000"]["value"]
            .as_object_mut()
            .unwrap()
            .remove("sourceCountry");
        let err = page_response(&state).unwrap_err();
        assert!(matches!(err, ApiError::Malformed { field: "sourceCountry", .. }));
    }

    #[test]
    fn creation_dispatch_returns_one_typed_entity() {
        let payload = json!({
            "type": "artist",
            "id": 103,
            "path": "kero-kero-bonito",
            "name": "Kero Kero Bonito",
            "url": "https://songwhip.com/kero-kero-bonito",
            "sourceUrl": "https://open.spotify.com/artist/4kla",
            "sourceCountry": "GB",
            "createdAt": "2019-08-07T16:00:00Z"
        });
        let entity = creation_entity(&payload).unwrap();
        assert_eq!(entity.kind(), EntityType::Artist);
        assert_eq!(entity.name(), "Kero Kero Bonito");
        match entity {
            Entity::Artist(artist) => assert_eq!(artist.id, 103),
            other => panic!("expected artist, got {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminator_is_not_found_with_404() {
        let payload = json!({"type": "playlist", "id": 1});
        let err = creation_entity(&payload).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn missing_discriminator_is_a_payload_shape_failure() {
        let err = creation_entity(&json!({"id": 1})).unwrap_err();
        assert!(matches!(err, ApiError::Malformed { field: "type", .. }));
    }
}
