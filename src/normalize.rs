//!
//! src/normalize.rs
//!
//! Shape-specific decoders mapping raw upstream records onto the
//! canonical entity schema. Two families exist because the upstream
//! emits two incompatible shapes: the page-scrape shape (records
//! wrapped in `{value, isPartial}` with epoch-millisecond timestamps)
//! and the creation-API shape (bare records with ISO-8601 timestamps
//! and inline nested artists). Each family produces the same canonical
//! types; there is no single decoder branching on field presence.
//!

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::errors::ApiError;
use crate::links::{LinkPolicy, normalize_links};
use crate::model::{Album, Artist, Track};
use crate::platform::EntityType;

// ---------------------------------------------------------------------------
// field extraction
// ---------------------------------------------------------------------------

/// Best-effort identity of a record for error messages.
fn record_label(record: &Value) -> Option<String> {
    let id = record.get("id").and_then(Value::as_i64);
    let path = record.get("path").and_then(Value::as_str);
    if id.is_none() && path.is_none() {
        return None;
    }
    let id = id.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string());
    Some(format!("id={} path={}", id, path.unwrap_or("?")))
}

fn missing(field: &'static str, record: &Value) -> ApiError {
    ApiError::Malformed {
        field,
        entity: record_label(record),
    }
}

fn require_str<'a>(record: &'a Value, field: &'static str) -> Result<&'a str, ApiError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(field, record))
}

fn require_i64(record: &Value, field: &'static str) -> Result<i64, ApiError> {
    record
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| missing(field, record))
}

fn require_entity_type(record: &Value) -> Result<EntityType, ApiError> {
    require_str(record, "type")
        .ok()
        .and_then(EntityType::parse)
        .ok_or_else(|| missing("type", record))
}

fn opt_string(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn opt_bool(record: &Value, field: &str) -> Option<bool> {
    record.get(field).and_then(Value::as_bool)
}

fn opt_string_list(record: &Value, field: &str) -> Option<Vec<String>> {
    let list = record.get(field)?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

fn id_list(record: &Value, field: &str) -> Vec<i64> {
    record
        .get(field)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// timestamps
// ---------------------------------------------------------------------------

/// Page-scrape timestamps are epoch milliseconds.
fn require_millis(record: &Value, field: &'static str) -> Result<DateTime<Utc>, ApiError> {
    record
        .get(field)
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| missing(field, record))
}

fn opt_millis(record: &Value, field: &str) -> Option<DateTime<Utc>> {
    record
        .get(field)
        .and_then(Value::as_i64)
        .and_then(DateTime::from_timestamp_millis)
}

/// Creation-API timestamps arrive as RFC 3339, as naive datetimes, or
/// as bare dates (release dates); all normalize to UTC.
pub(crate) fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(nd.and_time(NaiveTime::MIN).and_utc());
    }
    None
}

fn require_iso(record: &Value, field: &'static str) -> Result<DateTime<Utc>, ApiError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .and_then(parse_iso)
        .ok_or_else(|| missing(field, record))
}

fn opt_iso(record: &Value, field: &str) -> Option<DateTime<Utc>> {
    record.get(field).and_then(Value::as_str).and_then(parse_iso)
}

// ---------------------------------------------------------------------------
// page-scrape decoders
// ---------------------------------------------------------------------------

/// Unwraps the `{value, isPartial}` envelope page records live in.
fn page_value(wrapper: &Value) -> Result<&Value, ApiError> {
    wrapper.get("value").ok_or_else(|| missing("value", wrapper))
}

pub fn page_artist(wrapper: &Value, policy: LinkPolicy) -> Result<Artist, ApiError> {
    let value = page_value(wrapper)?;
    let source_country = require_str(value, "sourceCountry")?.to_string();
    Ok(Artist {
        entity_type: require_entity_type(value)?,
        id: require_i64(value, "id")?,
        path: require_str(value, "path")?.to_string(),
        page_path: opt_string(value, "pagePath"),
        name: require_str(value, "name")?.to_string(),
        url: None,
        source_url: None,
        created_at: require_millis(value, "createdAtTimestamp")?,
        updated_at: opt_millis(value, "refreshedAtTimestamp"),
        image: opt_string(value, "image"),
        links: normalize_links(value.get("links"), &source_country, policy),
        links_countries: opt_string_list(value, "linksCountries"),
        description: opt_string(value, "description"),
        spotify_id: opt_string(value, "spotifyId"),
        is_partial: opt_bool(wrapper, "isPartial"),
        source_country,
    })
}

/// Returns the album plus the sibling-artist ids it references; the
/// assembler resolves those against the page's artists mapping.
pub fn page_album(wrapper: &Value, policy: LinkPolicy) -> Result<(Album, Vec<i64>), ApiError> {
    let value = page_value(wrapper)?;
    let source_country = require_str(value, "sourceCountry")?.to_string();
    let album = Album {
        entity_type: require_entity_type(value)?,
        id: require_i64(value, "id")?,
        path: require_str(value, "path")?.to_string(),
        page_path: opt_string(value, "pagePath"),
        name: require_str(value, "name")?.to_string(),
        url: None,
        source_url: None,
        created_at: require_millis(value, "createdAtTimestamp")?,
        updated_at: opt_millis(value, "refreshedAtTimestamp"),
        image: opt_string(value, "image"),
        links: normalize_links(value.get("links"), &source_country, policy),
        links_countries: opt_string_list(value, "linksCountries"),
        release_date: None,
        upc: None,
        is_explicit: None,
        spotify_id: opt_string(value, "spotifyId"),
        artists: Vec::new(),
        source_country,
    };
    Ok((album, id_list(value, "artistIds")))
}

pub fn page_track(wrapper: &Value, policy: LinkPolicy) -> Result<(Track, Vec<i64>), ApiError> {
    let value = page_value(wrapper)?;
    let source_country = require_str(value, "sourceCountry")?.to_string();
    let track = Track {
        entity_type: require_entity_type(value)?,
        id: require_i64(value, "id")?,
        path: require_str(value, "path")?.to_string(),
        page_path: opt_string(value, "pagePath"),
        name: require_str(value, "name")?.to_string(),
        url: None,
        source_url: None,
        created_at: require_millis(value, "createdAtTimestamp")?,
        updated_at: opt_millis(value, "refreshedAtTimestamp"),
        image: opt_string(value, "image"),
        links: normalize_links(value.get("links"), &source_country, policy),
        links_countries: opt_string_list(value, "linksCountries"),
        release_date: None,
        isrc: None,
        is_explicit: None,
        artists: Vec::new(),
        source_country,
    };
    Ok((track, id_list(value, "artistIds")))
}

// ---------------------------------------------------------------------------
// creation-API decoders
// ---------------------------------------------------------------------------

pub fn creation_artist(record: &Value, policy: LinkPolicy) -> Result<Artist, ApiError> {
    let source_country = require_str(record, "sourceCountry")?.to_string();
    Ok(Artist {
        entity_type: EntityType::Artist,
        id: require_i64(record, "id")?,
        path: require_str(record, "path")?.to_string(),
        page_path: opt_string(record, "pagePath"),
        name: require_str(record, "name")?.to_string(),
        url: Some(require_str(record, "url")?.to_string()),
        source_url: Some(require_str(record, "sourceUrl")?.to_string()),
        created_at: require_iso(record, "createdAt")?,
        updated_at: opt_iso(record, "updatedAt"),
        image: opt_string(record, "image"),
        links: normalize_links(record.get("links"), &source_country, policy),
        links_countries: opt_string_list(record, "linksCountries"),
        description: opt_string(record, "description"),
        spotify_id: opt_string(record, "spotifyId"),
        is_partial: None,
        source_country,
    })
}

pub fn creation_album(record: &Value, policy: LinkPolicy) -> Result<Album, ApiError> {
    let source_country = require_str(record, "sourceCountry")?.to_string();
    Ok(Album {
        entity_type: EntityType::Album,
        id: require_i64(record, "id")?,
        path: require_str(record, "path")?.to_string(),
        page_path: opt_string(record, "pagePath"),
        name: require_str(record, "name")?.to_string(),
        url: Some(require_str(record, "url")?.to_string()),
        source_url: Some(require_str(record, "sourceUrl")?.to_string()),
        created_at: require_iso(record, "createdAt")?,
        updated_at: opt_iso(record, "updatedAt"),
        image: opt_string(record, "image"),
        links: normalize_links(record.get("links"), &source_country, policy),
        links_countries: opt_string_list(record, "linksCountries"),
        release_date: Some(require_iso(record, "releaseDate")?),
        upc: opt_string(record, "upc"),
        is_explicit: opt_bool(record, "isExplicit"),
        spotify_id: opt_string(record, "spotifyId"),
        artists: nested_artists(record, policy)?,
        source_country,
    })
}

pub fn creation_track(record: &Value, policy: LinkPolicy) -> Result<Track, ApiError> {
    let source_country = require_str(record, "sourceCountry")?.to_string();
    Ok(Track {
        entity_type: EntityType::Track,
        id: require_i64(record, "id")?,
        path: require_str(record, "path")?.to_string(),
        page_path: opt_string(record, "pagePath"),
        name: require_str(record, "name")?.to_string(),
        url: Some(require_str(record, "url")?.to_string()),
        source_url: Some(require_str(record, "sourceUrl")?.to_string()),
        created_at: require_iso(record, "createdAt")?,
        updated_at: opt_iso(record, "updatedAt"),
        image: opt_string(record, "image"),
        links: normalize_links(record.get("links"), &source_country, policy),
        links_countries: opt_string_list(record, "linksCountries"),
        release_date: Some(require_iso(record, "releaseDate")?),
        isrc: opt_string(record, "isrc"),
        is_explicit: opt_bool(record, "isExplicit"),
        artists: nested_artists(record, policy)?,
        source_country,
    })
}

/// Inline nested artist records; each passes full artist validation.
/// Cycles are impossible by construction: artists never embed tracks
/// or albums.
fn nested_artists(record: &Value, policy: LinkPolicy) -> Result<Vec<Artist>, ApiError> {
    record
        .get("artists")
        .and_then(Value::as_array)
        .map(|artists| {
            artists
                .iter()
                .map(|a| creation_artist(a, policy))
                .collect()
        })
        .unwrap_or_else(|| Ok(Vec::new()))
}
