//!
//! src/model.rs
//!
//! Canonical entity types produced by the normalization layer.
//! Immutable value objects: built once per fetch, never mutated,
//! never persisted by this crate.
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{EntityType, PlatformName};

/// One outbound link on an entity, already validated against the
/// platform registry and with any `{country}` placeholder resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub platform: PlatformName,
    pub link: String,
    pub countries: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: i64,
    pub path: String,
    pub page_path: Option<String>,
    pub name: String,
    pub url: Option<String>,
    pub source_url: Option<String>,
    pub source_country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub links: Vec<Link>,
    pub links_countries: Option<Vec<String>>,
    pub description: Option<String>,
    pub spotify_id: Option<String>,
    /// Page-scrape payloads flag records fetched as a byproduct of
    /// another entity and not yet fully hydrated.
    pub is_partial: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: i64,
    pub path: String,
    pub page_path: Option<String>,
    pub name: String,
    pub url: Option<String>,
    pub source_url: Option<String>,
    pub source_country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub links: Vec<Link>,
    pub links_countries: Option<Vec<String>>,
    /// Absent from page-scrape records; the creation decoder requires it.
    pub release_date: Option<DateTime<Utc>>,
    pub upc: Option<String>,
    pub is_explicit: Option<bool>,
    pub spotify_id: Option<String>,
    /// Owned snapshot of the credited artists, no back-references.
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: i64,
    pub path: String,
    pub page_path: Option<String>,
    pub name: String,
    pub url: Option<String>,
    pub source_url: Option<String>,
    pub source_country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub links: Vec<Link>,
    pub links_countries: Option<Vec<String>>,
    /// Absent from page-scrape records; the creation decoder requires it.
    pub release_date: Option<DateTime<Utc>>,
    pub isrc: Option<String>,
    pub is_explicit: Option<bool>,
    /// Owned snapshot of the credited artists, no back-references.
    pub artists: Vec<Artist>,
}

/// Single-entity result of the creation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Artist(Artist),
    Album(Album),
    Track(Track),
}

impl Entity {
    pub fn kind(&self) -> EntityType {
        match self {
            Entity::Artist(_) => EntityType::Artist,
            Entity::Album(_)  => EntityType::Album,
            Entity::Track(_)  => EntityType::Track,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Artist(a) => &a.name,
            Entity::Album(a)  => &a.name,
            Entity::Track(t)  => &t.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Entity::Artist(a) => &a.path,
            Entity::Album(a)  => &a.path,
            Entity::Track(t)  => &t.path,
        }
    }
}

/// Batch result of the page-scrape flow. A page payload carries every
/// entity the page references, keyed by internal id upstream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}
