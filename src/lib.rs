//!
//! rs-songwhip
//!
//! Client for the songwhip music-link service: resolves content URLs
//! to canonical Artist/Album/Track entities and normalizes the
//! service's heterogeneous payload shapes into one typed schema.
//!

pub mod assemble;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod links;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod platform;

pub use client::SongWhip;
pub use config::{ClientConfig, load_config};
pub use errors::ApiError;
pub use links::LinkPolicy;
pub use model::{Album, Artist, Entity, Link, Response, Track};
pub use platform::{EntityType, PlatformName};
