//! trek-core - Core library for Trek
//!
//! This crate contains the shared models, remote API client, shared caches,
//! credential access, and the optimistic packing-list synchronizer used by
//! Trek front-ends.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod sync;

pub use error::{Error, Result};
pub use models::{ItemKey, PackingItem, PackingList, Trip, TripId};
