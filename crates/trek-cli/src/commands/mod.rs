pub mod auth_cmd;
pub mod collab;
pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod invites;
pub mod notifications;
pub mod pack;
pub mod trips;
