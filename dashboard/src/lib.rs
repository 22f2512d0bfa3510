//! Headless herd dashboard.
//!
//! Polls the telemetry API on a fixed cadence and keeps a map (geofence
//! overlay plus one marker per animal), a summary table and an alert feed in
//! sync with the server.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod map;
pub mod markers;
pub mod metrics;
pub mod model;
pub mod poll;
pub mod render;
pub mod rest;
pub mod session;
