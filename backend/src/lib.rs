//! # Planner Heatmap
//!
//! Interval coverage heatmap engine for the production planner.
//!
//! Jobs in a sheet-metal fabrication workspace carry one date range per
//! process stage. This crate counts, for every day of a window, how many of
//! those ranges are active, lays the days out on a calendar grid and colours
//! each day through a five-stop gradient. A poller keeps the result current
//! and an HTTP server publishes it.
//!
//! ## Features
//!
//! - **Ingestion**: Parse the planner's job map, per-stage or single range
//! - **Aggregation**: Difference-array daily coverage counts
//! - **Layout**: Week-column grid or twelve month blocks, Sunday or Monday start
//! - **Colour**: Smoothstep-eased gradient with legend
//! - **Polling**: Single-flight change detection over a job source
//! - **HTTP API**: JSON view, painted HTML fragment, view preferences
//!
//! ## Architecture
//!
//! - [`models`]: Calendar utilities, job records, intervals and windows
//! - [`services`]: Aggregation, colour, layout, pipeline, poller, sources, preferences
//! - [`render`]: Paint adapter and the HTML surface
//! - [`config`]: TOML + environment configuration
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`api`]: Flat re-exports of the public types

#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
