//! Layer-based box placement on pallets.
//!
//! Boxes are expanded into units, ordered by size class and placed greedily
//! onto horizontal layers. A box only rests on a layer above the floor when
//! enough of its footprint sits on boxes ending at exactly that height.

pub mod api;
pub mod config;
pub mod geometry;
pub mod grouping;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod search;
pub mod support;
pub mod types;
