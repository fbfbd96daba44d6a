//! Entity synchronization between a drainage network backend and a globe viewer.
//!
//! Network records (junctions, outfalls, conduits, subcatchments) are turned
//! into keyed viewer entities by the [`registry::EntityRegistry`]; conduit
//! lines and subcatchment outlet connectors are derived from live point
//! positions by [`geometry`]; [`interaction::InteractionController`] maps
//! clicks and drags to the shared [`selection`]; and
//! [`sync::SyncOrchestrator`] rebuilds everything from the
//! [`api::NetworkApi`] in dependency order.

pub mod api;
pub mod config;
pub mod definition;
pub mod error;
pub mod geometry;
pub mod http;
pub mod id;
pub mod interaction;
pub mod locate;
pub mod notify;
pub mod records;
pub mod registry;
pub mod selection;
pub mod sync;

pub use error::*;
pub use id::*;
