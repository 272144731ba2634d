//! Routing table implementation.

mod routing_table;
#[cfg(feature = "sync")]
mod sync;

pub use routing_table::{Insertion, Lookup, RoutingTable};
#[cfg(feature = "sync")]
pub use sync::SyncRoutingTable;
