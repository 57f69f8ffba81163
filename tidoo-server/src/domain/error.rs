//! Domain error types.
//!
//! These errors represent validation failures of itinerary edits and
//! stored records. They are distinct from provider and IO errors.

use super::PlaceId;

/// Domain-level errors for itinerary validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItineraryError {
    /// A reorder request is not a permutation of the current stops
    #[error("invalid reorder: {0}")]
    InvalidReorder(String),

    /// A provider waypoint order is not a permutation of the intermediates
    #[error("invalid optimized waypoint order: expected a permutation of 0..{expected}")]
    InvalidWaypointOrder { expected: usize },

    /// Stop order values are not dense and 0-based
    #[error("stop at position {position} has order {order}")]
    OrderMismatch { position: usize, order: usize },

    /// The same place appears twice
    #[error("place {0} appears more than once")]
    DuplicatePlace(PlaceId),
}
