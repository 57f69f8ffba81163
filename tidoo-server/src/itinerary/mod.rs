//! Active itinerary state and route optimization.

mod clock;
mod error;
mod optimizer;
mod session;

pub use clock::{Clock, SystemClock};
pub use error::RouteError;
pub use optimizer::{OptimizationOutcome, build_request, optimize, reconcile};
pub use session::{ItinerarySession, RequestTag};

#[cfg(test)]
pub(crate) use clock::ManualClock;
