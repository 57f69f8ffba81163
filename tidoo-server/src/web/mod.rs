//! Web layer for the itinerary planner.
//!
//! A JSON API over the active itinerary, place search, saved itineraries
//! and API key onboarding.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, KeySource, Places, StartupError};
