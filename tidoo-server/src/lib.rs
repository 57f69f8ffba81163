//! Itinerary planner server.
//!
//! Collects places of interest into an ordered itinerary and asks a
//! routing provider for the best order to visit them in.

pub mod cache;
pub mod config;
pub mod domain;
pub mod itinerary;
pub mod provider;
pub mod store;
pub mod web;
