//! Search parameters accepted by place providers.

use serde::{Deserialize, Serialize};

use crate::domain::LatLng;

/// Default number of results requested from searches.
pub const DEFAULT_MAX_RESULTS: u8 = 20;

/// Location bias radius for text search (meters).
pub const SEARCH_BIAS_RADIUS_M: f64 = 10_000.0;

/// Default nearby search radius (meters).
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 5_000.0;

/// Location bias radius for autocomplete (meters).
pub const AUTOCOMPLETE_BIAS_RADIUS_M: f64 = 20_000.0;

/// Minimum input length before autocomplete queries the provider.
pub const AUTOCOMPLETE_MIN_INPUT: usize = 2;

/// Result ranking for text search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankPreference {
    #[default]
    Relevance,
    Distance,
}

/// A free-text place search around a location.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
    pub text: String,
    pub location: LatLng,
    pub included_type: Option<String>,
    pub open_now: bool,
    /// Results rated below this are dropped after the search.
    pub min_rating: Option<f32>,
    pub max_result_count: u8,
    pub rank_preference: RankPreference,
}

impl PlaceQuery {
    pub fn new(text: impl Into<String>, location: LatLng) -> Self {
        Self {
            text: text.into(),
            location,
            included_type: None,
            open_now: false,
            min_rating: None,
            max_result_count: DEFAULT_MAX_RESULTS,
            rank_preference: RankPreference::default(),
        }
    }

    pub fn with_type(mut self, included_type: impl Into<String>) -> Self {
        self.included_type = Some(included_type.into());
        self
    }

    pub fn with_open_now(mut self, open_now: bool) -> Self {
        self.open_now = open_now;
        self
    }

    pub fn with_min_rating(mut self, min_rating: f32) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn with_rank_preference(mut self, rank: RankPreference) -> Self {
        self.rank_preference = rank;
        self
    }

    /// Whether a result passes the client-side rating filter.
    ///
    /// Unrated places are dropped when a minimum is set.
    pub fn accepts_rating(&self, rating: Option<f32>) -> bool {
        match self.min_rating {
            Some(min) => rating.is_some_and(|r| r >= min),
            None => true,
        }
    }
}

/// A search for places within a radius.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub location: LatLng,
    pub radius_meters: f64,
    pub included_types: Vec<String>,
    pub max_result_count: u8,
}

impl NearbyQuery {
    pub fn new(location: LatLng) -> Self {
        Self {
            location,
            radius_meters: DEFAULT_NEARBY_RADIUS_M,
            included_types: Vec::new(),
            max_result_count: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_radius(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.included_types = types;
        self
    }
}
