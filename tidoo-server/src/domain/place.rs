//! Place types.
//!
//! A `Place` is a point of interest as returned by the place provider.
//! Once fetched it is treated as read-only; the itinerary only ever
//! replaces a place wholesale with a richer copy of the same id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted length of a place id.
const MAX_PLACE_ID_LEN: usize = 256;

/// Error returned when parsing an invalid place id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid place id: {reason}")]
pub struct InvalidPlaceId {
    reason: &'static str,
}

/// A provider place identifier.
///
/// Place ids are non-empty strings of ASCII letters, digits, `-` and `_`.
/// Restricting the alphabet keeps ids safe to use as file names in the
/// on-disk store.
///
/// # Examples
///
/// ```
/// use tidoo_server::domain::PlaceId;
///
/// let id = PlaceId::parse("ChIJN1t_tDeuEmsRUsoyG83frY4").unwrap();
/// assert_eq!(id.as_str(), "ChIJN1t_tDeuEmsRUsoyG83frY4");
///
/// assert!(PlaceId::parse("").is_err());
/// assert!(PlaceId::parse("../etc/passwd").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaceId(String);

impl PlaceId {
    /// Parse a place id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidPlaceId> {
        if s.is_empty() {
            return Err(InvalidPlaceId {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_PLACE_ID_LEN {
            return Err(InvalidPlaceId {
                reason: "must be at most 256 characters",
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(InvalidPlaceId {
                reason: "must contain only ASCII letters, digits, '-' or '_'",
            });
        }

        Ok(PlaceId(s.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlaceId {
    type Error = InvalidPlaceId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PlaceId::parse(&value)
    }
}

impl From<PlaceId> for String {
    fn from(id: PlaceId) -> Self {
        id.0
    }
}

impl fmt::Debug for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlaceId({})", self.0)
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when a coordinate is out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate ({latitude}, {longitude}): {reason}")]
pub struct InvalidCoordinate {
    latitude: f64,
    longitude: f64,
    reason: &'static str,
}

/// A WGS84 coordinate.
///
/// Deserialization applies the same range checks as [`LatLng::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLatLng")]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// Unchecked wire form of a coordinate.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLatLng {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawLatLng> for LatLng {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawLatLng) -> Result<Self, Self::Error> {
        LatLng::new(raw.latitude, raw.longitude)
    }
}

impl LatLng {
    /// Construct a coordinate, validating ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinate {
                latitude,
                longitude,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Text with an optional language tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl LocalizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language_code: None,
        }
    }
}

/// Attribution for a photo or review author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAttribution {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_uri: Option<String>,
}

/// A photo reference. `name` is the provider resource name used to fetch media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePhoto {
    pub name: String,
    #[serde(default)]
    pub width_px: u32,
    #[serde(default)]
    pub height_px: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author_attributions: Vec<AuthorAttribution>,
}

/// Regular opening hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weekday_descriptions: Vec<String>,
}

/// A user review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceReview {
    pub author_attribution: AuthorAttribution,
    pub rating: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<LocalizedText>,
    #[serde(default)]
    pub relative_publish_time_description: String,
}

/// A point of interest.
///
/// Field names follow the provider's wire format so that provider
/// responses deserialize directly into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub display_name: LocalizedText,
    #[serde(default)]
    pub formatted_address: String,
    pub location: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type_display_name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<PlacePhoto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_opening_hours: Option<OpeningHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editorial_summary: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<PlaceReview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_uri: Option<String>,
}

impl Place {
    /// Create a place with only the required summary fields.
    pub fn new(id: PlaceId, name: impl Into<String>, location: LatLng) -> Self {
        Self {
            id,
            display_name: LocalizedText::new(name),
            formatted_address: String::new(),
            location,
            rating: None,
            user_rating_count: None,
            primary_type: None,
            primary_type_display_name: None,
            photos: Vec::new(),
            regular_opening_hours: None,
            editorial_summary: None,
            national_phone_number: None,
            website_uri: None,
            price_level: None,
            reviews: Vec::new(),
            google_maps_uri: None,
        }
    }

    /// Set the formatted address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = address.into();
        self
    }

    /// Set the rating.
    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Display name text.
    pub fn name(&self) -> &str {
        &self.display_name.text
    }
}

/// An autocomplete prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub place_id: PlaceId,
    pub text: String,
    pub main_text: Option<String>,
    pub secondary_text: Option<String>,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Roundtrip: parse then as_str returns the original
        #[test]
        fn roundtrip(s in "[A-Za-z0-9_-]{1,64}") {
            let id = PlaceId::parse(&s).unwrap();
            prop_assert_eq!(id.as_str(), s.as_str());
        }

        /// Any character outside the id alphabet is rejected
        #[test]
        fn foreign_characters_rejected(prefix in "[A-Za-z0-9]{0,8}", c in "[ ./\\\\:#?]", suffix in "[A-Za-z0-9]{0,8}") {
            let s = format!("{prefix}{c}{suffix}");
            prop_assert!(PlaceId::parse(&s).is_err());
        }
    }
}
