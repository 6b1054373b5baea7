//! The structured parse of a hotel search query.
//!
//! Every parse producer must emit exactly this shape. Decoding from producer
//! output goes through [`ParsedQuery::from_json_strict`], which rejects
//! unknown fields, and [`ParsedQuery::validate`], which rejects out-of-range
//! values. Missing fields fall back to their zero value.

use crate::error::{ParseEvalError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Calendar format for check-in/check-out dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Check-in and check-out dates, ISO formatted or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dates {
    pub checkin: String,
    pub checkout: String,
}

/// Guest counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Guests {
    pub adults: u32,
    pub children: u32,
}

/// The closed set of UI filter categories a parse can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterCategory {
    Meals,
    Ratings,
    HotelTypes,
    HotelFacilities,
    PoolBeach,
    DistanceBeach,
    TravelGroup,
    Stars,
    Wellness,
    ReferenceDistanceMax,
    Flex,
    Children,
    Parking,
    Freetime,
    Certifications,
    HotelThemes,
    HotelBrand,
    HotelInformation,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 18] = [
        FilterCategory::Meals,
        FilterCategory::Ratings,
        FilterCategory::HotelTypes,
        FilterCategory::HotelFacilities,
        FilterCategory::PoolBeach,
        FilterCategory::DistanceBeach,
        FilterCategory::TravelGroup,
        FilterCategory::Stars,
        FilterCategory::Wellness,
        FilterCategory::ReferenceDistanceMax,
        FilterCategory::Flex,
        FilterCategory::Children,
        FilterCategory::Parking,
        FilterCategory::Freetime,
        FilterCategory::Certifications,
        FilterCategory::HotelThemes,
        FilterCategory::HotelBrand,
        FilterCategory::HotelInformation,
    ];

    /// The JSON key of this category inside `ui_filters`.
    pub fn key(&self) -> &'static str {
        match self {
            FilterCategory::Meals => "meals",
            FilterCategory::Ratings => "ratings",
            FilterCategory::HotelTypes => "hotelTypes",
            FilterCategory::HotelFacilities => "hotelfacilities",
            FilterCategory::PoolBeach => "poolbeach",
            FilterCategory::DistanceBeach => "distanceBeach",
            FilterCategory::TravelGroup => "travelGroup",
            FilterCategory::Stars => "stars",
            FilterCategory::Wellness => "wellness",
            FilterCategory::ReferenceDistanceMax => "reference_distance_max",
            FilterCategory::Flex => "flex",
            FilterCategory::Children => "children",
            FilterCategory::Parking => "parking",
            FilterCategory::Freetime => "freetime",
            FilterCategory::Certifications => "certifications",
            FilterCategory::HotelThemes => "hotelthemes",
            FilterCategory::HotelBrand => "hotelBrand",
            FilterCategory::HotelInformation => "hotelinformation",
        }
    }
}

/// Tag lists per filter category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiFilters {
    #[serde(deserialize_with = "null_as_empty")]
    pub meals: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub ratings: Vec<String>,
    #[serde(rename = "hotelTypes", deserialize_with = "null_as_empty")]
    pub hotel_types: Vec<String>,
    #[serde(rename = "hotelfacilities", deserialize_with = "null_as_empty")]
    pub hotel_facilities: Vec<String>,
    #[serde(rename = "poolbeach", deserialize_with = "null_as_empty")]
    pub pool_beach: Vec<String>,
    #[serde(rename = "distanceBeach", deserialize_with = "null_as_empty")]
    pub distance_beach: Vec<String>,
    #[serde(rename = "travelGroup", deserialize_with = "null_as_empty")]
    pub travel_group: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub stars: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub wellness: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub reference_distance_max: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub flex: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub children: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub parking: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub freetime: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub certifications: Vec<String>,
    #[serde(rename = "hotelthemes", deserialize_with = "null_as_empty")]
    pub hotel_themes: Vec<String>,
    #[serde(rename = "hotelBrand", deserialize_with = "null_as_empty")]
    pub hotel_brand: Vec<String>,
    #[serde(rename = "hotelinformation", deserialize_with = "null_as_empty")]
    pub hotel_information: Vec<String>,
}

impl UiFilters {
    /// Tags recorded for one category.
    pub fn tags(&self, category: FilterCategory) -> &[String] {
        match category {
            FilterCategory::Meals => &self.meals,
            FilterCategory::Ratings => &self.ratings,
            FilterCategory::HotelTypes => &self.hotel_types,
            FilterCategory::HotelFacilities => &self.hotel_facilities,
            FilterCategory::PoolBeach => &self.pool_beach,
            FilterCategory::DistanceBeach => &self.distance_beach,
            FilterCategory::TravelGroup => &self.travel_group,
            FilterCategory::Stars => &self.stars,
            FilterCategory::Wellness => &self.wellness,
            FilterCategory::ReferenceDistanceMax => &self.reference_distance_max,
            FilterCategory::Flex => &self.flex,
            FilterCategory::Children => &self.children,
            FilterCategory::Parking => &self.parking,
            FilterCategory::Freetime => &self.freetime,
            FilterCategory::Certifications => &self.certifications,
            FilterCategory::HotelThemes => &self.hotel_themes,
            FilterCategory::HotelBrand => &self.hotel_brand,
            FilterCategory::HotelInformation => &self.hotel_information,
        }
    }
}

/// A structured parse of one search query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParsedQuery {
    pub location: String,
    pub dates: Dates,
    pub guests: Guests,
    /// Maximum price in EUR; 0 means unset.
    pub price_max_eur: f64,
    /// Minimum hotel stars, 0..=5.
    pub stars_min: u8,
    /// Minimum review rating, 0..=10.
    pub rating_min: f64,
    pub family_friendly: bool,
    pub ui_filters: UiFilters,
    /// Request text the schema cannot express, kept verbatim.
    #[serde(deserialize_with = "null_as_empty")]
    pub unsupported_criteria: Vec<String>,
}

impl ParsedQuery {
    /// Decode a producer's JSON object, rejecting fields outside the schema.
    pub fn from_json_strict(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ParseEvalError::SchemaViolation(e.to_string()))
    }

    /// Range checks that the type system does not already enforce.
    pub fn validate(&self) -> Result<()> {
        if self.stars_min > 5 {
            return Err(ParseEvalError::Validation(
                "stars_min must be 0..5".to_string(),
            ));
        }
        if !self.rating_min.is_finite() || !(0.0..=10.0).contains(&self.rating_min) {
            return Err(ParseEvalError::Validation(
                "rating_min must be 0..10".to_string(),
            ));
        }
        if !self.price_max_eur.is_finite() || self.price_max_eur < 0.0 {
            return Err(ParseEvalError::Validation(
                "price_max_eur cannot be negative".to_string(),
            ));
        }
        for (name, value) in [
            ("dates.checkin", &self.dates.checkin),
            ("dates.checkout", &self.dates.checkout),
        ] {
            if !value.is_empty() && NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() {
                return Err(ParseEvalError::Validation(format!(
                    "{} must be YYYY-MM-DD, got '{}'",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Producers sometimes emit `null` for an empty tag list.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
