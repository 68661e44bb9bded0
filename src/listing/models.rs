use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

use crate::shared::new_object_id;

/// Implements the string mapping shared by every listing enum:
/// `as_str`, `Display` and `TryFrom<&str>` over the same table.
macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = String;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(s.to_string()),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Apartment,
    IndependentHouse,
    Villa,
    Studio,
    Penthouse,
    Duplex,
}

labelled_enum!(PropertyType {
    Apartment => "apartment",
    IndependentHouse => "independentHouse",
    Villa => "villa",
    Studio => "studio",
    Penthouse => "penthouse",
    Duplex => "duplex",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum Furnishing {
    #[default]
    No,
    Semi,
    Full,
}

labelled_enum!(Furnishing {
    No => "no",
    Semi => "semi",
    Full => "full",
});

/// Bedroom/bathroom count label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum RoomCount {
    #[serde(rename = "1RK")]
    OneRk,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "5+")]
    FivePlus,
}

labelled_enum!(RoomCount {
    OneRk => "1RK",
    One => "1",
    Two => "2",
    Three => "3",
    Four => "4",
    Five => "5",
    FivePlus => "5+",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum Facing {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

labelled_enum!(Facing {
    North => "north",
    South => "south",
    East => "east",
    West => "west",
    NorthEast => "northEast",
    NorthWest => "northWest",
    SouthEast => "southEast",
    SouthWest => "southWest",
});

/// Validated listing content, everything the client controls
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetails {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub available: bool,
    pub images: Vec<String>,
    pub property_type: PropertyType,
    pub furnishing: Furnishing,
    pub bachelors_allowed: bool,
    pub car_parking: bool,
    pub car_parking_count: Option<i64>,
    pub bedrooms: RoomCount,
    pub bathrooms: RoomCount,
    pub built_up_area_sq_ft: f64,
    pub carpet_area_sq_ft: Option<f64>,
    pub total_floors: Option<i32>,
    pub floor_number: Option<i32>,
    pub age_of_property: Option<i32>,
    pub facing: Option<Facing>,
}

/// Stored listing record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingModel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub available: bool,
    pub images: Vec<String>,
    pub property_type: PropertyType,
    pub furnishing: Furnishing,
    pub bachelors_allowed: bool,
    pub car_parking: bool,
    pub car_parking_count: Option<i64>,
    pub bedrooms: RoomCount,
    pub bathrooms: RoomCount,
    pub built_up_area_sq_ft: f64,
    pub carpet_area_sq_ft: Option<f64>,
    pub total_floors: Option<i32>,
    pub floor_number: Option<i32>,
    pub age_of_property: Option<i32>,
    pub facing: Option<Facing>,
    pub slug: String, // Set once at creation
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingModel {
    /// Creates a new listing with generated ID and timestamps
    pub fn new(details: ListingDetails, slug: String) -> Self {
        let now = Utc::now();
        let ListingDetails {
            title,
            description,
            location,
            price,
            available,
            images,
            property_type,
            furnishing,
            bachelors_allowed,
            car_parking,
            car_parking_count,
            bedrooms,
            bathrooms,
            built_up_area_sq_ft,
            carpet_area_sq_ft,
            total_floors,
            floor_number,
            age_of_property,
            facing,
        } = details;

        Self {
            id: new_object_id(),
            title,
            description,
            location,
            price,
            available,
            images,
            property_type,
            furnishing,
            bachelors_allowed,
            car_parking,
            car_parking_count,
            bedrooms,
            bathrooms,
            built_up_area_sq_ft,
            carpet_area_sq_ft,
            total_floors,
            floor_number,
            age_of_property,
            facing,
            slug,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full-document replacement; id, slug and createdAt are untouched
    pub fn replace_details(&mut self, details: ListingDetails) {
        self.title = details.title;
        self.description = details.description;
        self.location = details.location;
        self.price = details.price;
        self.available = details.available;
        self.images = details.images;
        self.property_type = details.property_type;
        self.furnishing = details.furnishing;
        self.bachelors_allowed = details.bachelors_allowed;
        self.car_parking = details.car_parking;
        self.car_parking_count = details.car_parking_count;
        self.bedrooms = details.bedrooms;
        self.bathrooms = details.bathrooms;
        self.built_up_area_sq_ft = details.built_up_area_sq_ft;
        self.carpet_area_sq_ft = details.carpet_area_sq_ft;
        self.total_floors = details.total_floors;
        self.floor_number = details.floor_number;
        self.age_of_property = details.age_of_property;
        self.facing = details.facing;
        self.updated_at = Utc::now();
    }
}
