use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use super::models::{Facing, Furnishing, ListingDetails, ListingModel, PropertyType, RoomCount};
use crate::shared::AppError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Order in which validation messages are reported
const FIELD_ORDER: &[&str] = &[
    "title",
    "description",
    "location",
    "price",
    "available",
    "images",
    "propertyType",
    "furnishing",
    "facing",
    "bachelorsAllowed",
    "carParking",
    "carParkingCount",
    "builtUpAreaSqFt",
    "carpetAreaSqFt",
    "totalFloors",
    "floorNumber",
    "ageOfProperty",
    "bedrooms",
    "bathrooms",
];

/// Create/update request body for a listing.
///
/// Every field is optional and read through `ListingBody`, so missing or
/// mistyped values are reported together with every other violated rule.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(from = "ListingBody")]
pub struct ListingInput {
    #[validate(
        required(message = "Title is required."),
        length(min = 3, max = 80, message = "Title must be between 3 and 80 characters.")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Description is required."),
        length(
            min = 10,
            max = 1000,
            message = "Description must be between 10 and 1000 characters."
        )
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "Location is required."),
        length(min = 2, max = 50, message = "Location must be between 2 and 50 characters.")
    )]
    pub location: Option<String>,

    #[validate(
        required(message = "Price is required."),
        range(exclusive_min = 0.0, message = "Price must be a positive number.")
    )]
    pub price: Option<f64>,

    pub available: Option<bool>,

    #[validate(
        required(message = "Images are required."),
        length(min = 1, message = "At least one image is required.")
    )]
    pub images: Option<Vec<String>>,

    pub property_type: Option<String>,
    pub furnishing: Option<String>,
    pub facing: Option<String>,
    pub bachelors_allowed: Option<bool>,
    pub car_parking: Option<bool>,

    #[validate(range(min = 0, message = "Car parking count cannot be negative."))]
    pub car_parking_count: Option<i64>,

    #[validate(
        required(message = "Built-up area is required."),
        range(min = 100.0, message = "Built-up area must be at least 100 sq ft.")
    )]
    pub built_up_area_sq_ft: Option<f64>,

    #[validate(range(min = 50.0, message = "Carpet area must be at least 50 sq ft."))]
    pub carpet_area_sq_ft: Option<f64>,

    #[validate(range(min = 1, message = "There must be at least 1 floor."))]
    pub total_floors: Option<i32>,

    #[validate(range(min = 0, message = "Floor number must be zero or more."))]
    pub floor_number: Option<i32>,

    #[validate(range(min = 0, message = "Age must be zero or more."))]
    pub age_of_property: Option<i32>,

    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,

    /// `(field, message)` for values whose JSON type was wrong
    pub(crate) type_errors: Vec<(&'static str, &'static str)>,
}

/// Listing body as received: each field kept as raw JSON
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingBody {
    title: Option<Value>,
    description: Option<Value>,
    location: Option<Value>,
    price: Option<Value>,
    available: Option<Value>,
    images: Option<Value>,
    property_type: Option<Value>,
    furnishing: Option<Value>,
    facing: Option<Value>,
    bachelors_allowed: Option<Value>,
    car_parking: Option<Value>,
    car_parking_count: Option<Value>,
    built_up_area_sq_ft: Option<Value>,
    carpet_area_sq_ft: Option<Value>,
    total_floors: Option<Value>,
    floor_number: Option<Value>,
    age_of_property: Option<Value>,
    bedrooms: Option<Value>,
    bathrooms: Option<Value>,
}

/// Typed reads over raw JSON; numeric and boolean strings are accepted
#[derive(Default)]
struct TypeCheck {
    errors: Vec<(&'static str, &'static str)>,
}

impl TypeCheck {
    fn reject<T>(&mut self, field: &'static str, message: &'static str) -> Option<T> {
        self.errors.push((field, message));
        None
    }

    fn string(
        &mut self,
        field: &'static str,
        value: Option<Value>,
        message: &'static str,
    ) -> Option<String> {
        match value? {
            Value::String(value) => Some(value),
            _ => self.reject(field, message),
        }
    }

    fn number(
        &mut self,
        field: &'static str,
        value: Option<Value>,
        message: &'static str,
    ) -> Option<f64> {
        let parsed = match value? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed.filter(|number| number.is_finite()) {
            Some(number) => Some(number),
            None => self.reject(field, message),
        }
    }

    fn whole<T: TryFrom<i64>>(
        &mut self,
        field: &'static str,
        value: Option<Value>,
        message: &'static str,
    ) -> Option<T> {
        let number = self.number(field, value, message)?;
        if number.fract() == 0.0 {
            if let Ok(whole) = T::try_from(number as i64) {
                return Some(whole);
            }
        }
        self.reject(field, message)
    }

    fn boolean(
        &mut self,
        field: &'static str,
        value: Option<Value>,
        message: &'static str,
    ) -> Option<bool> {
        match value? {
            Value::Bool(flag) => Some(flag),
            Value::String(text) if text == "true" => Some(true),
            Value::String(text) if text == "false" => Some(false),
            _ => self.reject(field, message),
        }
    }

    fn images(&mut self, value: Option<Value>) -> Option<Vec<String>> {
        match value? {
            Value::Array(items) => {
                let urls: Option<Vec<String>> = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(url) => Some(url),
                        _ => None,
                    })
                    .collect();
                match urls {
                    Some(urls) => Some(urls),
                    None => self.reject("images", "Each image must be a valid URL."),
                }
            }
            _ => self.reject("images", "Images must be an array of URLs."),
        }
    }
}

impl From<ListingBody> for ListingInput {
    fn from(body: ListingBody) -> Self {
        let mut check = TypeCheck::default();

        let title = check.string("title", body.title, "Title must be a string.");
        let description =
            check.string("description", body.description, "Description must be a string.");
        let location = check.string("location", body.location, "Location must be a string.");
        let price = check.number("price", body.price, "Price must be a number.");
        let available =
            check.boolean("available", body.available, "Available must be true or false.");
        let images = check.images(body.images);
        let property_type = check.string(
            "propertyType",
            body.property_type,
            "Property type must be a string.",
        );
        let furnishing =
            check.string("furnishing", body.furnishing, "Furnishing must be a string.");
        let facing = check.string("facing", body.facing, "Facing must be a string.");
        let bachelors_allowed = check.boolean(
            "bachelorsAllowed",
            body.bachelors_allowed,
            "BachelorsAllowed must be true or false.",
        );
        let car_parking =
            check.boolean("carParking", body.car_parking, "CarParking must be true or false.");
        let car_parking_count = check.whole(
            "carParkingCount",
            body.car_parking_count,
            "Car parking count must be a whole number.",
        );
        let built_up_area_sq_ft = check.number(
            "builtUpAreaSqFt",
            body.built_up_area_sq_ft,
            "Built-up area must be a number.",
        );
        let carpet_area_sq_ft = check.number(
            "carpetAreaSqFt",
            body.carpet_area_sq_ft,
            "Carpet area must be a number.",
        );
        let total_floors = check.whole(
            "totalFloors",
            body.total_floors,
            "Total floors must be a whole number.",
        );
        let floor_number = check.whole(
            "floorNumber",
            body.floor_number,
            "Floor number must be a whole number.",
        );
        let age_of_property =
            check.whole("ageOfProperty", body.age_of_property, "Age must be a whole number.");
        let bedrooms = check.string("bedrooms", body.bedrooms, "Bedrooms must be a string.");
        let bathrooms = check.string("bathrooms", body.bathrooms, "Bathrooms must be a string.");

        Self {
            title,
            description,
            location,
            price,
            available,
            images,
            property_type,
            furnishing,
            facing,
            bachelors_allowed,
            car_parking,
            car_parking_count,
            built_up_area_sq_ft,
            carpet_area_sq_ft,
            total_floors,
            floor_number,
            age_of_property,
            bedrooms,
            bathrooms,
            type_errors: check.errors,
        }
    }
}

/// Accumulates `(field position, message)` so output order is stable
///
/// A field with a type error reports only that error.
#[derive(Default)]
struct ValidationReport {
    messages: Vec<(usize, String)>,
    mistyped: Vec<usize>,
}

impl ValidationReport {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        let position = field_position(field);
        if !self.mistyped.contains(&position) {
            self.messages.push((position, message.into()));
        }
    }

    fn push_type_error(&mut self, field: &str, message: &str) {
        let position = field_position(field);
        self.messages.push((position, message.to_string()));
        self.mistyped.push(position);
    }

    fn is_mistyped(&self, field: &str) -> bool {
        self.mistyped.contains(&field_position(field))
    }

    fn absorb(&mut self, errors: ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            let field = field.to_string();
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("{} is invalid.", field));
                self.push(&field, message);
            }
        }
    }

    fn into_messages(mut self) -> Vec<String> {
        self.messages.sort_by_key(|(position, _)| *position);
        self.messages
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }
}

/// Position of a field in `FIELD_ORDER`, matching snake_case and camelCase
fn field_position(field: &str) -> usize {
    let normalize = |name: &str| name.replace('_', "").to_lowercase();
    let wanted = normalize(field);
    FIELD_ORDER
        .iter()
        .position(|candidate| normalize(candidate) == wanted)
        .unwrap_or(FIELD_ORDER.len())
}

/// Non-blank trimmed value
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_label<T>(
    report: &mut ValidationReport,
    field: &str,
    value: Option<&str>,
    missing: Option<&str>,
    invalid: &str,
) -> Option<T>
where
    T: for<'a> TryFrom<&'a str>,
{
    match value {
        Some(value) => match T::try_from(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                report.push(field, invalid);
                None
            }
        },
        None => {
            if let Some(missing) = missing {
                report.push(field, missing);
            }
            None
        }
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

impl ListingInput {
    /// Runs every rule and returns either the typed details or all messages
    pub fn into_details(self) -> Result<ListingDetails, AppError> {
        let mut report = ValidationReport::default();
        for (field, message) in &self.type_errors {
            report.push_type_error(field, message);
        }

        if let Err(errors) = self.validate() {
            report.absorb(errors);
        }

        let property_type: Option<PropertyType> = parse_label(
            &mut report,
            "propertyType",
            present(&self.property_type),
            Some("Property type is required."),
            "Invalid property type.",
        );
        let furnishing: Option<Furnishing> = parse_label(
            &mut report,
            "furnishing",
            present(&self.furnishing),
            None,
            "Invalid furnishing type.",
        );
        let facing: Option<Facing> = parse_label(
            &mut report,
            "facing",
            present(&self.facing),
            None,
            "Invalid facing direction.",
        );
        let bedrooms: Option<RoomCount> = parse_label(
            &mut report,
            "bedrooms",
            present(&self.bedrooms),
            Some("Bedroom count is required."),
            "Invalid bedroom count.",
        );
        let bathrooms: Option<RoomCount> = parse_label(
            &mut report,
            "bathrooms",
            present(&self.bathrooms),
            Some("Bathrooms count is required."),
            "Invalid bathroom count.",
        );

        if let Some(images) = &self.images {
            if images.iter().any(|image| !is_http_url(image)) {
                report.push("images", "Each image must be a valid URL.");
            }
        }

        let car_parking = self.car_parking.unwrap_or(true);
        if car_parking
            && self.car_parking_count.is_none()
            && !report.is_mistyped("carParking")
        {
            report.push(
                "carParkingCount",
                "Car parking count is required when car parking is enabled.",
            );
        }

        let messages = report.into_messages();
        let (
            Some(title),
            Some(description),
            Some(location),
            Some(price),
            Some(images),
            Some(property_type),
            Some(bedrooms),
            Some(bathrooms),
            Some(built_up_area_sq_ft),
        ) = (
            self.title,
            self.description,
            self.location,
            self.price,
            self.images,
            property_type,
            bedrooms,
            bathrooms,
            self.built_up_area_sq_ft,
        )
        else {
            return Err(AppError::Validation(messages));
        };
        if !messages.is_empty() {
            return Err(AppError::Validation(messages));
        }

        Ok(ListingDetails {
            title,
            description,
            location,
            price,
            available: self.available.unwrap_or(true),
            images,
            property_type,
            furnishing: furnishing.unwrap_or_default(),
            bachelors_allowed: self.bachelors_allowed.unwrap_or(true),
            car_parking,
            car_parking_count: self.car_parking_count,
            bedrooms,
            bathrooms,
            built_up_area_sq_ft,
            carpet_area_sq_ft: self.carpet_area_sq_ft,
            total_floors: self.total_floors,
            floor_number: self.floor_number,
            age_of_property: self.age_of_property,
            facing,
        })
    }
}

/// Raw query string of `GET /api/house`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub search: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub property_type: Option<String>,
    pub furnishing: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub car_parking: Option<String>,
    pub bachelors_allowed: Option<String>,
    pub available: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Price,
    Title,
    Location,
    BuiltUpAreaSqFt,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Price => "price",
            SortField::Title => "title",
            SortField::Location => "location",
            SortField::BuiltUpAreaSqFt => "built_up_area_sq_ft",
        }
    }
}

impl TryFrom<&str> for SortField {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            "price" => Ok(SortField::Price),
            "title" => Ok(SortField::Title),
            "location" => Ok(SortField::Location),
            "builtUpAreaSqFt" => Ok(SortField::BuiltUpAreaSqFt),
            _ => Err(s.to_string()),
        }
    }
}

/// Parsed search: filters, paging and ordering
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSearch {
    pub search: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub furnishing: Option<Furnishing>,
    pub bedrooms: Option<RoomCount>,
    pub bathrooms: Option<RoomCount>,
    pub car_parking: Option<bool>,
    pub bachelors_allowed: Option<bool>,
    pub available: Option<bool>,
    pub page: u64,
    pub limit: u64,
    pub sort_by: SortField,
    pub descending: bool,
}

impl Default for ListingSearch {
    fn default() -> Self {
        Self {
            search: None,
            price_min: None,
            price_max: None,
            property_type: None,
            furnishing: None,
            bedrooms: None,
            bathrooms: None,
            car_parking: None,
            bachelors_allowed: None,
            available: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::CreatedAt,
            descending: true,
        }
    }
}

/// "true" and "false" filter, anything else does not
fn tri_state(value: &Option<String>) -> Option<bool> {
    match value.as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

fn parse_price(value: &Option<String>, name: &str) -> Result<Option<f64>, AppError> {
    present(value)
        .map(|raw| {
            raw.parse::<f64>()
                .ok()
                .filter(|price| price.is_finite())
                .ok_or_else(|| AppError::BadRequest(format!("{} must be a number", name)))
        })
        .transpose()
}

fn parse_filter<T>(value: &Option<String>, name: &str) -> Result<Option<T>, AppError>
where
    T: for<'a> TryFrom<&'a str>,
{
    present(value)
        .map(|raw| {
            T::try_from(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} filter", name)))
        })
        .transpose()
}

/// Unparsable numbers fall back to the default before clamping
fn parse_count(value: &Option<String>, default: u64, max: u64) -> u64 {
    present(value)
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(|count| count.clamp(1, max as i64) as u64)
        .unwrap_or(default)
}

impl TryFrom<ListingQuery> for ListingSearch {
    type Error = AppError;

    fn try_from(query: ListingQuery) -> Result<Self, Self::Error> {
        let (sort_name, forced_descending) = match present(&query.sort_by) {
            Some(name) => match name.strip_prefix('-') {
                Some(stripped) => (stripped, true),
                None => (name, false),
            },
            None => ("createdAt", false),
        };
        let sort_by = SortField::try_from(sort_name)
            .map_err(|_| AppError::BadRequest("Invalid sort field".to_string()))?;
        let descending = forced_descending || present(&query.order) != Some("asc");

        Ok(Self {
            search: present(&query.search).map(str::to_string),
            price_min: parse_price(&query.price_min, "priceMin")?,
            price_max: parse_price(&query.price_max, "priceMax")?,
            property_type: parse_filter(&query.property_type, "propertyType")?,
            furnishing: parse_filter(&query.furnishing, "furnishing")?,
            bedrooms: parse_filter(&query.bedrooms, "bedrooms")?,
            bathrooms: parse_filter(&query.bathrooms, "bathrooms")?,
            car_parking: tri_state(&query.car_parking),
            bachelors_allowed: tri_state(&query.bachelors_allowed),
            available: tri_state(&query.available),
            page: parse_count(&query.page, DEFAULT_PAGE, i64::MAX as u64),
            limit: parse_count(&query.limit, DEFAULT_LIMIT, MAX_LIMIT),
            sort_by,
            descending,
        })
    }
}

impl ListingSearch {
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Whether a listing passes every filter
    pub fn matches(&self, listing: &ListingModel) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = [&listing.title, &listing.description, &listing.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        self.price_min.map_or(true, |min| listing.price >= min)
            && self.price_max.map_or(true, |max| listing.price <= max)
            && self
                .property_type
                .map_or(true, |value| listing.property_type == value)
            && self
                .furnishing
                .map_or(true, |value| listing.furnishing == value)
            && self.bedrooms.map_or(true, |value| listing.bedrooms == value)
            && self.bathrooms.map_or(true, |value| listing.bathrooms == value)
            && self
                .car_parking
                .map_or(true, |value| listing.car_parking == value)
            && self
                .bachelors_allowed
                .map_or(true, |value| listing.bachelors_allowed == value)
            && self
                .available
                .map_or(true, |value| listing.available == value)
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub houses: Vec<ListingModel>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl ListingPage {
    pub fn new(houses: Vec<ListingModel>, total: u64, search: &ListingSearch) -> Self {
        Self {
            houses,
            total,
            page: search.page,
            total_pages: total.div_ceil(search.limit),
        }
    }
}
