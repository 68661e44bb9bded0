use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{Facing, Furnishing, ListingModel, PropertyType, RoomCount};
use super::types::{ListingSearch, SortField};
use crate::shared::AppError;

/// Trait for listing repository operations.
///
/// Slugs are unique across the store; inserting a taken slug is a `Conflict`.
#[async_trait]
pub trait ListingRepository {
    async fn create_listing(&self, listing: &ListingModel) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ListingModel>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ListingModel>, AppError>;
    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError>;

    /// Replaces the stored listing with the same id; false when absent
    async fn update_listing(&self, listing: &ListingModel) -> Result<bool, AppError>;

    /// Removes and returns the listing
    async fn delete_listing(&self, id: &str) -> Result<Option<ListingModel>, AppError>;

    /// One page of matching listings plus the total match count
    async fn search_listings(
        &self,
        search: &ListingSearch,
    ) -> Result<(Vec<ListingModel>, u64), AppError>;
}

fn compare_by(field: SortField, a: &ListingModel, b: &ListingModel) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Location => a.location.cmp(&b.location),
        SortField::BuiltUpAreaSqFt => a.built_up_area_sq_ft.total_cmp(&b.built_up_area_sq_ft),
    }
}

/// In-memory implementation of ListingRepository for development and testing
pub struct InMemoryListingRepository {
    listings: Mutex<HashMap<String, ListingModel>>,
}

impl Default for InMemoryListingRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self {
            listings: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_listings(listings: Vec<ListingModel>) -> Self {
        let listing_map = listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();

        Self {
            listings: Mutex::new(listing_map),
        }
    }

    pub fn listing_count(&self) -> usize {
        self.listings.lock().unwrap().len()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    #[instrument(skip(self, listing), fields(listing_id = %listing.id, slug = %listing.slug))]
    async fn create_listing(&self, listing: &ListingModel) -> Result<(), AppError> {
        debug!("Creating listing in memory");

        let mut listings = self.listings.lock().unwrap();
        if listings.values().any(|existing| existing.slug == listing.slug) {
            warn!("Listing slug already exists in memory");
            return Err(AppError::Conflict("Listing slug already exists".to_string()));
        }
        if listings.contains_key(&listing.id) {
            warn!("Listing id already exists in memory");
            return Err(AppError::DatabaseError(
                "Listing already exists".to_string(),
            ));
        }
        listings.insert(listing.id.clone(), listing.clone());

        debug!("Listing created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<ListingModel>, AppError> {
        let listings = self.listings.lock().unwrap();
        Ok(listings.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ListingModel>, AppError> {
        let listings = self.listings.lock().unwrap();
        Ok(listings
            .values()
            .find(|listing| listing.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let listings = self.listings.lock().unwrap();
        Ok(listings.values().any(|listing| listing.slug == slug))
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    async fn update_listing(&self, listing: &ListingModel) -> Result<bool, AppError> {
        let mut listings = self.listings.lock().unwrap();
        match listings.get_mut(&listing.id) {
            Some(existing) => {
                *existing = listing.clone();
                debug!("Listing updated in memory");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn delete_listing(&self, id: &str) -> Result<Option<ListingModel>, AppError> {
        let mut listings = self.listings.lock().unwrap();
        let removed = listings.remove(id);

        debug!(removed = removed.is_some(), "Listing delete attempted in memory");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn search_listings(
        &self,
        search: &ListingSearch,
    ) -> Result<(Vec<ListingModel>, u64), AppError> {
        let listings = self.listings.lock().unwrap();

        let mut matches: Vec<&ListingModel> = listings
            .values()
            .filter(|listing| search.matches(listing))
            .collect();
        let total = matches.len() as u64;

        matches.sort_by(|a, b| {
            let ordering = compare_by(search.sort_by, a, b);
            let ordering = if search.descending {
                ordering.reverse()
            } else {
                ordering
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let page = matches
            .into_iter()
            .skip(search.offset().min(usize::MAX as u64) as usize)
            .take(search.limit as usize)
            .cloned()
            .collect();

        debug!(total, "Searched listings in memory");
        Ok((page, total))
    }
}

const LISTING_COLUMNS: &str = "id, title, description, location, price, available, images, \
     property_type, furnishing, bachelors_allowed, car_parking, car_parking_count, bedrooms, \
     bathrooms, built_up_area_sq_ft, carpet_area_sq_ft, total_floors, floor_number, \
     age_of_property, facing, slug, created_at, updated_at";

/// Escapes LIKE metacharacters so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, search: &ListingSearch) {
    builder.push(" WHERE TRUE");

    if let Some(term) = &search.search {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = search.price_min {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = search.price_max {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(property_type) = search.property_type {
        builder
            .push(" AND property_type = ")
            .push_bind(property_type.as_str());
    }
    if let Some(furnishing) = search.furnishing {
        builder
            .push(" AND furnishing = ")
            .push_bind(furnishing.as_str());
    }
    if let Some(bedrooms) = search.bedrooms {
        builder.push(" AND bedrooms = ").push_bind(bedrooms.as_str());
    }
    if let Some(bathrooms) = search.bathrooms {
        builder.push(" AND bathrooms = ").push_bind(bathrooms.as_str());
    }
    if let Some(car_parking) = search.car_parking {
        builder.push(" AND car_parking = ").push_bind(car_parking);
    }
    if let Some(bachelors_allowed) = search.bachelors_allowed {
        builder
            .push(" AND bachelors_allowed = ")
            .push_bind(bachelors_allowed);
    }
    if let Some(available) = search.available {
        builder.push(" AND available = ").push_bind(available);
    }
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, AppError>
where
    T: for<'a> TryFrom<&'a str>,
{
    let value: String = row.get(column);
    T::try_from(value.as_str()).map_err(|_| {
        warn!(column, value = %value, "Stored listing has unknown enum value");
        AppError::DatabaseError(format!("unknown {} value {}", column, value))
    })
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::DatabaseError(e.to_string())
    }
}

/// PostgreSQL implementation of listing repository
pub struct PostgresListingRepository {
    pool: PgPool,
}

impl PostgresListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<ListingModel, AppError> {
        let facing: Option<String> = row.get("facing");
        let facing = facing
            .map(|value| {
                Facing::try_from(value.as_str()).map_err(|unknown| {
                    AppError::DatabaseError(format!("unknown facing value {}", unknown))
                })
            })
            .transpose()?;

        Ok(ListingModel {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            location: row.get("location"),
            price: row.get("price"),
            available: row.get("available"),
            images: row.get("images"),
            property_type: parse_column::<PropertyType>(row, "property_type")?,
            furnishing: parse_column::<Furnishing>(row, "furnishing")?,
            bachelors_allowed: row.get("bachelors_allowed"),
            car_parking: row.get("car_parking"),
            car_parking_count: row.get("car_parking_count"),
            bedrooms: parse_column::<RoomCount>(row, "bedrooms")?,
            bathrooms: parse_column::<RoomCount>(row, "bathrooms")?,
            built_up_area_sq_ft: row.get("built_up_area_sq_ft"),
            carpet_area_sq_ft: row.get("carpet_area_sq_ft"),
            total_floors: row.get("total_floors"),
            floor_number: row.get("floor_number"),
            age_of_property: row.get("age_of_property"),
            facing,
            slug: row.get("slug"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    #[instrument(skip(self, listing), fields(listing_id = %listing.id, slug = %listing.slug))]
    async fn create_listing(&self, listing: &ListingModel) -> Result<(), AppError> {
        debug!("Creating listing in database");

        let sql = format!(
            "INSERT INTO listings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)",
            LISTING_COLUMNS
        );
        sqlx::query(&sql)
            .bind(&listing.id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.location)
            .bind(listing.price)
            .bind(listing.available)
            .bind(&listing.images)
            .bind(listing.property_type.as_str())
            .bind(listing.furnishing.as_str())
            .bind(listing.bachelors_allowed)
            .bind(listing.car_parking)
            .bind(listing.car_parking_count)
            .bind(listing.bedrooms.as_str())
            .bind(listing.bathrooms.as_str())
            .bind(listing.built_up_area_sq_ft)
            .bind(listing.carpet_area_sq_ft)
            .bind(listing.total_floors)
            .bind(listing.floor_number)
            .bind(listing.age_of_property)
            .bind(listing.facing.map(|facing| facing.as_str()))
            .bind(&listing.slug)
            .bind(listing.created_at)
            .bind(listing.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db_error| db_error.is_unique_violation())
                {
                    warn!("Listing slug already exists in database");
                    return AppError::Conflict("Listing slug already exists".to_string());
                }
                warn!(error = %e, "Failed to create listing in database");
                AppError::DatabaseError(e.to_string())
            })?;

        debug!("Listing created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<ListingModel>, AppError> {
        let sql = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch listing by id"))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ListingModel>, AppError> {
        let sql = format!("SELECT {} FROM listings WHERE slug = $1", LISTING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch listing by slug"))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM listings WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to probe listing slug"))
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    async fn update_listing(&self, listing: &ListingModel) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE listings SET title = $2, description = $3, location = $4, price = $5, \
             available = $6, images = $7, property_type = $8, furnishing = $9, \
             bachelors_allowed = $10, car_parking = $11, car_parking_count = $12, bedrooms = $13, \
             bathrooms = $14, built_up_area_sq_ft = $15, carpet_area_sq_ft = $16, \
             total_floors = $17, floor_number = $18, age_of_property = $19, facing = $20, \
             updated_at = $21 WHERE id = $1",
        )
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.location)
        .bind(listing.price)
        .bind(listing.available)
        .bind(&listing.images)
        .bind(listing.property_type.as_str())
        .bind(listing.furnishing.as_str())
        .bind(listing.bachelors_allowed)
        .bind(listing.car_parking)
        .bind(listing.car_parking_count)
        .bind(listing.bedrooms.as_str())
        .bind(listing.bathrooms.as_str())
        .bind(listing.built_up_area_sq_ft)
        .bind(listing.carpet_area_sq_ft)
        .bind(listing.total_floors)
        .bind(listing.floor_number)
        .bind(listing.age_of_property)
        .bind(listing.facing.map(|facing| facing.as_str()))
        .bind(listing.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update listing"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_listing(&self, id: &str) -> Result<Option<ListingModel>, AppError> {
        let sql = format!(
            "DELETE FROM listings WHERE id = $1 RETURNING {}",
            LISTING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to delete listing"))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    #[instrument(skip(self))]
    async fn search_listings(
        &self,
        search: &ListingSearch,
    ) -> Result<(Vec<ListingModel>, u64), AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM listings");
        push_filters(&mut count_query, search);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count listings"))?;

        let mut page_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM listings", LISTING_COLUMNS));
        push_filters(&mut page_query, search);
        page_query
            .push(" ORDER BY ")
            .push(search.sort_by.column())
            .push(if search.descending { " DESC" } else { " ASC" })
            .push(", id ASC LIMIT ")
            .push_bind(search.limit as i64)
            .push(" OFFSET ")
            .push_bind(search.offset().min(i64::MAX as u64) as i64);

        let rows = page_query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to search listings"))?;
        let listings = rows
            .iter()
            .map(Self::map_row)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(total, returned = listings.len(), "Searched listings in database");
        Ok((listings, total.max(0) as u64))
    }
}
