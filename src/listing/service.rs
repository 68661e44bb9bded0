use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::ListingModel,
    repository::ListingRepository,
    slug::{base_slug, numbered_candidate, random_candidate, MAX_SLUG_PROBES},
    types::{ListingInput, ListingPage, ListingQuery, ListingSearch},
};
use crate::shared::{is_valid_object_id, AppError};

const NOT_FOUND: &str = "House not found";

/// Service for listing business logic
pub struct ListingService {
    repository: Arc<dyn ListingRepository + Send + Sync>,
}

impl ListingService {
    pub fn new(repository: Arc<dyn ListingRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Rejects malformed ids before the store is consulted
    fn check_id(id: &str) -> Result<(), AppError> {
        if is_valid_object_id(id) {
            Ok(())
        } else {
            debug!(listing_id = %id, "Rejected malformed listing id");
            Err(AppError::BadRequest("Invalid house ID".to_string()))
        }
    }

    /// Picks a free slug: `base`, `base-1`, `base-2`, ... and after
    /// `MAX_SLUG_PROBES` collisions a random suffix that is used without probing.
    async fn unique_slug(&self, base: &str) -> Result<String, AppError> {
        for attempt in 0..MAX_SLUG_PROBES {
            let candidate = numbered_candidate(base, attempt);
            if !self.repository.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!(slug = %candidate, "Slug taken");
        }

        let candidate = random_candidate(base);
        warn!(base = %base, slug = %candidate, "Slug probes exhausted, using random suffix");
        Ok(candidate)
    }

    #[instrument(skip(self, input))]
    pub async fn create_listing(&self, input: ListingInput) -> Result<ListingModel, AppError> {
        let details = input.into_details()?;

        let slug = self
            .unique_slug(&base_slug(&details.title, &details.location))
            .await?;
        let listing = ListingModel::new(details, slug);

        self.repository.create_listing(&listing).await?;

        info!(listing_id = %listing.id, slug = %listing.slug, "Listing created");
        Ok(listing)
    }

    #[instrument(skip(self))]
    pub async fn search_listings(&self, query: ListingQuery) -> Result<ListingPage, AppError> {
        let search = ListingSearch::try_from(query)?;
        let (houses, total) = self.repository.search_listings(&search).await?;

        debug!(total, returned = houses.len(), page = search.page, "Listings searched");
        Ok(ListingPage::new(houses, total, &search))
    }

    #[instrument(skip(self))]
    pub async fn get_listing(&self, id: &str) -> Result<ListingModel, AppError> {
        Self::check_id(id)?;

        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_listing_by_slug(&self, slug: &str) -> Result<ListingModel, AppError> {
        self.repository
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    /// Full replacement: the body is revalidated as on create
    #[instrument(skip(self, input))]
    pub async fn update_listing(
        &self,
        id: &str,
        input: ListingInput,
    ) -> Result<ListingModel, AppError> {
        Self::check_id(id)?;
        let details = input.into_details()?;

        let mut listing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
        listing.replace_details(details);

        if !self.repository.update_listing(&listing).await? {
            // Deleted between read and write
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }

        info!(listing_id = %listing.id, "Listing updated");
        Ok(listing)
    }

    #[instrument(skip(self))]
    pub async fn delete_listing(&self, id: &str) -> Result<ListingModel, AppError> {
        Self::check_id(id)?;

        let listing = self
            .repository
            .delete_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

        info!(listing_id = %listing.id, "Listing deleted");
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::models::fixtures::sample_details;
    use crate::listing::repository::InMemoryListingRepository;
    use crate::listing::types::fixtures::valid_input;
    use async_trait::async_trait;

    /// Panics on every call, proving a code path never reaches the store
    struct UnreachableRepository;

    #[async_trait]
    impl ListingRepository for UnreachableRepository {
        async fn create_listing(&self, _: &ListingModel) -> Result<(), AppError> {
            panic!("store must not be touched")
        }
        async fn find_by_id(&self, _: &str) -> Result<Option<ListingModel>, AppError> {
            panic!("store must not be touched")
        }
        async fn find_by_slug(&self, _: &str) -> Result<Option<ListingModel>, AppError> {
            panic!("store must not be touched")
        }
        async fn slug_exists(&self, _: &str) -> Result<bool, AppError> {
            panic!("store must not be touched")
        }
        async fn update_listing(&self, _: &ListingModel) -> Result<bool, AppError> {
            panic!("store must not be touched")
        }
        async fn delete_listing(&self, _: &str) -> Result<Option<ListingModel>, AppError> {
            panic!("store must not be touched")
        }
        async fn search_listings(
            &self,
            _: &ListingSearch,
        ) -> Result<(Vec<ListingModel>, u64), AppError> {
            panic!("store must not be touched")
        }
    }

    fn service() -> (ListingService, Arc<InMemoryListingRepository>) {
        let repo = Arc::new(InMemoryListingRepository::new());
        (ListingService::new(repo.clone()), repo)
    }

    fn stored_with_slug(slug: &str) -> ListingModel {
        ListingModel::new(
            sample_details("Sea View Flat", "Kochi", 25000.0),
            slug.to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_derives_slug() {
        let (service, repo) = service();

        let listing = service.create_listing(valid_input()).await.unwrap();

        assert_eq!(listing.slug, "sea-view-flat-kochi");
        assert_eq!(repo.listing_count(), 1);
    }

    #[tokio::test]
    async fn test_colliding_slugs_get_numbered_suffixes() {
        let (service, _) = service();

        let first = service.create_listing(valid_input()).await.unwrap();
        let second = service.create_listing(valid_input()).await.unwrap();
        let third = service.create_listing(valid_input()).await.unwrap();

        assert_eq!(first.slug, "sea-view-flat-kochi");
        assert_eq!(second.slug, "sea-view-flat-kochi-1");
        assert_eq!(third.slug, "sea-view-flat-kochi-2");
    }

    #[tokio::test]
    async fn test_random_suffix_after_probes_exhausted() {
        let base = "sea-view-flat-kochi";
        let taken = (0..MAX_SLUG_PROBES)
            .map(|attempt| stored_with_slug(&numbered_candidate(base, attempt)))
            .collect();
        let repo = Arc::new(InMemoryListingRepository::with_listings(taken));
        let service = ListingService::new(repo);

        let listing = service.create_listing(valid_input()).await.unwrap();

        let suffix = listing
            .slug
            .strip_prefix("sea-view-flat-kochi-")
            .unwrap();
        assert_eq!(suffix.len(), 8);
    }

    #[tokio::test]
    async fn test_create_invalid_input_stores_nothing() {
        let (service, repo) = service();

        let result = service
            .create_listing(ListingInput {
                title: None,
                ..valid_input()
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(messages)) if messages == vec!["Title is required."]));
        assert_eq!(repo.listing_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_id_never_touches_store() {
        let service = ListingService::new(Arc::new(UnreachableRepository));

        for result in [
            service.get_listing("not-an-id").await,
            service.delete_listing("123").await,
            service.update_listing("xyz", valid_input()).await,
        ] {
            assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "Invalid house ID"));
        }
    }

    #[tokio::test]
    async fn test_missing_listing_is_not_found() {
        let (service, _) = service();
        let id = crate::shared::new_object_id();

        assert!(matches!(
            service.get_listing(&id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_listing(&id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.update_listing(&id, valid_input()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get_listing_by_slug("nothing-here").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_slug_and_revalidates() {
        let (service, _) = service();
        let created = service.create_listing(valid_input()).await.unwrap();

        let invalid = service
            .update_listing(
                &created.id,
                ListingInput {
                    price: Some(-1.0),
                    ..valid_input()
                },
            )
            .await;
        assert!(matches!(invalid, Err(AppError::Validation(_))));

        let updated = service
            .update_listing(
                &created.id,
                ListingInput {
                    title: Some("Renamed Flat".to_string()),
                    ..valid_input()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.slug, created.slug);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "Renamed Flat");

        let fetched = service.get_listing_by_slug(&created.slug).await.unwrap();
        assert_eq!(fetched.title, "Renamed Flat");
    }

    #[tokio::test]
    async fn test_delete_returns_record() {
        let (service, repo) = service();
        let created = service.create_listing(valid_input()).await.unwrap();

        let deleted = service.delete_listing(&created.id).await.unwrap();

        assert_eq!(deleted.id, created.id);
        assert_eq!(repo.listing_count(), 0);
    }

    #[tokio::test]
    async fn test_search_pages() {
        let (service, _) = service();
        for price in [100.0, 200.0, 300.0] {
            service
                .create_listing(ListingInput {
                    price: Some(price),
                    ..valid_input()
                })
                .await
                .unwrap();
        }

        let page = service
            .search_listings(ListingQuery {
                limit: Some("2".to_string()),
                sort_by: Some("price".to_string()),
                order: Some("asc".to_string()),
                ..ListingQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 1);
        let prices: Vec<_> = page.houses.iter().map(|house| house.price).collect();
        assert_eq!(prices, vec![100.0, 200.0]);
    }
}
