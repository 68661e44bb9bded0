use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;

use house_rental::{
    account::repository::InMemoryAccountRepository,
    app, cors_layer,
    listing::repository::InMemoryListingRepository,
    AccountService, AdminAccount, AppState, ImageRelay, ListingService, TokenConfig, UserAccount,
};

use super::mocks::MockImageHost;

pub const SUPER_ADMIN_EMAIL: &str = "root@rentals.test";
pub const SUPER_ADMIN_PASSWORD: &str = "root-password";
pub const HOUSE_FOLDER: &str = "integration/house-images";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub image_host: MockImageHost,
    pub upload_dir: TempDir,
}

pub struct TestSetupBuilder {
    seed_super_admin: bool,
    image_host: MockImageHost,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            seed_super_admin: false,
            image_host: MockImageHost::new(),
        }
    }

    pub fn with_super_admin(mut self) -> Self {
        self.seed_super_admin = true;
        self
    }

    pub fn with_image_host(mut self, host: MockImageHost) -> Self {
        self.image_host = host;
        self
    }

    pub async fn build(self) -> TestSetup {
        let token_config = TokenConfig::new(
            "integration-access-secret".to_string(),
            "integration-refresh-secret".to_string(),
        );
        let user_service = Arc::new(AccountService::<UserAccount>::new(
            Arc::new(InMemoryAccountRepository::new()),
            token_config.clone(),
        ));
        let admin_service = Arc::new(AccountService::<AdminAccount>::new(
            Arc::new(InMemoryAccountRepository::new()),
            token_config.clone(),
        ));

        if self.seed_super_admin {
            admin_service
                .ensure_super_admin("Root", SUPER_ADMIN_EMAIL, SUPER_ADMIN_PASSWORD)
                .await
                .unwrap();
        }

        let upload_dir = tempfile::tempdir().unwrap();
        let image_relay = Arc::new(ImageRelay::new(
            Arc::new(self.image_host.clone()),
            upload_dir.path().join("spool"),
        ));

        let state = AppState::new(
            user_service,
            admin_service,
            Arc::new(ListingService::new(Arc::new(
                InMemoryListingRepository::new(),
            ))),
            image_relay,
            token_config,
            HOUSE_FOLDER.to_string(),
        );

        TestSetup {
            app: app(state, cors_layer(None)),
            image_host: self.image_host,
            upload_dir,
        }
    }
}
