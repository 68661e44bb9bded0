use house_rental::account::repository::{
    AccountRepository, InMemoryAccountRepository, PostgresAccountRepository,
};
use house_rental::listing::repository::{
    InMemoryListingRepository, ListingRepository, PostgresListingRepository,
};
use house_rental::upload::CloudinaryImageHost;
use house_rental::{
    app, cors_layer, AccountService, AdminAccount, AppConfig, AppState, ImageRelay,
    ListingService, TokenConfig, UserAccount,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type AccountStore = Arc<dyn AccountRepository + Send + Sync>;
type ListingStore = Arc<dyn ListingRepository + Send + Sync>;

async fn repositories(
    database_url: Option<&str>,
) -> Result<(AccountStore, AccountStore, ListingStore), Box<dyn std::error::Error>> {
    let Some(database_url) = database_url else {
        warn!("DATABASE_URL not set, using in-memory stores");
        return Ok((
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryListingRepository::new()),
        ));
    };

    let pool = sqlx::PgPool::connect(database_url).await?;
    info!("Connected to PostgreSQL");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations completed");

    Ok((
        Arc::new(PostgresAccountRepository::users(pool.clone())),
        Arc::new(PostgresAccountRepository::admins(pool.clone())),
        Arc::new(PostgresListingRepository::new(pool)),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "house_rental=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting house rental server");

    let config = AppConfig::from_env()?;
    let (user_repository, admin_repository, listing_repository) =
        repositories(config.database_url.as_deref()).await?;

    let token_config = TokenConfig::new(
        config.access_token_secret.clone(),
        config.refresh_token_secret.clone(),
    );
    let user_service = Arc::new(AccountService::<UserAccount>::new(
        user_repository,
        token_config.clone(),
    ));
    let admin_service = Arc::new(AccountService::<AdminAccount>::new(
        admin_repository,
        token_config.clone(),
    ));

    if let Some(seed) = &config.super_admin {
        if admin_service
            .ensure_super_admin(&seed.name, &seed.email, &seed.password)
            .await?
        {
            info!(email = %seed.email, "Seeded superAdmin account");
        }
    }

    let image_relay = Arc::new(ImageRelay::new(
        Arc::new(CloudinaryImageHost::new(config.cloudinary.clone())),
        PathBuf::from(&config.upload_dir),
    ));

    let app_state = AppState::new(
        user_service,
        admin_service,
        Arc::new(ListingService::new(listing_repository)),
        image_relay,
        token_config,
        config.house_image_folder.clone(),
    );
    let router = app(app_state, cors_layer(config.cors_allowed_origin.as_deref()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, router).await?;

    Ok(())
}
