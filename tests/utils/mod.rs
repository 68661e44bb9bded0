pub mod actions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::{house_body, TestResponse};
#[allow(unused_imports)]
pub use mocks::MockImageHost;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder, HOUSE_FOLDER, SUPER_ADMIN_EMAIL, SUPER_ADMIN_PASSWORD};
