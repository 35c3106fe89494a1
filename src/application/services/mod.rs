//! Business logic services for the application layer.

pub mod admin_service;
pub mod auth_service;
pub mod catalog_service;
pub mod circulation_service;
pub mod fine_service;
pub mod password_reset_service;
pub mod reader_service;
pub mod signup_service;
pub mod social_service;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use circulation_service::CirculationService;
pub use fine_service::FineService;
pub use password_reset_service::PasswordResetService;
pub use reader_service::ReaderService;
pub use signup_service::SignupService;
pub use social_service::SocialService;
