//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    AdminService, AuthService, CatalogService, CirculationService, FineService,
    PasswordResetService, ReaderService, SignupService, SocialService,
};
use crate::config::Config;
use crate::domain::mail::Notifier;
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::predictor::LatePredictor;
use crate::utils::password::PasswordHasher;
use crate::utils::tokens::TokenSigner;

/// Services and shared handles used by the HTTP layer.
///
/// Cloned per request by Axum, so every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub auth_service: Arc<AuthService>,
    pub signup_service: Arc<SignupService>,
    pub reset_service: Arc<PasswordResetService>,
    pub catalog_service: Arc<CatalogService>,
    pub circulation_service: Arc<CirculationService>,
    pub fine_service: Arc<FineService>,
    pub reader_service: Arc<ReaderService>,
    pub social_service: Arc<SocialService>,
    pub admin_service: Arc<AdminService>,
    pub notifier: Notifier,
    pub predictor: Arc<dyn LatePredictor>,
    /// Signs flash and pending-signup cookies.
    pub signer: TokenSigner,
    /// Adds `Secure` to cookies when the portal is served over HTTPS.
    pub secure_cookies: bool,
    pub session_ttl_hours: i64,
}

impl AppState {
    /// Wires the Postgres repositories into every service.
    pub fn new(
        config: &Config,
        pool: Arc<PgPool>,
        notifier: Notifier,
        predictor: Arc<dyn LatePredictor>,
    ) -> Self {
        let repos = Repositories::postgres(pool.clone());
        let signer = TokenSigner::new(&config.session_secret);
        let hasher = PasswordHasher::new(config.bcrypt_cost);

        let fine_service = Arc::new(FineService::new(
            repos.fines.clone(),
            repos.loans.clone(),
            repos.students.clone(),
            notifier.clone(),
            config.policy,
        ));

        let circulation_service = Arc::new(CirculationService::new(
            repos.books.clone(),
            repos.students.clone(),
            repos.loans.clone(),
            repos.reservations.clone(),
            fine_service.clone(),
            predictor.clone(),
            notifier.clone(),
            config.policy,
        ));

        Self {
            auth_service: Arc::new(AuthService::new(
                repos.students.clone(),
                repos.admins.clone(),
                repos.sessions.clone(),
                signer.clone(),
                hasher,
                config.session_ttl_hours,
                config.super_admin_emails.clone(),
            )),
            signup_service: Arc::new(SignupService::new(
                repos.students.clone(),
                repos.otps.clone(),
                hasher,
                notifier.clone(),
                config.student_email_domain.clone(),
            )),
            reset_service: Arc::new(PasswordResetService::new(
                repos.students.clone(),
                repos.resets.clone(),
                signer.clone(),
                hasher,
                notifier.clone(),
                config.public_base_url.clone(),
            )),
            catalog_service: Arc::new(CatalogService::new(repos.books.clone())),
            reader_service: Arc::new(ReaderService::new(
                repos.books.clone(),
                repos.loans.clone(),
                repos.ratings.clone(),
                repos.wishlist.clone(),
                repos.reservations.clone(),
            )),
            social_service: Arc::new(SocialService::new(
                repos.students.clone(),
                repos.follows.clone(),
                repos.loans.clone(),
            )),
            admin_service: Arc::new(AdminService::new(
                repos.admins.clone(),
                repos.students.clone(),
                repos.books.clone(),
                repos.loans.clone(),
                repos.sessions.clone(),
                hasher,
                config.super_admin_emails.clone(),
            )),
            fine_service,
            circulation_service,
            notifier,
            predictor,
            signer,
            secure_cookies: config.public_base_url.starts_with("https://"),
            session_ttl_hours: config.session_ttl_hours,
            pool,
        }
    }
}
