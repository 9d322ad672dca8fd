use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{EmailSender, LogEmailSender, SecurityService, SqliteDatabase},
    services::{
        AccountService, AdminService, CatalogService, CommunityService, ItineraryService,
        NotificationService, TripService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqliteDatabase,
    pub security: Arc<SecurityService>,
    pub config: Arc<Config>,
    pub accounts: AccountService,
    pub trips: TripService,
    pub catalog: CatalogService,
    pub itinerary: ItineraryService,
    pub community: CommunityService,
    pub notifications: NotificationService,
    pub admin: AdminService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = SqliteDatabase::connect(&config.database).await?;
        Ok(Self::with_email(config, db, Arc::new(LogEmailSender)))
    }

    /// Wire every service over an already initialized database.
    pub fn with_email(config: Config, db: SqliteDatabase, email: Arc<dyn EmailSender>) -> Self {
        let security = Arc::new(SecurityService::new(config.auth.clone()));
        let notifications = NotificationService::new(db.clone());

        Self {
            accounts: AccountService::new(
                db.clone(),
                security.clone(),
                email,
                config.server.public_url.clone(),
            ),
            trips: TripService::new(db.clone()),
            catalog: CatalogService::new(db.clone(), i64::from(config.pagination.max_limit)),
            itinerary: ItineraryService::new(db.clone()),
            community: CommunityService::new(db.clone(), notifications.clone()),
            admin: AdminService::new(db.clone()),
            notifications,
            security,
            config: Arc::new(config),
            db,
        }
    }
}
