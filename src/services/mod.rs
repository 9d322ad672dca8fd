// Business services. Handlers stay thin and call into these.

pub mod access;
pub mod account_service;
pub mod admin_service;
pub mod catalog_service;
pub mod community_service;
pub mod itinerary_service;
pub mod notification_service;
pub mod trip_service;

pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use catalog_service::CatalogService;
pub use community_service::CommunityService;
pub use itinerary_service::ItineraryService;
pub use notification_service::NotificationService;
pub use trip_service::TripService;
