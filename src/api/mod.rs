// HTTP surface: one router, thin handlers, services do the work

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod community;
pub mod extract;
pub mod itinerary;
pub mod notifications;
pub mod trips;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::middleware::viewer_context_middleware;
use crate::types::{Page, PageQuery};

/// `page`/`limit` as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn resolve(&self, state: &AppState) -> AppResult<Page> {
        Page::from_query(
            &PageQuery {
                page: self.page,
                limit: self.limit,
            },
            &state.config.pagination,
        )
    }
}

pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.db.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))

        // Accounts
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/verify-email", post(auth::verify_email_handler))
        .route("/api/auth/me", get(auth::me_handler))

        // Trips, budgets, expenses, sharing
        .route("/api/trips", get(trips::list_trips_handler).post(trips::create_trip_handler))
        .route(
            "/api/trips/{id}",
            get(trips::get_trip_handler)
                .put(trips::update_trip_handler)
                .delete(trips::delete_trip_handler),
        )
        .route(
            "/api/trips/{id}/budget",
            get(trips::get_budget_handler).put(trips::upsert_budget_handler),
        )
        .route(
            "/api/trips/{id}/expenses",
            get(trips::list_expenses_handler).post(trips::add_expense_handler),
        )
        .route("/api/trips/{id}/expenses/summary", get(trips::expense_summary_handler))
        .route("/api/expenses/{id}", delete(trips::delete_expense_handler))
        .route(
            "/api/trips/{id}/share",
            post(trips::share_trip_handler).delete(trips::unshare_trip_handler),
        )
        .route("/api/shared/{slug}", get(trips::shared_trip_handler))

        // Reference data
        .route(
            "/api/cities",
            get(catalog::list_cities_handler).post(catalog::create_city_handler),
        )
        .route(
            "/api/cities/{id}/activities",
            get(catalog::list_activities_handler).post(catalog::create_activity_handler),
        )

        // Itinerary
        .route(
            "/api/itinerary/{trip_id}",
            get(itinerary::list_entries_handler).post(itinerary::add_entry_handler),
        )
        .route("/api/itinerary/{trip_id}/days", get(itinerary::list_days_handler))
        .route(
            "/api/itinerary/entry/{id}",
            put(itinerary::update_entry_handler).delete(itinerary::delete_entry_handler),
        )

        // Community
        .route(
            "/api/community/posts",
            get(community::list_posts_handler).post(community::create_post_handler),
        )
        .route("/api/community/posts/trending", get(community::trending_handler))
        .route("/api/community/my-posts", get(community::my_posts_handler))
        .route(
            "/api/community/posts/{id}",
            get(community::get_post_handler).delete(community::delete_post_handler),
        )
        .route("/api/community/posts/{id}/like", post(community::toggle_like_handler))
        .route(
            "/api/community/posts/{id}/comments",
            get(community::list_comments_handler).post(community::add_comment_handler),
        )
        .route("/api/community/posts/{id}/clone", post(community::clone_handler))
        .route("/api/community/posts/{id}/share", post(community::share_handler))

        // Notifications
        .route("/api/notifications", get(notifications::list_handler))
        .route("/api/notifications/unread-count", get(notifications::unread_count_handler))
        .route("/api/notifications/mark-all-read", patch(notifications::mark_all_read_handler))
        .route("/api/notifications/{id}/read", patch(notifications::mark_read_handler))
        .route("/api/notifications/{id}", delete(notifications::delete_handler))

        // Admin
        .route("/api/admin/stats", get(admin::stats_handler))
        .route("/api/admin/users", get(admin::list_users_handler))
        .route("/api/admin/users/{id}/role", patch(admin::set_role_handler))
        .route("/api/admin/trips", get(admin::list_trips_handler))
        .route("/api/admin/trips/{id}", delete(admin::delete_trip_handler))

        .layer(middleware::from_fn_with_state(state.clone(), viewer_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
