pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    routing::{MethodRouter, get},
};

/// Contact routes. The collection answers on both `/api` and `/api/`; any
/// method a route does not serve gets a JSON 405. `get` would implicitly
/// answer HEAD, so HEAD is routed to the 405 handler explicitly.
pub fn build_api_router() -> Router<ApiState> {
    let collection: MethodRouter<ApiState> = get(handlers::list_contacts)
        .head(handlers::method_not_allowed)
        .post(handlers::create_contact)
        .fallback(handlers::method_not_allowed);

    let item: MethodRouter<ApiState> = get(handlers::get_contact)
        .head(handlers::method_not_allowed)
        .put(handlers::update_contact)
        .delete(handlers::delete_contact)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route("/api", collection.clone())
        .route("/api/", collection)
        .route("/api/{id}", item)
}
