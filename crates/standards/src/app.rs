use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use standards_core::domain::{
    CalibrationJournalItem, Category, Characteristic, Department, Entity, Floor, Grade, Housing,
    Material, Person, Position, Quantity, Room, Sector, Service, Standard, Unit,
    VerificationJournalItem, Workplace,
};

use crate::{
    handlers::{
        events::events_sse,
        health::{healthz, livez, readyz},
        resources,
    },
    state::AppState,
};

/// The eight CRUD routes of one entity kind.
fn resource_routes<E: Entity>(router: Router<AppState>) -> Router<AppState> {
    let path = E::KIND.path();
    router
        .route(
            &format!("/{path}"),
            get(resources::list::<E>).post(resources::create::<E>),
        )
        .route(&format!("/{path}/search"), get(resources::search::<E>))
        .route(
            &format!("/{path}/{{id}}"),
            get(resources::get::<E>)
                .put(resources::update::<E>)
                .patch(resources::patch::<E>)
                .delete(resources::delete::<E>),
        )
        .route(
            &format!("/{path}/{{id}}/details"),
            get(resources::details::<E>),
        )
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration for API endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let mut api_routes = Router::new()
        .route("/resources", get(resources::list_resources))
        .route("/events", get(events_sse));

    // Organization
    api_routes = resource_routes::<Department>(api_routes);
    api_routes = resource_routes::<Sector>(api_routes);
    api_routes = resource_routes::<Position>(api_routes);
    api_routes = resource_routes::<Category>(api_routes);
    api_routes = resource_routes::<Grade>(api_routes);
    api_routes = resource_routes::<Person>(api_routes);
    // Premises
    api_routes = resource_routes::<Housing>(api_routes);
    api_routes = resource_routes::<Floor>(api_routes);
    api_routes = resource_routes::<Room>(api_routes);
    api_routes = resource_routes::<Workplace>(api_routes);
    // Metrology
    api_routes = resource_routes::<Quantity>(api_routes);
    api_routes = resource_routes::<Unit>(api_routes);
    api_routes = resource_routes::<Characteristic>(api_routes);
    api_routes = resource_routes::<Material>(api_routes);
    api_routes = resource_routes::<Standard>(api_routes);
    api_routes = resource_routes::<Service>(api_routes);
    // Journals
    api_routes = resource_routes::<CalibrationJournalItem>(api_routes);
    api_routes = resource_routes::<VerificationJournalItem>(api_routes);

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api", api_routes.layer(cors))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}
