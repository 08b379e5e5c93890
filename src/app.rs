use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Environment;
use crate::database::models::{Banner, Class, Faq, GalleryImage, Review};
use crate::database::Entity;
use crate::handlers::{protected, public};
use crate::middleware::require_session;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Content: GET public, writes behind the session middleware
        .merge(content_routes::<Faq>("/api/faqs", &state))
        .merge(content_routes::<Banner>("/api/banners", &state))
        .merge(content_routes::<Review>("/api/reviews", &state))
        .merge(content_routes::<Class>("/api/classes", &state))
        .merge(content_routes::<GalleryImage>("/api/gallery_images", &state))
        .merge(auth_routes(&state))
        // Global middleware, outermost first
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/session", get(protected::session))
        .route_layer(from_fn_with_state(state.clone(), require_session))
}

fn content_routes<E: Entity>(path: &str, state: &AppState) -> Router<AppState> {
    let writes = post(protected::create::<E>)
        .put(protected::update::<E>)
        .delete(protected::delete::<E>)
        .route_layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route(path, get(public::list::<E>).merge(writes))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let security = &state.config.security;
    if state.config.environment == Environment::Development && security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
