use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::metrics::{self, Metrics};
use crate::{api, auth, pages};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub app_config: AppConfig,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(db_pool: DbPool, app_config: AppConfig) -> prometheus::Result<Self> {
        Ok(Self {
            db_pool,
            app_config,
            metrics: Metrics::new()?,
        })
    }
}

pub async fn run_server(app_state: AppState) -> std::io::Result<()> {
    let addr = app_state.app_config.socket_addr();
    let app = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Serving MiniTwit at http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

pub fn create_router(app_state: AppState) -> Router {
    let static_files = ServeDir::new(&app_state.app_config.web.static_dir);

    // Simulator routes, guarded by basic auth and recording `?latest=`
    let simulator_routes = Router::new()
        .route("/register", post(api::register))
        .route("/msgs", get(api::messages))
        .route(
            "/msgs/{username}",
            get(api::user_messages).post(api::post_message),
        )
        .route(
            "/fllws/{username}",
            get(api::follows).post(api::update_follows),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            api::simulator_middleware,
        ));

    let api_routes = Router::new()
        .route("/latest", get(api::latest))
        .route("/health", get(api::health))
        .merge(simulator_routes);

    // HTML pages, with the session cookie resolved up front
    let page_routes = Router::new()
        .route("/", get(pages::timeline))
        .route("/public", get(pages::public_timeline))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/add_message", post(pages::add_message))
        .route("/{username}", get(pages::user_timeline))
        .route("/{username}/follow", get(pages::follow_user))
        .route("/{username}/unfollow", get(pages::unfollow_user))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::session_middleware,
        ));

    Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .route("/metrics", get(metrics::metrics_handler))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", api::ApiDoc::openapi()))
        .nest_service("/static", static_files)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            metrics::track_metrics,
        ))
        .with_state(app_state)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
}
