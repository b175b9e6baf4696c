use axum::{
    response::IntoResponse,
    routing::{get, on},
    Json, Router,
};
use serde_json::json;
use tracker::database::Database;

pub mod buses;
pub mod locations;
pub mod stops;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

pub fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .nest_service("/stop", stops::routes(state.clone()))
        .nest_service("/bus", buses::routes(state.clone()))
        .nest_service("/location", locations::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn ping() -> impl IntoResponse {
    Json(json!({
        "message": "pong!"
    }))
}
