use axum::{
    extract::{OriginalUri, Query, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use model::ExampleData;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracker::{database::Database, parse_param, RequestError, RequestResult};
use utility::id::Id;

use crate::{
    common::{route_not_found, schema, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(bus_to_stop::<D>))
        .route("/schema", get(schema::<DistanceDto>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Distance along the route of the bus, negative once the stop was passed.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DistanceDto {
    pub distance: i32,
}

impl ExampleData for DistanceDto {
    fn example_data() -> Self {
        Self { distance: 250 }
    }
}

#[derive(Deserialize)]
struct DistanceQuery {
    bus: Option<String>,
    stop: Option<String>,
}

impl DistanceQuery {
    fn ids(&self) -> RequestResult<(i32, i32)> {
        if self.bus.is_none() || self.stop.is_none() {
            return Err(RequestError::params_required());
        }
        Ok((
            parse_param("bus", self.bus.as_deref())?,
            parse_param("stop", self.stop.as_deref())?,
        ))
    }
}

async fn bus_to_stop<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client }): State<WebState<D>>,
    Query(params): Query<DistanceQuery>,
) -> JsonResult<DistanceDto> {
    let error = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    };
    let (bus, stop) = params.ids().map_err(error)?;
    client
        .bus_to_stop_distance(Id::new(bus), Id::new(stop))
        .await
        .map(|distance| Json(DistanceDto { distance }))
        .map_err(error)
}
