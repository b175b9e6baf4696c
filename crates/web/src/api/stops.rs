use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use model::{stop::BusStop, ExampleData, WithId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracker::{database::Database, parse_coordinates, parse_param, RequestError};
use utility::{id::Id, let_also::LetAlso};

use crate::{
    common::{route_not_found, schema, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(nearest_stops::<D>))
        .route("/schema", get(schema::<StopDto>))
        .route("/:id", get(get_stop::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Stops as `[name, id]` pairs, nearest first.
#[derive(Debug, Serialize, JsonSchema)]
pub struct StopsDto {
    pub stops: Vec<(String, Id<BusStop>)>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct StopDto {
    pub id: Id<BusStop>,
    pub name: String,
}

impl ExampleData for StopDto {
    fn example_data() -> Self {
        Self {
            id: Id::new(1),
            name: BusStop::example_data().name,
        }
    }
}

impl From<WithId<BusStop>> for StopDto {
    fn from(stop: WithId<BusStop>) -> Self {
        Self {
            id: stop.id,
            name: stop.content.name,
        }
    }
}

#[derive(Deserialize)]
struct NearestQuery {
    latitude: Option<String>,
    longitude: Option<String>,
}

async fn nearest_stops<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client }): State<WebState<D>>,
    Query(params): Query<NearestQuery>,
) -> JsonResult<StopsDto> {
    let error = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    };
    let origin = parse_coordinates(params.latitude.as_deref(), params.longitude.as_deref())
        .map_err(error)?;
    client
        .nearest_stops(origin)
        .await
        .map(|stops| {
            stops
                .into_iter()
                .map(|stop| (stop.content.content.name, stop.content.id))
                .collect::<Vec<_>>()
                .let_owned(|stops| Json(StopsDto { stops }))
        })
        .map_err(error)
}

async fn get_stop<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client }): State<WebState<D>>,
) -> JsonResult<StopDto> {
    let error = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    };
    let id = parse_param("id", Some(id.as_str())).map_err(error)?;
    client
        .get_stop(Id::new(id))
        .await
        .map(|stop| Json(StopDto::from(stop)))
        .map_err(error)
}
