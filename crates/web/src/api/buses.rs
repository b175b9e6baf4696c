use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on},
    Json, Router,
};
use model::{vehicle::Vehicle, ExampleData, WithId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracker::{
    database::Database, parse_coordinates, parse_param, RequestError, RequestResult,
};
use utility::{id::Id, let_also::LetAlso};

use crate::{
    common::{route_not_found, schema, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(buses_at_stop::<D>))
        .route("/schema", get(schema::<BusDto>))
        .route(
            "/:id",
            get(get_bus::<D>)
                .patch(update_location::<D>)
                .put(update_location::<D>),
        )
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Buses as `[name, id]` pairs, in the order they were assigned to the stop.
#[derive(Debug, Serialize, JsonSchema)]
pub struct BusesDto {
    pub buses: Vec<(String, Id<Vehicle>)>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BusDto {
    pub id: Id<Vehicle>,
    pub name: String,
}

impl ExampleData for BusDto {
    fn example_data() -> Self {
        Self {
            id: Id::new(1),
            name: Vehicle::example_data().name,
        }
    }
}

impl From<WithId<Vehicle>> for BusDto {
    fn from(bus: WithId<Vehicle>) -> Self {
        Self {
            id: bus.id,
            name: bus.content.name,
        }
    }
}

#[derive(Deserialize)]
struct BusesQuery {
    stop: Option<String>,
}

/// Position reported by a bus. Coordinates may be sent as numbers or strings.
#[derive(Deserialize)]
struct PositionBody {
    latitude: Option<Value>,
    longitude: Option<Value>,
}

fn coordinate_text(value: Option<Value>) -> RequestResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(RequestError::invalid_input(format!(
            "coordinate is not a number: {}",
            other
        ))),
    }
}

async fn buses_at_stop<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client }): State<WebState<D>>,
    Query(params): Query<BusesQuery>,
) -> JsonResult<BusesDto> {
    let error = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    };
    let stop = parse_param("stop", params.stop.as_deref()).map_err(error)?;
    client
        .buses_at(Id::new(stop))
        .await
        .map(|buses| {
            buses
                .into_iter()
                .map(|bus| (bus.content.name, bus.id))
                .collect::<Vec<_>>()
                .let_owned(|buses| Json(BusesDto { buses }))
        })
        .map_err(error)
}

async fn get_bus<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client }): State<WebState<D>>,
) -> JsonResult<BusDto> {
    let error = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    };
    let id = parse_param("id", Some(id.as_str())).map_err(error)?;
    client
        .get_bus(Id::new(id))
        .await
        .map(|bus| Json(BusDto::from(bus)))
        .map_err(error)
}

async fn update_location<D: Database>(
    method: Method,
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { client }): State<WebState<D>>,
    body: Result<Json<PositionBody>, JsonRejection>,
) -> JsonResult<Value> {
    let error = |why: RequestError| {
        RouteErrorResponse::from(why)
            .with_method(&method)
            .with_uri(original_uri.path())
    };
    let id = parse_param("id", Some(id.as_str())).map_err(error)?;
    let Json(body) = body.map_err(|rejection| {
        error(RequestError::invalid_input(rejection.body_text()))
    })?;
    let latitude = coordinate_text(body.latitude).map_err(error)?;
    let longitude = coordinate_text(body.longitude).map_err(error)?;
    let reported = parse_coordinates(latitude.as_deref(), longitude.as_deref())
        .map_err(error)?;
    client
        .update_vehicle_location(Id::new(id), reported)
        .await
        .map(|_| Json(json!({})))
        .map_err(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_as_numbers_or_strings() {
        assert_eq!(
            coordinate_text(Some(json!(54.3))).unwrap().as_deref(),
            Some("54.3")
        );
        assert_eq!(
            coordinate_text(Some(json!("10.2"))).unwrap().as_deref(),
            Some("10.2")
        );
        assert_eq!(coordinate_text(None).unwrap(), None);
        assert!(coordinate_text(Some(json!([1, 2]))).is_err());
    }
}
