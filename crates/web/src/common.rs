use axum::{
    extract::{OriginalUri, Query, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use model::ExampleData;
use schemars::{schema_for, schema_for_value, JsonSchema};
use serde::{Deserialize, Serialize};
use tracker::RequestError;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type JsonResult<O> = RouteResult<Json<O>>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

// - Services returning commonly used responses -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaParams {
    #[serde(default = "Default::default")]
    example_data: bool,
}

pub(crate) async fn schema<T: ExampleData + JsonSchema + Serialize>(
    Query(params): Query<SchemaParams>,
) -> impl IntoResponse {
    if params.example_data {
        Json(schema_for_value!(T::example_data()))
    } else {
        Json(schema_for!(T))
    }
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_information: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: None,
            detailed_information: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = self
            .status_code
            .canonical_reason()
            .unwrap_or("i dunno what happened here :/");
        self.with_message(message)
    }

    pub fn with_detailed_information(mut self, message: impl Into<String>) -> Self {
        self.detailed_information = Some(message.into());
        self
    }
}

impl From<RequestError> for RouteErrorResponse {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::InvalidInput(message) => {
                Self::new(StatusCode::BAD_REQUEST).with_message(message)
            }
            RequestError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND).with_message(value.to_string())
            }
            RequestError::RouteMismatch { ref stop_paths, .. } => {
                let detail = format!("stop is on path(s) {:?}", stop_paths);
                Self::new(StatusCode::CONFLICT)
                    .with_message("The stop is not on the route of the bus.")
                    .with_detailed_information(detail)
            }
            RequestError::InvalidData(_) => {
                log::error!("{}", value);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_default_message()
                    .with_detailed_information(value.to_string())
            }
            RequestError::Other(other) => {
                log::error!("request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR).with_default_message()
            }
        }
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use tracker::Entity;

    use super::*;

    #[test]
    fn status_codes() {
        let cases = vec![
            (RequestError::params_required(), StatusCode::BAD_REQUEST),
            (RequestError::NotFound(Entity::Vehicle), StatusCode::NOT_FOUND),
            (
                RequestError::RouteMismatch {
                    bus_path: 1,
                    stop_paths: vec![2],
                },
                StatusCode::CONFLICT,
            ),
            (
                RequestError::InvalidData("broken".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status_code) in cases {
            assert_eq!(RouteErrorResponse::from(error).status_code, status_code);
        }
    }

    #[test]
    fn not_found_names_the_entity() {
        let response = RouteErrorResponse::from(RequestError::NotFound(Entity::BusStop));
        assert_eq!(
            response.message.as_deref(),
            Some("BusStop object does not exist.")
        );
    }

    #[test]
    fn storage_failure_hides_details() {
        let response =
            RouteErrorResponse::from(RequestError::Other("connection refused".into()));
        assert_eq!(response.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.message.as_deref(), Some("Internal Server Error"));
        assert!(response.detailed_information.is_none());
    }

    #[test]
    fn error_body_is_camel_case_without_empty_fields() {
        let response = RouteErrorResponse::not_found(&Method::GET, "/api/nothing");
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["httpMethod"], "GET");
        assert_eq!(body["requestedUri"], "/api/nothing");
        assert!(body.get("detailedInformation").is_none());
    }
}
