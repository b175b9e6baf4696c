pub use crate::common::RouteResult;

use std::{io, net::SocketAddr};

use axum::{extract::Request, routing::on, Router, ServiceExt};
use tokio::net::TcpListener;
use tower_http::{
    normalize_path::NormalizePath,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracker::{client::Client, database::Database};

use crate::common::{route_not_found, METHOD_FILTER_ALL};

pub mod api;
pub mod common;
pub mod config;

#[derive(Clone)]
pub struct WebState<D>
where
    D: Database,
{
    pub client: Client<D>,
}

pub fn router<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

pub async fn start_web_server<D: Database>(
    state: WebState<D>,
    address: SocketAddr,
) -> io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    log::info!("listening on {}", listener.local_addr()?);
    serve(listener, state).await
}

/// Serves the api on an already bound listener. `/api/stop/` and `/api/stop`
/// reach the same handler.
pub async fn serve<D: Database>(listener: TcpListener, state: WebState<D>) -> io::Result<()> {
    let routes = NormalizePath::trim_trailing_slash(router(state));
    axum::serve(listener, ServiceExt::<Request>::into_make_service(routes)).await
}
