//! Request interception
//!
//! Every request lands on a single fallback route. Requests are turned into
//! [`FetchRequest`]s and offered to the client's controlling engine;
//! whatever the engine passes through is forwarded to the origin untouched.

use crate::engine::{Client, Interception};
use crate::fetch::{resolve_target, strip_hop_by_hop, FetchRequest, FetchResponse, Fetcher, RequestMode};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Header naming how an intercepted response was produced
pub const OUTCOME_HEADER: &str = "x-offgrid-outcome";

/// Shared state for the proxy handlers
pub struct ProxyState {
    pub client: Client,
    pub fetcher: Arc<dyn Fetcher>,
    pub origin: Url,
}

/// Build the router; every path and method goes through the same handler
pub fn create_router(state: Arc<ProxyState>) -> Router {
    Router::new().fallback(handle_request).with_state(state)
}

#[instrument(skip_all, fields(%method, %uri))]
async fn handle_request(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let url = match target_url(&state.origin, &uri) {
        Ok(url) => url,
        Err(e) => {
            debug!(error = %e, "Rejecting unroutable request");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let mut request = FetchRequest::new(method.clone(), url)
        .with_mode(RequestMode::from_headers(&method, &headers))
        .with_headers(strip_hop_by_hop(&headers));
    if !body.is_empty() {
        request = request.with_body(body);
    }

    if let Some(engine) = state.client.controller() {
        match engine.on_request(&request).await {
            Interception::Handled(resolution) => {
                let outcome = resolution.outcome;
                let mut response = into_axum(resolution.response);
                response.headers_mut().insert(
                    HeaderName::from_static(OUTCOME_HEADER),
                    HeaderValue::from_static(outcome.as_str()),
                );
                return response;
            }
            Interception::Passthrough(class) => {
                debug!(%class, "Forwarding to origin");
            }
        }
    } else {
        debug!("No active version, forwarding to origin");
    }

    match state.fetcher.fetch(&request).await {
        Ok(response) => into_axum(response),
        Err(e) => {
            warn!(url = %request.url, error = %e, "Upstream request failed");
            (StatusCode::BAD_GATEWAY, "Upstream unavailable").into_response()
        }
    }
}

/// Resolve the request target against the origin
///
/// Origin-form targets (`/path?q`) are joined onto the origin; absolute-form
/// targets, as sent to a forward proxy, are used as-is.
pub fn target_url(origin: &Url, uri: &Uri) -> crate::OffgridResult<Url> {
    let target = match uri.scheme() {
        Some(_) => uri.to_string(),
        None => uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string()),
    };
    resolve_target(origin, &target)
}

fn into_axum(response: FetchResponse) -> Response {
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = response.status;
    *out.headers_mut() = strip_hop_by_hop(&response.headers);
    out
}
