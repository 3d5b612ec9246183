// Copyright 2026 S3Gate Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Request ID middleware.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;
use uuid::Uuid;

/// Per-request attributes carried from the middleware stack through the
/// handlers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Unique request identifier, echoed in `x-amz-request-id`.
    pub id: String,
    /// Request path, echoed in error documents as `<Resource>`.
    pub resource: String,
}

/// Assigns every request a UUID and stamps it on the response.
///
/// The response headers are set here, after the handler ran, so the
/// identifier is present on every response regardless of which layer
/// produced it.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext {
        id: Uuid::new_v4().to_string(),
        resource: request.uri().path().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());
    debug!(
        id = %ctx.id,
        method = %request.method(),
        path = %ctx.resource,
        client_ip = client_ip(request.headers()).as_deref().unwrap_or("-"),
        "request received"
    );

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&ctx.id) {
        let headers = response.headers_mut();
        headers.insert("x-amz-id-2", value.clone());
        headers.insert("x-amz-request-id", value);
    }
    response
}

/// Client address as reported by a fronting proxy: `X-Forwarded-For`
/// first, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))?
        .to_str()
        .ok()?;
    Some(raw.split(',').next().unwrap_or(raw).trim().to_string())
}
