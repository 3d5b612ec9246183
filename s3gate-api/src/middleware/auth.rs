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

//! Authentication middleware.
//!
//! Requests carrying a SigV4 `Authorization` header are verified against
//! the configured credentials; everything else is denied. Authentication
//! failure is terminal for the request.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::auth::signature_v4::{self, SignatureRequestData};
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::xml;
use crate::server::AppState;

/// Verifies AWS Signature V4 and stashes the derived signing state in the
/// request extensions for streaming chunk verification.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();

    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !authorization.starts_with("AWS4-HMAC-SHA256 ") {
        return xml::error_response(&ctx, &S3Error::AccessDenied);
    }

    let data = SignatureRequestData::from_request(&request);
    match signature_v4::verify(&data, &authorization, state.secrets.as_ref()) {
        Ok(sig) => {
            request.extensions_mut().insert(sig);
            next.run(request).await
        }
        Err(err) => {
            warn!(
                method = %data.method,
                path = %data.path,
                code = err.code(),
                "authentication failed"
            );
            xml::error_response(&ctx, &err)
        }
    }
}
