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

//! Body validation middleware.
//!
//! Enforces the declared `Content-Length` against the configured maximum,
//! reads the body under a deadline, verifies `x-amz-content-sha256` and
//! `Content-MD5`, and replaces the body with a rewindable buffer so
//! handlers can read it again.
//!
//! Streaming signed payloads (`STREAMING-AWS4-HMAC-SHA256-PAYLOAD`) bypass
//! this stage entirely; the object handler consumes them through the
//! chunk decoder.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::auth::chunked::STREAMING_PAYLOAD;
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::xml;
use crate::server::AppState;

/// Payload-hash values that do not name a hex digest of the body.
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Reads and validates the request body, honoring the configured size cap
/// and read deadline.
pub async fn body_validation_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default();

    let content_sha256 = request
        .headers()
        .get("x-amz-content-sha256")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // Streaming signed bodies are framed and verified chunk by chunk in
    // the handler; buffering them here would defeat that.
    if content_sha256.as_deref() == Some(STREAMING_PAYLOAD) {
        return next.run(request).await;
    }

    let Some(content_length) = request.headers().get(CONTENT_LENGTH) else {
        // Chunked transfer without a declared length passes through; the
        // extractor reads what arrives.
        return next.run(request).await;
    };
    let content_length: u32 = match content_length.to_str().ok().and_then(|v| v.parse().ok()) {
        Some(length) => length,
        None => return xml::error_response(&ctx, &S3Error::InvalidArgument),
    };

    if state.max_body_size > 0 && content_length > state.max_body_size {
        return xml::error_response(&ctx, &S3Error::EntityTooLarge);
    }

    let (parts, body) = request.into_parts();
    // The read races the configured deadline and resolves exactly once.
    let body = match tokio::time::timeout(
        state.read_body_timeout,
        axum::body::to_bytes(body, usize::MAX),
    )
    .await
    {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(_)) => return xml::error_response(&ctx, &S3Error::IncompleteBody),
        Err(_) => return xml::error_response(&ctx, &S3Error::RequestTimeout),
    };

    // With a Transfer-Encoding in play the hop bytes differ from the
    // declared entity length, so only enforce it for identity bodies.
    let transfer_encoded = parts
        .headers
        .get(TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| !v.contains("identity"))
        .unwrap_or(false);
    if !transfer_encoded && body.len() != content_length as usize {
        return xml::error_response(&ctx, &S3Error::IncompleteBody);
    }

    if let Some(expected) = content_sha256.as_deref().filter(|v| *v != UNSIGNED_PAYLOAD) {
        if expected.len() != 64 || hex::decode(expected).is_err() {
            return xml::error_response(&ctx, &S3Error::InvalidDigest);
        }
        let actual = hex::encode(Sha256::digest(&body));
        if actual != expected {
            return xml::error_response(&ctx, &S3Error::BadDigest);
        }
    }

    if let Some(expected) = parts
        .headers
        .get("content-md5")
        .and_then(|v| v.to_str().ok())
    {
        let decoded = match base64::engine::general_purpose::STANDARD.decode(expected) {
            Ok(decoded) if decoded.len() == 16 => decoded,
            _ => return xml::error_response(&ctx, &S3Error::InvalidDigest),
        };
        let actual = Md5::digest(&body);
        if actual.as_slice() != decoded.as_slice() {
            return xml::error_response(&ctx, &S3Error::BadDigest);
        }
    }

    let request = Request::from_parts(parts, Body::from(body));
    next.run(request).await
}
