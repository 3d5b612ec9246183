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

//! Operation handlers for the S3 surface.
//!
//! Handlers receive parameters already split out by the router dispatch
//! layer, call exactly one origin operation, and frame the result as XML
//! or raw bytes.

pub mod bucket;
pub mod multipart;
pub mod object;
pub mod service;

use std::collections::HashMap;

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use s3gate_core::types::Owner;

use crate::auth::chunked::{ChunkError, SignedChunkReader, STREAMING_PAYLOAD};
use crate::auth::signature_v4::SigV4Context;
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::xml;

/// Decoded query parameters, first value per name.
pub type Params = HashMap<String, String>;

/// Owner identity stamped on listings. A single-credential gateway has
/// exactly one principal.
pub(crate) fn gateway_owner() -> Owner {
    Owner::new("s3gate", "s3gate")
}

/// Renders a NotImplemented error; registered ahead of real routes for
/// the unsupported subresources.
pub(crate) fn not_implemented(ctx: &RequestContext) -> Response {
    xml::error_response(ctx, &S3Error::NotImplemented)
}

/// Looks up a form value, defaulting to the empty string.
pub(crate) fn form_value<'a>(params: &'a Params, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or("")
}

/// Parses a non-negative integer form value. Unparseable or negative
/// values are rejected with `InvalidArgument`; values above `max` clamp.
pub(crate) fn bounded_form_value(
    params: &Params,
    name: &str,
    max: usize,
    default: usize,
) -> Result<usize, S3Error> {
    match params.get(name).map(String::as_str) {
        None | Some("") => Ok(default),
        Some(raw) => {
            let value: i64 = raw.parse().map_err(|_| S3Error::InvalidArgument)?;
            if value < 0 {
                return Err(S3Error::InvalidArgument);
            }
            Ok((value as usize).min(max))
        }
    }
}

/// Unwraps a PUT body: pass-through for plain payloads, chunk-decoded with
/// rolling signature verification for `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
/// bodies. A failed chunk surfaces as `SignatureDoesNotMatch`.
pub(crate) fn decode_put_body(
    headers: &HeaderMap,
    body: Bytes,
    auth: Option<&SigV4Context>,
) -> Result<Bytes, S3Error> {
    let streaming = headers
        .get("x-amz-content-sha256")
        .and_then(|v| v.to_str().ok())
        == Some(STREAMING_PAYLOAD);
    if !streaming {
        return Ok(body);
    }

    let auth = auth.ok_or_else(|| {
        S3Error::InternalError("streaming upload without authentication state".to_string())
    })?;
    SignedChunkReader::new(body, auth)
        .decode_to_end()
        .map_err(|ChunkError::InvalidChunk| S3Error::SignatureDoesNotMatch)
}

/// An empty-bodied response with the given status.
pub(crate) fn empty_response(status: axum::http::StatusCode) -> Response {
    Response::builder().status(status).body(Body::empty()).unwrap()
}

/// Withholds the body, keeping the status and every metadata header. HEAD
/// responses answer with exactly the headers their GET counterpart would
/// have carried.
pub(crate) fn without_body(response: Response) -> Response {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Body::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bounded_form_value_defaults_and_clamps() {
        let empty = Params::new();
        assert_eq!(bounded_form_value(&empty, "max-keys", 5000, 1000).unwrap(), 1000);

        let p = params(&[("max-keys", "250")]);
        assert_eq!(bounded_form_value(&p, "max-keys", 5000, 1000).unwrap(), 250);

        // hadoop-style over-asking clamps instead of failing
        let p = params(&[("max-keys", "99999")]);
        assert_eq!(bounded_form_value(&p, "max-keys", 5000, 1000).unwrap(), 5000);
    }

    #[test]
    fn bounded_form_value_rejects_garbage() {
        for raw in ["-1", "abc", "1.5"] {
            let p = params(&[("max-keys", raw)]);
            assert_eq!(
                bounded_form_value(&p, "max-keys", 5000, 1000),
                Err(S3Error::InvalidArgument),
                "raw: {raw}"
            );
        }
    }
}
