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

//! Entity-tag quoting middleware.
//!
//! Some clients send unquoted etags in `ETag`, `If-Match` and
//! `If-None-Match`; normalize them to the quoted wire form before anything
//! downstream compares them.
//! ref: <https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/ETag>

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::s3::etag::add_etag_quotes;

const ETAG_HEADERS: [&str; 3] = ["etag", "if-match", "if-none-match"];

/// Quotes unquoted entity-tag request headers in place.
pub async fn etag_quoting_middleware(mut request: Request, next: Next) -> Response {
    for name in ETAG_HEADERS {
        let Some(value) = request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
        else {
            continue;
        };
        let quoted = add_etag_quotes(&value);
        if quoted != value {
            if let Ok(quoted) = HeaderValue::from_str(&quoted) {
                request.headers_mut().insert(name, quoted);
            }
        }
    }
    next.run(request).await
}
