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

//! Service-level handlers.

use axum::http::StatusCode;
use axum::response::Response;
use tracing::debug;

use crate::handlers::{gateway_owner, without_body};
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::xml;
use crate::server::AppState;

/// `GET /` - ListBuckets.
pub async fn list_buckets(state: &AppState, ctx: &RequestContext) -> Response {
    let buckets = match state.service.list_buckets().await {
        Ok(buckets) => buckets,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    debug!(count = buckets.len(), "listed buckets");

    let body = xml::list_buckets_body(&gateway_owner(), &buckets);
    xml::xml_response(ctx, StatusCode::OK, body)
}

/// `HEAD /` - ListBuckets with the body withheld.
pub async fn head_buckets(state: &AppState, ctx: &RequestContext) -> Response {
    without_body(list_buckets(state, ctx).await)
}
