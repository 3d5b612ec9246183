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

//! Router and dispatch over the S3 REST surface.
//!
//! Dispatch is declarative over (method, path, query-presence,
//! header-presence). Two path subspaces exist, `/{bucket}` and
//! `/{bucket}/{key}`, each with a trailing-slash twin routed to the same
//! handlers; no redirects are issued because some clients refuse to
//! re-sign a redirected request. Unsupported subresources are checked
//! ahead of the real routes so they win the match.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Extension, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::middleware as axum_middleware;
use axum::response::Response;
use axum::routing::{get, head, MethodRouter};
use axum::Router;
use bytes::Bytes;
use s3gate_core::{BucketOrigin, MultipartOrigin, ObjectOrigin, ServiceOrigin};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::canonical::{form_decode, is_valid_bucket_name};
use crate::auth::signature_v4::SigV4Context;
use crate::auth::SecretKeys;
use crate::handlers::{self, Params};
use crate::middleware::{
    auth_middleware, body_validation_middleware, etag_quoting_middleware, request_id_middleware,
    RequestContext,
};
use crate::s3::errors::S3Error;
use crate::s3::xml;

/// Default deadline for reading a request body into memory.
pub const DEFAULT_READ_BODY_TIMEOUT: Duration = Duration::from_secs(60);

/// Bucket subresources answered with `NotImplemented`, per method.
/// The versioning family is here deliberately; versioned storage is out of
/// scope for this gateway.
const BUCKET_GET_NOT_IMPLEMENTED: &[&str] = &[
    "accelerate", "acl", "analytics", "cors", "encryption", "inventory", "lifecycle", "logging",
    "metrics", "notification", "object-lock", "policy", "policyStatus", "publicAccessBlock",
    "requestPayment", "tagging", "website", "versioning", "versions",
];
const BUCKET_PUT_NOT_IMPLEMENTED: &[&str] = &[
    "accelerate", "acl", "analytics", "cors", "encryption", "inventory", "lifecycle", "logging",
    "metrics", "notification", "object-lock", "policy", "publicAccessBlock", "replication",
    "requestPayment", "tagging", "website", "versioning",
];
const BUCKET_DELETE_NOT_IMPLEMENTED: &[&str] = &[
    "analytics", "cors", "encryption", "inventory", "lifecycle", "metrics", "policy",
    "publicAccessBlock", "replication", "tagging", "website",
];

/// Object subresources answered with `NotImplemented`, per method.
const OBJECT_GET_NOT_IMPLEMENTED: &[&str] = &["acl", "legal-hold", "retention", "tagging", "torrent"];
const OBJECT_PUT_NOT_IMPLEMENTED: &[&str] = &["acl", "legal-hold", "retention", "tagging"];
const OBJECT_POST_NOT_IMPLEMENTED: &[&str] = &["restore", "select"];

/// Shared state for the request pipeline.
#[derive(Clone)]
pub struct AppState {
    /// Service-level origin surface.
    pub service: Arc<dyn ServiceOrigin>,
    /// Bucket-level origin surface.
    pub bucket: Arc<dyn BucketOrigin>,
    /// Object-level origin surface.
    pub object: Arc<dyn ObjectOrigin>,
    /// Multipart origin surface.
    pub multipart: Arc<dyn MultipartOrigin>,
    /// Credential lookup for SigV4.
    pub secrets: Arc<dyn SecretKeys>,
    /// Maximum accepted `Content-Length`; 0 means unlimited.
    pub max_body_size: u32,
    /// Deadline for reading a request body into memory.
    pub read_body_timeout: Duration,
}

impl AppState {
    /// Creates state backed by one origin implementing all four capability
    /// surfaces. Backends supporting only a subset can assemble the struct
    /// directly and fill the gaps with `UnimplementedOrigin`.
    pub fn new<O>(origin: Arc<O>, secrets: Arc<dyn SecretKeys>) -> Self
    where
        O: ServiceOrigin + BucketOrigin + ObjectOrigin + MultipartOrigin + 'static,
    {
        Self {
            service: origin.clone(),
            bucket: origin.clone(),
            object: origin.clone(),
            multipart: origin,
            secrets,
            max_body_size: 0,
            read_body_timeout: DEFAULT_READ_BODY_TIMEOUT,
        }
    }

    /// Caps the accepted `Content-Length`; 0 disables the cap.
    pub fn with_max_body_size(mut self, max_body_size: u32) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Sets the body-read deadline.
    pub fn with_read_body_timeout(mut self, timeout: Duration) -> Self {
        self.read_body_timeout = timeout;
        self
    }
}

/// Builds the gateway router with the full middleware stack.
pub fn create_router(state: AppState) -> Router {
    let body_limit = if state.max_body_size > 0 {
        DefaultBodyLimit::max(state.max_body_size as usize)
    } else {
        DefaultBodyLimit::disable()
    };

    let s3 = Router::new()
        .route("/", get(service_get))
        .route("/", head(service_head))
        .route("/:bucket", bucket_routes())
        .route("/:bucket/", bucket_routes())
        .route("/:bucket/*key", object_routes())
        .fallback(not_found)
        // stack order is significant: request ID, ETag quoting, auth,
        // body validation
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(request_id_middleware))
                .layer(axum_middleware::from_fn(etag_quoting_middleware))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                ))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    body_validation_middleware,
                )),
        );

    Router::new()
        .route("/health", get(health))
        .merge(s3)
        .layer(TraceLayer::new_for_http())
        .layer(body_limit)
        .with_state(state)
}

fn bucket_routes() -> MethodRouter<AppState> {
    get(bucket_get)
        .head(bucket_head)
        .put(bucket_put)
        .post(bucket_post)
        .delete(bucket_delete)
        .fallback(method_not_allowed)
}

fn object_routes() -> MethodRouter<AppState> {
    get(object_get)
        .head(object_head)
        .put(object_put)
        .post(object_post)
        .delete(object_delete)
        .fallback(method_not_allowed)
}

/// Splits a raw query string into decoded name/value pairs, first value
/// per name. Valueless parameters (subresource markers like `?delete`)
/// map to the empty string.
fn parse_query(raw: Option<&str>) -> Params {
    let mut params = Params::new();
    let Some(raw) = raw else {
        return params;
    };
    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let mut parts = pair.splitn(2, '=');
        let name = form_decode(parts.next().unwrap_or(""));
        let value = form_decode(parts.next().unwrap_or(""));
        params.entry(name).or_insert(value);
    }
    params
}

fn first_not_implemented<'a>(params: &Params, names: &[&'a str]) -> Option<&'a str> {
    names.iter().copied().find(|name| params.contains_key(*name))
}

async fn health() -> &'static str {
    "OK"
}

/// `GET /` - ListBuckets.
async fn service_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    handlers::service::list_buckets(&state, &ctx).await
}

/// `HEAD /` - ListBuckets headers only.
async fn service_head(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Response {
    handlers::service::head_buckets(&state, &ctx).await
}

async fn bucket_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if first_not_implemented(&params, BUCKET_GET_NOT_IMPLEMENTED).is_some() {
        return handlers::not_implemented(&ctx);
    }
    if params.contains_key("uploads") {
        return handlers::multipart::list_uploads(&state, &ctx, &bucket, &params).await;
    }
    if params.contains_key("location") {
        return handlers::bucket::get_location(&state, &ctx, &bucket).await;
    }
    handlers::bucket::list_objects(&state, &ctx, &bucket, &params).await
}

/// HEAD on a bucket always reaches the listing handler: only the
/// catch-all `GET|HEAD` route carries HEAD, so query subresources do not
/// re-route it.
async fn bucket_head(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return handlers::without_body(xml::error_response(&ctx, &S3Error::InvalidBucketName));
    }
    let params = parse_query(query.as_deref());
    handlers::bucket::head_bucket(&state, &ctx, &bucket, &params).await
}

async fn bucket_put(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if first_not_implemented(&params, BUCKET_PUT_NOT_IMPLEMENTED).is_some() {
        return handlers::not_implemented(&ctx);
    }
    handlers::bucket::create_bucket(&state, &ctx, &bucket).await
}

async fn bucket_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if params.contains_key("delete") {
        return handlers::bucket::delete_objects(&state, &ctx, &bucket, &body).await;
    }
    // no other bucket-level POST subresource is supported
    handlers::not_implemented(&ctx)
}

async fn bucket_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(bucket): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if first_not_implemented(&params, BUCKET_DELETE_NOT_IMPLEMENTED).is_some() {
        return handlers::not_implemented(&ctx);
    }
    handlers::bucket::delete_bucket(&state, &ctx, &bucket).await
}

async fn object_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((bucket, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if first_not_implemented(&params, OBJECT_GET_NOT_IMPLEMENTED).is_some() {
        return handlers::not_implemented(&ctx);
    }
    if params.contains_key("uploadId") {
        return handlers::multipart::list_parts(&state, &ctx, &bucket, &key, &params).await;
    }
    handlers::object::get_object(&state, &ctx, &bucket, &key, &params, &headers).await
}

/// HEAD on an object always reaches the metadata handler; multipart and
/// subresource queries only re-route GET.
async fn object_head(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((bucket, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return handlers::without_body(xml::error_response(&ctx, &S3Error::InvalidBucketName));
    }
    let params = parse_query(query.as_deref());
    handlers::object::head_object(&state, &ctx, &bucket, &key, &params, &headers).await
}

async fn object_put(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((bucket, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    auth: Option<Extension<SigV4Context>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    let auth = auth.as_ref().map(|ext| &ext.0);
    if first_not_implemented(&params, OBJECT_PUT_NOT_IMPLEMENTED).is_some() {
        return handlers::not_implemented(&ctx);
    }
    if params.contains_key("uploadId") {
        return handlers::multipart::upload_part(
            &state, &ctx, &bucket, &key, &params, &headers, body, auth,
        )
        .await;
    }
    if headers.contains_key("x-amz-copy-source") {
        return handlers::object::copy_object(&state, &ctx, &bucket, &key, &headers).await;
    }
    handlers::object::put_object(&state, &ctx, &bucket, &key, &headers, body, auth).await
}

async fn object_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((bucket, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if first_not_implemented(&params, OBJECT_POST_NOT_IMPLEMENTED).is_some() {
        return handlers::not_implemented(&ctx);
    }
    if params.contains_key("uploads") {
        return handlers::multipart::init_upload(&state, &ctx, &bucket, &key).await;
    }
    if params.contains_key("uploadId") {
        return handlers::multipart::complete_upload(
            &state, &ctx, &bucket, &key, &params, &headers, body,
        )
        .await;
    }
    handlers::not_implemented(&ctx)
}

async fn object_delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((bucket, key)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Response {
    if !is_valid_bucket_name(&bucket) {
        return xml::error_response(&ctx, &S3Error::InvalidBucketName);
    }
    let params = parse_query(query.as_deref());
    if params.contains_key("uploadId") {
        return handlers::multipart::abort_upload(&state, &ctx, &bucket, &key, &params).await;
    }
    handlers::object::delete_object(&state, &ctx, &bucket, &key, &params).await
}

/// Path matched but no route accepted the method.
async fn method_not_allowed(
    Extension(ctx): Extension<RequestContext>,
    uri: Uri,
) -> Response {
    error!(path = %uri.path(), "method not allowed");
    xml::error_response(&ctx, &S3Error::MethodNotAllowed)
}

/// No route matched the path at all. The error code depends on whether the
/// first path segment could name a bucket.
async fn not_found(Extension(ctx): Extension<RequestContext>, uri: Uri) -> Response {
    info!(path = %uri.path(), "path not found");
    let first_segment = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    if is_valid_bucket_name(first_segment) {
        xml::error_response(&ctx, &S3Error::NoSuchKey)
    } else {
        xml::error_response(&ctx, &S3Error::InvalidBucketName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_forms() {
        let params = parse_query(Some("delete&prefix=a%2Fb&max-keys=10"));
        assert!(params.contains_key("delete"));
        assert_eq!(params.get("delete").map(String::as_str), Some(""));
        assert_eq!(params.get("prefix").map(String::as_str), Some("a/b"));
        assert_eq!(params.get("max-keys").map(String::as_str), Some("10"));

        assert!(parse_query(None).is_empty());
        assert!(parse_query(Some("")).is_empty());
    }

    #[test]
    fn parse_query_first_value_wins() {
        let params = parse_query(Some("k=1&k=2"));
        assert_eq!(params.get("k").map(String::as_str), Some("1"));
    }

    #[test]
    fn parse_query_plus_is_space() {
        let params = parse_query(Some("prefix=a+b"));
        assert_eq!(params.get("prefix").map(String::as_str), Some("a b"));
    }
}
