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

//! Bucket-level handlers: lifecycle, location, object listing, and the
//! multi-object delete.

use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use s3gate_core::types::{DEFAULT_MAX_KEYS, MAX_KEYS_CEILING};
use tracing::{debug, info};

use crate::handlers::{bounded_form_value, empty_response, form_value, without_body, Params};
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::xml::{self, DeleteErrorEntry, DeletedEntry};
use crate::server::AppState;

/// `GET /{bucket}` - ListObjects.
pub async fn list_objects(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    params: &Params,
) -> Response {
    let max_keys = match bounded_form_value(params, "max-keys", MAX_KEYS_CEILING, DEFAULT_MAX_KEYS)
    {
        Ok(max_keys) => max_keys,
        Err(err) => return xml::error_response(ctx, &err),
    };
    let prefix = form_value(params, "prefix");
    let marker = form_value(params, "marker");
    let delimiter = form_value(params, "delimiter");

    let result = match state
        .bucket
        .list_objects(bucket, prefix, marker, delimiter, max_keys)
        .await
    {
        Ok(result) => result,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    debug!(
        bucket,
        prefix,
        contents = result.contents.len(),
        common_prefixes = result.common_prefixes.len(),
        truncated = result.is_truncated,
        "listed objects"
    );

    // NextMarker is the highest key or rolled-up prefix in the page.
    let next_marker = if result.is_truncated {
        result
            .contents
            .iter()
            .map(|object| object.key.as_str())
            .chain(result.common_prefixes.iter().map(String::as_str))
            .max()
            .map(str::to_owned)
    } else {
        None
    };

    let body = xml::list_objects_body(
        bucket,
        prefix,
        marker,
        delimiter,
        max_keys,
        &result,
        next_marker.as_deref(),
    );
    xml::xml_response(ctx, StatusCode::OK, body)
}

/// `HEAD /{bucket}` - routed like ListObjects with the body withheld.
///
/// Only the catch-all route carries HEAD, so query subresources never
/// redirect a HEAD elsewhere.
pub async fn head_bucket(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    params: &Params,
) -> Response {
    without_body(list_objects(state, ctx, bucket, params).await)
}

/// `PUT /{bucket}` - CreateBucket.
pub async fn create_bucket(state: &AppState, ctx: &RequestContext, bucket: &str) -> Response {
    if let Err(err) = state.bucket.create_bucket(bucket).await {
        return xml::error_response(ctx, &S3Error::from_origin(err));
    }
    info!(bucket, "created bucket");
    empty_response(StatusCode::OK)
}

/// `DELETE /{bucket}` - DeleteBucket.
pub async fn delete_bucket(state: &AppState, ctx: &RequestContext, bucket: &str) -> Response {
    if let Err(err) = state.bucket.delete_bucket(bucket).await {
        return xml::error_response(ctx, &S3Error::from_origin(err));
    }
    info!(bucket, "deleted bucket");
    empty_response(StatusCode::NO_CONTENT)
}

/// `GET /{bucket}?location` - GetBucketLocation.
pub async fn get_location(state: &AppState, ctx: &RequestContext, bucket: &str) -> Response {
    let location = match state.bucket.get_location(bucket).await {
        Ok(location) => location,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    xml::xml_response(ctx, StatusCode::OK, xml::location_body(&location))
}

/// `POST /{bucket}?delete` - multi-object delete.
///
/// Each listed object is deleted individually; failures are reported per
/// entry and never abort the batch. `<Quiet>true</Quiet>` suppresses the
/// success entries.
pub async fn delete_objects(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    body: &Bytes,
) -> Response {
    let request = match xml::parse_delete_request(body) {
        Ok(request) => request,
        Err(err) => return xml::error_response(ctx, &err),
    };

    let mut deleted = Vec::new();
    let mut errors = Vec::new();
    for target in &request.objects {
        match state
            .object
            .delete_object(bucket, &target.key, target.version.as_deref())
            .await
        {
            Ok(result) => {
                let delete_marker_version = result.delete_marker.then(|| result.version.clone());
                deleted.push(DeletedEntry {
                    key: target.key.clone(),
                    version: target.version.clone(),
                    delete_marker: result.delete_marker,
                    delete_marker_version: delete_marker_version.flatten(),
                });
            }
            Err(err) => {
                let s3_err = S3Error::from_origin(err);
                errors.push(DeleteErrorEntry {
                    key: target.key.clone(),
                    code: s3_err.code().to_string(),
                    message: s3_err.to_string(),
                });
            }
        }
    }
    info!(
        bucket,
        deleted = deleted.len(),
        failed = errors.len(),
        quiet = request.quiet,
        "multi-object delete"
    );

    let body = xml::delete_result_body(&deleted, &errors, request.quiet);
    xml::xml_response(ctx, StatusCode::OK, body)
}
