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

//! Multipart-upload handlers.
//!
//! CompleteMultipartUpload is special: some origins take minutes to
//! assemble the object, so the origin call runs on a sibling task while
//! the response emits keep-alive whitespace. Once the 200 prelude is
//! committed the status cannot change; a late origin error is serialized
//! as an `<Error>` document into the open body.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use s3gate_core::types::{Part, DEFAULT_MAX_PARTS, DEFAULT_MAX_UPLOADS, MAX_PARTS_ALLOWED};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::auth::signature_v4::SigV4Context;
use crate::handlers::{
    bounded_form_value, decode_put_body, empty_response, form_value, Params,
};
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::etag::add_etag_quotes;
use crate::s3::xml;
use crate::server::AppState;

/// How long to wait before committing the streaming prelude, and between
/// keep-alive bytes afterwards.
const COMPLETE_KEEP_ALIVE: Duration = Duration::from_secs(10);

/// `GET /{bucket}?uploads` - ListMultipartUploads.
pub async fn list_uploads(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    params: &Params,
) -> Response {
    let max_uploads =
        match bounded_form_value(params, "max-uploads", DEFAULT_MAX_UPLOADS, DEFAULT_MAX_UPLOADS) {
            Ok(max_uploads) => max_uploads,
            Err(err) => return xml::error_response(ctx, &err),
        };
    let key_marker = form_value(params, "key-marker");
    // an upload-id marker is meaningless without a key marker
    let upload_id_marker = if key_marker.is_empty() {
        ""
    } else {
        form_value(params, "upload-id-marker")
    };

    let result = match state
        .multipart
        .list_uploads(bucket, key_marker, upload_id_marker, max_uploads)
        .await
    {
        Ok(result) => result,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };

    let (next_key_marker, next_upload_id_marker) = if result.is_truncated {
        (
            result.uploads.iter().map(|u| u.key.as_str()).max(),
            result.uploads.iter().map(|u| u.upload_id.as_str()).max(),
        )
    } else {
        (None, None)
    };

    let body = xml::list_uploads_body(
        bucket,
        key_marker,
        upload_id_marker,
        max_uploads,
        &result,
        next_key_marker,
        next_upload_id_marker,
    );
    xml::xml_response(ctx, StatusCode::OK, body)
}

/// `GET /{bucket}/{key}?uploadId` - ListParts.
pub async fn list_parts(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
) -> Response {
    let max_parts =
        match bounded_form_value(params, "max-parts", DEFAULT_MAX_PARTS, DEFAULT_MAX_PARTS) {
            Ok(max_parts) => max_parts,
            Err(err) => return xml::error_response(ctx, &err),
        };
    let part_number_marker =
        match bounded_form_value(params, "part-number-marker", MAX_PARTS_ALLOWED as usize, 0) {
            Ok(marker) => marker as u32,
            Err(err) => return xml::error_response(ctx, &err),
        };
    let upload_id = form_value(params, "uploadId");

    let result = match state
        .multipart
        .list_parts(bucket, key, upload_id, part_number_marker, max_parts)
        .await
    {
        Ok(result) => result,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };

    let next_part_number_marker = if result.is_truncated {
        result.parts.iter().map(|p| p.part_number).max()
    } else {
        None
    };

    let body = xml::list_parts_body(
        bucket,
        key,
        upload_id,
        part_number_marker,
        max_parts,
        &result,
        next_part_number_marker,
    );
    xml::xml_response(ctx, StatusCode::OK, body)
}

/// `POST /{bucket}/{key}?uploads` - CreateMultipartUpload.
pub async fn init_upload(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
) -> Response {
    let upload_id = match state.multipart.init_upload(bucket, key).await {
        Ok(upload_id) => upload_id,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    info!(bucket, key, %upload_id, "initiated multipart upload");

    let body = xml::initiate_upload_body(bucket, key, &upload_id);
    xml::xml_response(ctx, StatusCode::OK, body)
}

/// `PUT /{bucket}/{key}?partNumber=N&uploadId=X` - UploadPart.
pub async fn upload_part(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
    headers: &HeaderMap,
    body: Bytes,
    auth: Option<&SigV4Context>,
) -> Response {
    let part_number: u32 = match form_value(params, "partNumber").parse() {
        Ok(part_number) if (1..=MAX_PARTS_ALLOWED).contains(&part_number) => part_number,
        _ => return xml::error_response(ctx, &S3Error::InvalidArgument),
    };
    let upload_id = form_value(params, "uploadId");

    let data = match decode_put_body(headers, body, auth) {
        Ok(data) => data,
        Err(err) => return xml::error_response(ctx, &err),
    };

    let etag = match state
        .multipart
        .upload_part(bucket, key, upload_id, part_number, data)
        .await
    {
        Ok(etag) => etag,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };

    let mut response = empty_response(StatusCode::OK);
    if !etag.is_empty() {
        if let Ok(value) = axum::http::HeaderValue::from_str(&add_etag_quotes(&etag)) {
            response.headers_mut().insert(header::ETAG, value);
        }
    }
    response
}

/// `POST /{bucket}/{key}?uploadId=X` - CompleteMultipartUpload.
pub async fn complete_upload(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    if headers.get(header::CONTENT_LENGTH).is_none() {
        return xml::error_response(ctx, &S3Error::MissingContentLength);
    }
    let upload_id = form_value(params, "uploadId").to_string();

    let parts = match xml::parse_complete_request(&body) {
        Ok(parts) => parts,
        Err(err) => return xml::error_response(ctx, &err),
    };
    let ascending = parts.windows(2).all(|w| w[0].part_number < w[1].part_number);
    if parts.is_empty() || !ascending {
        return xml::error_response(ctx, &S3Error::InvalidPartOrder);
    }

    let parts: Vec<Part> = parts
        .into_iter()
        .map(|part| Part {
            etag: add_etag_quotes(&part.etag),
            ..part
        })
        .collect();

    // The origin call runs on a sibling task so the response can keep the
    // connection alive; the origin is invoked exactly once.
    let multipart = state.multipart.clone();
    let task_bucket = bucket.to_string();
    let task_key = key.to_string();
    let mut task = tokio::spawn(async move {
        multipart
            .complete_upload(&task_bucket, &task_key, &upload_id, &parts)
            .await
    });

    // Fast path: the origin finished within the first keep-alive period
    // and the response can carry a real status.
    match tokio::time::timeout(COMPLETE_KEEP_ALIVE, &mut task).await {
        Ok(joined) => {
            let result = match joined {
                Ok(result) => result,
                Err(join_err) => {
                    return xml::error_response(
                        ctx,
                        &S3Error::InternalError(join_err.to_string()),
                    )
                }
            };
            match result {
                Ok(done) => {
                    info!(bucket, key, "completed multipart upload");
                    let body = xml::complete_upload_body(&done.location, bucket, key, &done.etag);
                    let mut response = xml::xml_response(ctx, StatusCode::OK, body);
                    if let Some(version) = &done.version {
                        if let Ok(value) = axum::http::HeaderValue::from_str(version) {
                            response.headers_mut().insert("x-amz-version-id", value);
                        }
                    }
                    response
                }
                Err(err) => xml::error_response(ctx, &S3Error::from_origin(err)),
            }
        }
        Err(_elapsed) => {
            // Slow path: commit a 200 prelude now and whitespace-ping every
            // period until the origin returns. Errors from here on ride
            // inside the open body.
            let (tx, rx) = tokio::sync::mpsc::channel::<Bytes>(8);
            let task_ctx = ctx.clone();
            let bucket = bucket.to_string();
            let key = key.to_string();
            tokio::spawn(async move {
                if tx.send(Bytes::from_static(xml::XML_DECL.as_bytes())).await.is_err() {
                    task.abort();
                    return;
                }
                let mut ticker = tokio::time::interval(COMPLETE_KEEP_ALIVE);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                ticker.tick().await; // the first tick fires immediately
                loop {
                    tokio::select! {
                        joined = &mut task => {
                            let body = match joined {
                                Ok(Ok(done)) => {
                                    info!(%bucket, %key, "completed multipart upload");
                                    xml::complete_upload_body(&done.location, &bucket, &key, &done.etag)
                                }
                                Ok(Err(err)) => {
                                    let s3_err = S3Error::from_origin(err);
                                    warn!(%bucket, %key, code = s3_err.code(), "multipart completion failed after prelude");
                                    xml::error_body(s3_err.code(), &s3_err.to_string(), &task_ctx.resource, &task_ctx.id)
                                }
                                Err(join_err) => {
                                    let s3_err = S3Error::InternalError(join_err.to_string());
                                    xml::error_body(s3_err.code(), &s3_err.to_string(), &task_ctx.resource, &task_ctx.id)
                                }
                            };
                            let _ = tx.send(Bytes::from(body)).await;
                            return;
                        }
                        _ = ticker.tick() => {
                            if tx.send(Bytes::from_static(b" ")).await.is_err() {
                                // the client went away; stop assembling
                                task.abort();
                                return;
                            }
                        }
                    }
                }
            });

            let stream = ReceiverStream::new(rx).map(Ok::<Bytes, Infallible>);
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/xml")
                .header("x-amz-id-2", &ctx.id)
                .header("x-amz-request-id", &ctx.id)
                .body(Body::from_stream(stream))
                .unwrap()
        }
    }
}

/// `DELETE /{bucket}/{key}?uploadId=X` - AbortMultipartUpload.
pub async fn abort_upload(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
) -> Response {
    let upload_id = form_value(params, "uploadId");
    if let Err(err) = state.multipart.abort_upload(bucket, key, upload_id).await {
        return xml::error_response(ctx, &S3Error::from_origin(err));
    }
    info!(bucket, key, upload_id, "aborted multipart upload");
    empty_response(StatusCode::NO_CONTENT)
}
