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

//! Object handlers: GET/PUT/COPY/DELETE with conditional headers and HTTP
//! range semantics.

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3gate_core::types::GetObjectResult;
use tracing::{debug, info};

use crate::auth::canonical;
use crate::auth::signature_v4::SigV4Context;
use crate::handlers::{decode_put_body, empty_response, without_body, Params};
use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::etag::{add_etag_quotes, etags_match};
use crate::s3::xml;
use crate::server::AppState;

/// Outcome of evaluating the conditional request headers.
enum Precondition {
    Proceed,
    Failed,
    NotModified,
}

/// `GET|HEAD /{bucket}/{key}` - GetObject.
pub async fn get_object(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
    headers: &HeaderMap,
) -> Response {
    let version = params.get("versionId").map(String::as_str);
    let result = match state.object.get_object(bucket, key, version).await {
        Ok(result) => result,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };

    if result.delete_marker {
        let mut response = xml::error_response(ctx, &S3Error::NoSuchKey);
        set_header(&mut response, "x-amz-delete-marker", "true");
        if let Some(version) = &result.version {
            set_header(&mut response, "x-amz-version-id", version);
        }
        return response;
    }

    match evaluate_preconditions(headers, &result.etag, result.mod_time) {
        Precondition::Failed => return xml::error_response(ctx, &S3Error::PreconditionFailed),
        Precondition::NotModified => {
            let mut response = empty_response(StatusCode::NOT_MODIFIED);
            set_header(&mut response, header::ETAG.as_str(), &add_etag_quotes(&result.etag));
            return response;
        }
        Precondition::Proceed => {}
    }

    let total = result.content.len();
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let (status, slice, content_range) = match range {
        None => (StatusCode::OK, result.content.clone(), None),
        Some(spec) => match parse_range(spec, total) {
            Some((start, end)) => (
                StatusCode::PARTIAL_CONTENT,
                result.content.slice(start..=end),
                Some(format!("bytes {start}-{end}/{total}")),
            ),
            None => {
                let mut response = empty_response(StatusCode::RANGE_NOT_SATISFIABLE);
                set_header(&mut response, header::CONTENT_RANGE.as_str(), &format!("bytes */{total}"));
                return response;
            }
        },
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_LENGTH, slice.len())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, add_etag_quotes(&result.etag))
        .header(
            header::LAST_MODIFIED,
            result.mod_time.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        );
    if let Some(content_range) = content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }
    if let Some(version) = &result.version {
        builder = builder.header("x-amz-version-id", version);
    }
    builder.body(Body::from(slice)).unwrap()
}

/// `HEAD /{bucket}/{key}` - HeadObject.
///
/// Same status and metadata headers as GetObject - Content-Length, ETag,
/// Last-Modified, range and conditional handling, delete-marker and
/// version headers - with an empty body.
pub async fn head_object(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
    headers: &HeaderMap,
) -> Response {
    without_body(get_object(state, ctx, bucket, key, params, headers).await)
}

/// `PUT /{bucket}/{key}` - PutObject.
///
/// Streaming signed payloads are unwrapped through the chunk decoder,
/// primed with the SigV4 state the auth middleware captured.
pub async fn put_object(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    headers: &HeaderMap,
    body: Bytes,
    auth: Option<&SigV4Context>,
) -> Response {
    if let Err(err) = require_content_length(headers) {
        return xml::error_response(ctx, &err);
    }

    let data = match decode_put_body(headers, body, auth) {
        Ok(data) => data,
        Err(err) => return xml::error_response(ctx, &err),
    };

    info!(bucket, key, size = data.len(), "put object");
    let result = match state.object.put_object(bucket, key, data).await {
        Ok(result) => result,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };

    let mut response = empty_response(StatusCode::OK);
    if !result.etag.is_empty() {
        set_header(&mut response, header::ETAG.as_str(), &add_etag_quotes(&result.etag));
    }
    if let Some(version) = &result.version {
        set_header(&mut response, "x-amz-version-id", version);
    }
    response
}

/// `PUT /{bucket}/{key}` with `x-amz-copy-source` - CopyObject.
pub async fn copy_object(
    state: &AppState,
    ctx: &RequestContext,
    dest_bucket: &str,
    dest_key: &str,
    headers: &HeaderMap,
) -> Response {
    let source_header = headers
        .get("x-amz-copy-source")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let (src_bucket, src_key, src_version) = match parse_copy_source(source_header) {
        Ok(parsed) => parsed,
        Err(err) => return xml::error_response(ctx, &err),
    };

    if src_bucket.is_empty() {
        return xml::error_response(ctx, &S3Error::InvalidBucketName);
    }
    if src_key.is_empty() {
        return xml::error_response(ctx, &S3Error::NoSuchKey);
    }
    if src_bucket == dest_bucket && src_key == dest_key && src_version.is_none() {
        // Copying over itself would only make sense as a metadata rewrite,
        // which this gateway does not support.
        return xml::error_response(
            ctx,
            &S3Error::InvalidRequest("source and destination are the same".to_string()),
        );
    }

    let source = match state
        .object
        .get_object(&src_bucket, &src_key, src_version.as_deref())
        .await
    {
        Ok(source) => source,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    if source.delete_marker {
        return xml::error_response(ctx, &S3Error::NoSuchKey);
    }

    if !copy_preconditions_hold(headers, &source) {
        return xml::error_response(ctx, &S3Error::PreconditionFailed);
    }

    let dest_version = match state
        .object
        .copy_object(&src_bucket, &src_key, &source, dest_bucket, dest_key)
        .await
    {
        Ok(version) => version,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    info!(%src_bucket, %src_key, dest_bucket, dest_key, "copied object");

    let body = xml::copy_object_body(&source.etag, source.mod_time);
    let mut response = xml::xml_response(ctx, StatusCode::OK, body);
    if let Some(version) = &source.version {
        set_header(&mut response, "x-amz-copy-source-version-id", version);
    }
    if let Some(version) = &dest_version {
        set_header(&mut response, "x-amz-version-id", version);
    }
    response
}

/// `DELETE /{bucket}/{key}` - DeleteObject.
pub async fn delete_object(
    state: &AppState,
    ctx: &RequestContext,
    bucket: &str,
    key: &str,
    params: &Params,
) -> Response {
    let version = params.get("versionId").map(String::as_str);
    let result = match state.object.delete_object(bucket, key, version).await {
        Ok(result) => result,
        Err(err) => return xml::error_response(ctx, &S3Error::from_origin(err)),
    };
    debug!(bucket, key, "deleted object");

    let mut response = empty_response(StatusCode::NO_CONTENT);
    if let Some(version) = &result.version {
        set_header(&mut response, "x-amz-version-id", version);
    }
    if result.delete_marker {
        set_header(&mut response, "x-amz-delete-marker", "true");
    }
    response
}

/// An identity body must declare its length.
pub(crate) fn require_content_length(headers: &HeaderMap) -> Result<(), S3Error> {
    let encodings: Vec<&str> = headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let identity = encodings.is_empty() || encodings.iter().any(|v| v.contains("identity"));
    if identity && headers.get(header::CONTENT_LENGTH).is_none() {
        return Err(S3Error::MissingContentLength);
    }
    Ok(())
}

/// Splits `x-amz-copy-source` into bucket, key, and optional version.
///
/// The header is URL-encoded and comes as `bucket/key` or `/bucket/key`,
/// optionally with `?versionId=...`.
fn parse_copy_source(raw: &str) -> Result<(String, String, Option<String>), S3Error> {
    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };
    let version = query.and_then(|query| {
        query.split('&').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == "versionId").then(|| canonical::form_decode(value))
        })
    });

    let path = canonical::percent_decode(path);
    let path = path.strip_prefix('/').unwrap_or(&path);
    let (bucket, key) = match path.split_once('/') {
        Some((bucket, key)) => (bucket.to_string(), key.to_string()),
        None => (path.to_string(), String::new()),
    };
    Ok((bucket, key, version))
}

/// Evaluates `If-Match` / `If-Unmodified-Since` / `If-None-Match` /
/// `If-Modified-Since` for reads, in RFC 7232 order. Absent headers are
/// satisfied.
fn evaluate_preconditions(
    headers: &HeaderMap,
    etag: &str,
    mod_time: DateTime<Utc>,
) -> Precondition {
    if let Some(expected) = header_str(headers, "if-match") {
        if expected != "*" && !etags_match(expected, etag) {
            return Precondition::Failed;
        }
    } else if let Some(since) = http_date(headers, "if-unmodified-since") {
        if mod_time.timestamp() > since.timestamp() {
            return Precondition::Failed;
        }
    }

    if let Some(expected) = header_str(headers, "if-none-match") {
        if expected == "*" || etags_match(expected, etag) {
            return Precondition::NotModified;
        }
    } else if let Some(since) = http_date(headers, "if-modified-since") {
        if mod_time.timestamp() <= since.timestamp() {
            return Precondition::NotModified;
        }
    }

    Precondition::Proceed
}

/// Evaluates the four `x-amz-copy-source-if-*` headers against the source
/// object. Absent headers are satisfied; any failure is
/// `PreconditionFailed`.
fn copy_preconditions_hold(headers: &HeaderMap, source: &GetObjectResult) -> bool {
    if let Some(expected) = header_str(headers, "x-amz-copy-source-if-match") {
        if !etags_match(expected, &source.etag) {
            return false;
        }
    }
    if let Some(expected) = header_str(headers, "x-amz-copy-source-if-none-match") {
        if etags_match(expected, &source.etag) {
            return false;
        }
    }
    if let Some(since) = http_date(headers, "x-amz-copy-source-if-unmodified-since") {
        if source.mod_time.timestamp() > since.timestamp() {
            return false;
        }
    }
    if let Some(since) = http_date(headers, "x-amz-copy-source-if-modified-since") {
        if source.mod_time.timestamp() <= since.timestamp() {
            return false;
        }
    }
    true
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Parses an HTTP-date header; unparseable dates satisfy the condition by
/// being ignored.
fn http_date(headers: &HeaderMap, name: &str) -> Option<DateTime<Utc>> {
    header_str(headers, name)
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a `bytes=` range spec against an entity of `total` bytes.
/// Returns the inclusive byte window, or `None` when unsatisfiable.
fn parse_range(spec: &str, total: usize) -> Option<(usize, usize)> {
    let spec = spec.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;

    if start.is_empty() {
        // suffix form: last N bytes
        let suffix: usize = end.parse().ok()?;
        if suffix == 0 || total == 0 {
            return None;
        }
        let start = total.saturating_sub(suffix);
        return Some((start, total - 1));
    }

    let start: usize = start.parse().ok()?;
    if start >= total {
        return None;
    }
    let end = if end.is_empty() {
        total - 1
    } else {
        end.parse::<usize>().ok()?.min(total - 1)
    };
    if end < start {
        return None;
    }
    Some((start, end))
}

fn set_header(response: &mut Response, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        axum::http::HeaderName::from_bytes(name.as_bytes()),
        axum::http::HeaderValue::from_str(value),
    ) {
        response.headers_mut().insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parse_range_forms() {
        assert_eq!(parse_range("bytes=0-4", 10), Some((0, 4)));
        assert_eq!(parse_range("bytes=5-", 10), Some((5, 9)));
        assert_eq!(parse_range("bytes=-3", 10), Some((7, 9)));
        assert_eq!(parse_range("bytes=0-99", 10), Some((0, 9)));
        assert_eq!(parse_range("bytes=10-", 10), None);
        assert_eq!(parse_range("bytes=4-2", 10), None);
        assert_eq!(parse_range("lines=1-2", 10), None);
        assert_eq!(parse_range("bytes=-0", 10), None);
    }

    #[test]
    fn copy_source_forms() {
        assert_eq!(
            parse_copy_source("bucket/key").unwrap(),
            ("bucket".to_string(), "key".to_string(), None)
        );
        assert_eq!(
            parse_copy_source("/bucket/nested/key").unwrap(),
            ("bucket".to_string(), "nested/key".to_string(), None)
        );
        assert_eq!(
            parse_copy_source("bucket/my%20key").unwrap(),
            ("bucket".to_string(), "my key".to_string(), None)
        );
        assert_eq!(
            parse_copy_source("bucket/key?versionId=v1").unwrap(),
            ("bucket".to_string(), "key".to_string(), Some("v1".to_string()))
        );
        assert_eq!(
            parse_copy_source("bucket").unwrap(),
            ("bucket".to_string(), String::new(), None)
        );
    }

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn preconditions_if_match() {
        let now = Utc::now();
        let headers = headers_with("if-match", "\"etag1\"");
        assert!(matches!(
            evaluate_preconditions(&headers, "etag1", now),
            Precondition::Proceed
        ));
        assert!(matches!(
            evaluate_preconditions(&headers, "other", now),
            Precondition::Failed
        ));
    }

    #[test]
    fn preconditions_if_none_match() {
        let now = Utc::now();
        let headers = headers_with("if-none-match", "etag1");
        assert!(matches!(
            evaluate_preconditions(&headers, "etag1", now),
            Precondition::NotModified
        ));
        assert!(matches!(
            evaluate_preconditions(&headers, "other", now),
            Precondition::Proceed
        ));
    }

    #[test]
    fn copy_preconditions_absent_is_satisfied() {
        let source = GetObjectResult {
            etag: "e".to_string(),
            version: None,
            delete_marker: false,
            mod_time: Utc::now(),
            content: Bytes::new(),
        };
        assert!(copy_preconditions_hold(&HeaderMap::new(), &source));
    }

    #[test]
    fn copy_preconditions_match_and_dates() {
        let mod_time = DateTime::parse_from_rfc2822("Fri, 24 May 2013 00:00:00 GMT")
            .unwrap()
            .with_timezone(&Utc);
        let source = GetObjectResult {
            etag: "e1".to_string(),
            version: None,
            delete_marker: false,
            mod_time,
            content: Bytes::new(),
        };

        assert!(copy_preconditions_hold(
            &headers_with("x-amz-copy-source-if-match", "\"e1\""),
            &source
        ));
        assert!(!copy_preconditions_hold(
            &headers_with("x-amz-copy-source-if-match", "\"e2\""),
            &source
        ));
        assert!(!copy_preconditions_hold(
            &headers_with("x-amz-copy-source-if-none-match", "e1"),
            &source
        ));
        // modified since an earlier date: satisfied
        assert!(copy_preconditions_hold(
            &headers_with(
                "x-amz-copy-source-if-modified-since",
                "Thu, 23 May 2013 00:00:00 GMT"
            ),
            &source
        ));
        // unmodified since an earlier date: fails
        assert!(!copy_preconditions_hold(
            &headers_with(
                "x-amz-copy-source-if-unmodified-since",
                "Thu, 23 May 2013 00:00:00 GMT"
            ),
            &source
        ));
        // garbage dates are ignored
        assert!(copy_preconditions_hold(
            &headers_with("x-amz-copy-source-if-unmodified-since", "not a date"),
            &source
        ));
    }

    #[test]
    fn content_length_requirement() {
        let mut headers = HeaderMap::new();
        assert!(require_content_length(&headers).is_err());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("5"));
        assert!(require_content_length(&headers).is_ok());

        // chunked transfer does not need a declared length
        let mut headers = HeaderMap::new();
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        assert!(require_content_length(&headers).is_ok());

        // but identity does
        let mut headers = HeaderMap::new();
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("identity"));
        assert!(require_content_length(&headers).is_err());
    }
}
