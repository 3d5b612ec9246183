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

//! XML response framing and request body parsing.
//!
//! Responses are wire-compatible with the 2006-03-01 schema: every XML
//! response carries `Content-Type: application/xml`, the request ID in
//! `x-amz-id-2`/`x-amz-request-id`, the XML declaration, and the S3
//! namespace on document roots. Request bodies are parsed strictly;
//! anything unparseable maps to `MalformedXML`.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use s3gate_core::types::{
    Bucket, ListMultipartResult, ListObjectsResult, ListPartsResult, Owner, Part,
};

use crate::middleware::request_id::RequestContext;
use crate::s3::errors::S3Error;
use crate::s3::etag::strip_etag_quotes;

/// XML declaration emitted ahead of every document.
pub const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Namespace carried by every response document root.
pub const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Builds a complete XML response: status, framing headers, declaration,
/// and the document body.
pub fn xml_response(ctx: &RequestContext, status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/xml")
        .header("x-amz-id-2", &ctx.id)
        .header("x-amz-request-id", &ctx.id)
        .body(Body::from(format!("{XML_DECL}{body}")))
        .unwrap()
}

/// Renders an error from the taxonomy as its `<Error>` document.
pub fn error_response(ctx: &RequestContext, err: &S3Error) -> Response {
    let body = error_body(err.code(), &err.to_string(), &ctx.resource, &ctx.id);
    xml_response(ctx, err.status_code(), body)
}

/// The `<Error>` document body.
pub fn error_body(code: &str, message: &str, resource: &str, request_id: &str) -> String {
    format!(
        "<Error><Code>{}</Code><Message>{}</Message><Resource>{}</Resource><RequestId>{}</RequestId></Error>",
        escape_xml(code),
        escape_xml(message),
        escape_xml(resource),
        escape_xml(request_id)
    )
}

/// Quoted etag value; quotes are literal, only the inner value escapes.
fn etag_xml(etag: &str) -> String {
    format!("\"{}\"", escape_xml(strip_etag_quotes(etag)))
}

/// Owner block stamped on listings.
fn owner_xml(tag: &str, owner: &Owner) -> String {
    format!(
        "<{tag}><ID>{}</ID><DisplayName>{}</DisplayName></{tag}>",
        escape_xml(&owner.id),
        escape_xml(&owner.display_name)
    )
}

/// `ListAllMyBucketsResult` for ListBuckets.
pub fn list_buckets_body(owner: &Owner, buckets: &[Bucket]) -> String {
    let mut xml = format!("<ListAllMyBucketsResult xmlns=\"{S3_XMLNS}\">");
    xml.push_str(&owner_xml("Owner", owner));
    xml.push_str("<Buckets>");
    for bucket in buckets {
        xml.push_str(&format!(
            "<Bucket><Name>{}</Name><CreationDate>{}</CreationDate></Bucket>",
            escape_xml(&bucket.name),
            format_timestamp(bucket.creation_date)
        ));
    }
    xml.push_str("</Buckets></ListAllMyBucketsResult>");
    xml
}

/// `ListBucketResult` for ListObjects.
#[allow(clippy::too_many_arguments)]
pub fn list_objects_body(
    bucket: &str,
    prefix: &str,
    marker: &str,
    delimiter: &str,
    max_keys: usize,
    result: &ListObjectsResult,
    next_marker: Option<&str>,
) -> String {
    let mut xml = format!(
        "<ListBucketResult xmlns=\"{S3_XMLNS}\"><Name>{}</Name><Prefix>{}</Prefix><Marker>{}</Marker><MaxKeys>{}</MaxKeys>",
        escape_xml(bucket),
        escape_xml(prefix),
        escape_xml(marker),
        max_keys
    );
    if !delimiter.is_empty() {
        xml.push_str(&format!(
            "<Delimiter>{}</Delimiter>",
            escape_xml(delimiter)
        ));
    }
    xml.push_str(&format!(
        "<IsTruncated>{}</IsTruncated>",
        result.is_truncated
    ));
    if let Some(next_marker) = next_marker {
        xml.push_str(&format!(
            "<NextMarker>{}</NextMarker>",
            escape_xml(next_marker)
        ));
    }
    for object in &result.contents {
        xml.push_str(&format!(
            "<Contents><Key>{}</Key><LastModified>{}</LastModified><ETag>{}</ETag><Size>{}</Size><StorageClass>{}</StorageClass>{}</Contents>",
            escape_xml(&object.key),
            format_timestamp(object.last_modified),
            etag_xml(&object.etag),
            object.size,
            escape_xml(&object.storage_class),
            owner_xml("Owner", &object.owner)
        ));
    }
    for prefix in &result.common_prefixes {
        xml.push_str(&format!(
            "<CommonPrefixes><Prefix>{}</Prefix></CommonPrefixes>",
            escape_xml(prefix)
        ));
    }
    xml.push_str("</ListBucketResult>");
    xml
}

/// `LocationConstraint` for GetBucketLocation.
pub fn location_body(location: &str) -> String {
    format!(
        "<LocationConstraint xmlns=\"{S3_XMLNS}\">{}</LocationConstraint>",
        escape_xml(location)
    )
}

/// `CopyObjectResult` for CopyObject.
pub fn copy_object_body(etag: &str, last_modified: DateTime<Utc>) -> String {
    format!(
        "<CopyObjectResult xmlns=\"{S3_XMLNS}\"><LastModified>{}</LastModified><ETag>{}</ETag></CopyObjectResult>",
        format_timestamp(last_modified),
        etag_xml(etag)
    )
}

/// A successful entry in a DeleteObjects response.
#[derive(Debug, Clone)]
pub struct DeletedEntry {
    /// Deleted object key.
    pub key: String,
    /// Version the caller addressed, if any.
    pub version: Option<String>,
    /// Whether the deletion created a delete marker.
    pub delete_marker: bool,
    /// Version of the created delete marker, if any.
    pub delete_marker_version: Option<String>,
}

/// A failed entry in a DeleteObjects response.
#[derive(Debug, Clone)]
pub struct DeleteErrorEntry {
    /// Object key that failed to delete.
    pub key: String,
    /// S3 error code for the failure.
    pub code: String,
    /// Human-readable message for the failure.
    pub message: String,
}

/// `DeleteResult` for the multi-object delete. With `quiet`, successes are
/// suppressed and only errors are listed.
pub fn delete_result_body(
    deleted: &[DeletedEntry],
    errors: &[DeleteErrorEntry],
    quiet: bool,
) -> String {
    let mut xml = format!("<DeleteResult xmlns=\"{S3_XMLNS}\">");
    if !quiet {
        for entry in deleted {
            xml.push_str("<Deleted>");
            xml.push_str(&format!("<Key>{}</Key>", escape_xml(&entry.key)));
            if let Some(version) = &entry.version {
                xml.push_str(&format!("<VersionId>{}</VersionId>", escape_xml(version)));
            }
            if entry.delete_marker {
                xml.push_str("<DeleteMarker>true</DeleteMarker>");
                if let Some(version) = &entry.delete_marker_version {
                    xml.push_str(&format!(
                        "<DeleteMarkerVersionId>{}</DeleteMarkerVersionId>",
                        escape_xml(version)
                    ));
                }
            }
            xml.push_str("</Deleted>");
        }
    }
    for entry in errors {
        xml.push_str(&format!(
            "<Error><Key>{}</Key><Code>{}</Code><Message>{}</Message></Error>",
            escape_xml(&entry.key),
            escape_xml(&entry.code),
            escape_xml(&entry.message)
        ));
    }
    xml.push_str("</DeleteResult>");
    xml
}

/// `InitiateMultipartUploadResult`.
pub fn initiate_upload_body(bucket: &str, key: &str, upload_id: &str) -> String {
    format!(
        "<InitiateMultipartUploadResult xmlns=\"{S3_XMLNS}\"><Bucket>{}</Bucket><Key>{}</Key><UploadId>{}</UploadId></InitiateMultipartUploadResult>",
        escape_xml(bucket),
        escape_xml(key),
        escape_xml(upload_id)
    )
}

/// `CompleteMultipartUploadResult`.
pub fn complete_upload_body(location: &str, bucket: &str, key: &str, etag: &str) -> String {
    format!(
        "<CompleteMultipartUploadResult xmlns=\"{S3_XMLNS}\"><Location>{}</Location><Bucket>{}</Bucket><Key>{}</Key><ETag>{}</ETag></CompleteMultipartUploadResult>",
        escape_xml(location),
        escape_xml(bucket),
        escape_xml(key),
        etag_xml(etag)
    )
}

/// `ListMultipartUploadsResult`.
#[allow(clippy::too_many_arguments)]
pub fn list_uploads_body(
    bucket: &str,
    key_marker: &str,
    upload_id_marker: &str,
    max_uploads: usize,
    result: &ListMultipartResult,
    next_key_marker: Option<&str>,
    next_upload_id_marker: Option<&str>,
) -> String {
    let mut xml = format!(
        "<ListMultipartUploadsResult xmlns=\"{S3_XMLNS}\"><Bucket>{}</Bucket><KeyMarker>{}</KeyMarker><UploadIdMarker>{}</UploadIdMarker>",
        escape_xml(bucket),
        escape_xml(key_marker),
        escape_xml(upload_id_marker)
    );
    if let Some(marker) = next_key_marker {
        xml.push_str(&format!(
            "<NextKeyMarker>{}</NextKeyMarker>",
            escape_xml(marker)
        ));
    }
    if let Some(marker) = next_upload_id_marker {
        xml.push_str(&format!(
            "<NextUploadIdMarker>{}</NextUploadIdMarker>",
            escape_xml(marker)
        ));
    }
    xml.push_str(&format!(
        "<MaxUploads>{}</MaxUploads><IsTruncated>{}</IsTruncated>",
        max_uploads, result.is_truncated
    ));
    for upload in &result.uploads {
        xml.push_str(&format!(
            "<Upload><Key>{}</Key><UploadId>{}</UploadId>{}{}<StorageClass>{}</StorageClass><Initiated>{}</Initiated></Upload>",
            escape_xml(&upload.key),
            escape_xml(&upload.upload_id),
            owner_xml("Initiator", &upload.initiator),
            owner_xml("Owner", &upload.owner),
            escape_xml(&upload.storage_class),
            format_timestamp(upload.initiated)
        ));
    }
    xml.push_str("</ListMultipartUploadsResult>");
    xml
}

/// `ListPartsResult`.
#[allow(clippy::too_many_arguments)]
pub fn list_parts_body(
    bucket: &str,
    key: &str,
    upload_id: &str,
    part_number_marker: u32,
    max_parts: usize,
    result: &ListPartsResult,
    next_part_number_marker: Option<u32>,
) -> String {
    let mut xml = format!(
        "<ListPartsResult xmlns=\"{S3_XMLNS}\"><Bucket>{}</Bucket><Key>{}</Key><UploadId>{}</UploadId>{}{}<StorageClass>{}</StorageClass><PartNumberMarker>{}</PartNumberMarker>",
        escape_xml(bucket),
        escape_xml(key),
        escape_xml(upload_id),
        owner_xml("Initiator", &result.initiator),
        owner_xml("Owner", &result.owner),
        escape_xml(&result.storage_class),
        part_number_marker
    );
    if let Some(marker) = next_part_number_marker {
        xml.push_str(&format!(
            "<NextPartNumberMarker>{marker}</NextPartNumberMarker>"
        ));
    }
    xml.push_str(&format!(
        "<MaxParts>{}</MaxParts><IsTruncated>{}</IsTruncated>",
        max_parts, result.is_truncated
    ));
    for part in &result.parts {
        xml.push_str(&format!(
            "<Part><PartNumber>{}</PartNumber><ETag>{}</ETag></Part>",
            part.part_number,
            etag_xml(&part.etag)
        ));
    }
    xml.push_str("</ListPartsResult>");
    xml
}

/// One target of a multi-object delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    /// Key to delete.
    pub key: String,
    /// Specific version to delete, if given.
    pub version: Option<String>,
}

/// Parsed `<Delete>` request payload.
#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    /// Whether successful deletions are suppressed in the response.
    pub quiet: bool,
    /// Objects to delete.
    pub objects: Vec<DeleteTarget>,
}

/// Parses the `<Delete>` payload of a multi-object delete.
pub fn parse_delete_request(body: &[u8]) -> Result<DeleteRequest, S3Error> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let mut request = DeleteRequest::default();
    let mut saw_root = false;
    let mut in_object = false;
    let mut current_element = String::new();
    let mut key: Option<String> = None;
    let mut version: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if !saw_root {
                    if name != "Delete" {
                        return Err(S3Error::MalformedXML);
                    }
                    saw_root = true;
                } else if name == "Object" {
                    in_object = true;
                    key = None;
                    version = None;
                }
                current_element = name;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|_| S3Error::MalformedXML)?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match current_element.as_str() {
                    "Quiet" => request.quiet = text.eq_ignore_ascii_case("true"),
                    "Key" if in_object => key = Some(text.to_string()),
                    "VersionId" if in_object => version = Some(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Object" {
                    in_object = false;
                    let key = key.take().ok_or(S3Error::MalformedXML)?;
                    request.objects.push(DeleteTarget {
                        key,
                        version: version.take(),
                    });
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(S3Error::MalformedXML),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(S3Error::MalformedXML);
    }
    Ok(request)
}

/// Parses the `<CompleteMultipartUpload>` payload into its part list, in
/// document order.
pub fn parse_complete_request(body: &[u8]) -> Result<Vec<Part>, S3Error> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    let mut parts = Vec::new();
    let mut saw_root = false;
    let mut in_part = false;
    let mut current_element = String::new();
    let mut part_number: Option<u32> = None;
    let mut etag: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if !saw_root {
                    if name != "CompleteMultipartUpload" {
                        return Err(S3Error::MalformedXML);
                    }
                    saw_root = true;
                } else if name == "Part" {
                    in_part = true;
                    part_number = None;
                    etag = None;
                }
                current_element = name;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|_| S3Error::MalformedXML)?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match current_element.as_str() {
                    "PartNumber" if in_part => {
                        part_number = Some(text.parse().map_err(|_| S3Error::MalformedXML)?);
                    }
                    "ETag" if in_part => etag = Some(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Part" {
                    in_part = false;
                    let part_number = part_number.take().ok_or(S3Error::MalformedXML)?;
                    let etag = etag.take().ok_or(S3Error::MalformedXML)?;
                    parts.push(Part { part_number, etag });
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(S3Error::MalformedXML),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(S3Error::MalformedXML);
    }
    Ok(parts)
}

/// Escapes the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serializes a timestamp at second precision; some clients cannot parse
/// sub-second fractions.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_drop_subseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(678);
        assert_eq!(format_timestamp(ts), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_xml("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&apos;");
    }

    #[test]
    fn error_body_shape() {
        let body = error_body("NoSuchKey", "The specified key does not exist", "/b/k", "req-1");
        assert_eq!(
            body,
            "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist</Message><Resource>/b/k</Resource><RequestId>req-1</RequestId></Error>"
        );
    }

    #[test]
    fn list_buckets_rounds_creation_date() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(678);
        let buckets = vec![Bucket {
            name: "photos".to_string(),
            creation_date: ts,
        }];
        let body = list_buckets_body(&Owner::new("s3gate", "s3gate"), &buckets);
        assert!(body.contains(
            "<Bucket><Name>photos</Name><CreationDate>2024-01-02T03:04:05Z</CreationDate></Bucket>"
        ));
        assert!(body.contains(S3_XMLNS));
    }

    #[test]
    fn parse_delete_payload() {
        let body = br#"<Delete><Quiet>false</Quiet><Object><Key>a</Key></Object><Object><Key>b</Key><VersionId>v1</VersionId></Object></Delete>"#;
        let request = parse_delete_request(body).unwrap();
        assert!(!request.quiet);
        assert_eq!(request.objects.len(), 2);
        assert_eq!(request.objects[0].key, "a");
        assert_eq!(request.objects[1].version.as_deref(), Some("v1"));
    }

    #[test]
    fn parse_delete_quiet() {
        let body = br#"<Delete><Quiet>true</Quiet><Object><Key>a</Key></Object></Delete>"#;
        assert!(parse_delete_request(body).unwrap().quiet);
    }

    #[test]
    fn parse_delete_rejects_garbage() {
        assert!(parse_delete_request(b"not xml at all <<<").is_err());
        assert!(parse_delete_request(b"<WrongRoot></WrongRoot>").is_err());
        assert!(parse_delete_request(b"<Delete><Object></Object></Delete>").is_err());
        assert!(parse_delete_request(b"").is_err());
    }

    #[test]
    fn parse_complete_payload_preserves_order() {
        let body = br#"<CompleteMultipartUpload>
            <Part><PartNumber>1</PartNumber><ETag>"etag1"</ETag></Part>
            <Part><PartNumber>2</PartNumber><ETag>etag2</ETag></Part>
        </CompleteMultipartUpload>"#;
        let parts = parse_complete_request(body).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].part_number, 1);
        assert_eq!(parts[0].etag, "\"etag1\"");
        assert_eq!(parts[1].etag, "etag2");
    }

    #[test]
    fn parse_complete_rejects_bad_part_numbers() {
        let body = br#"<CompleteMultipartUpload><Part><PartNumber>x</PartNumber><ETag>e</ETag></Part></CompleteMultipartUpload>"#;
        assert!(parse_complete_request(body).is_err());
    }

    #[test]
    fn delete_result_quiet_suppresses_successes() {
        let deleted = vec![DeletedEntry {
            key: "a".to_string(),
            version: None,
            delete_marker: false,
            delete_marker_version: None,
        }];
        let errors = vec![DeleteErrorEntry {
            key: "b".to_string(),
            code: "InternalError".to_string(),
            message: "boom".to_string(),
        }];

        let loud = delete_result_body(&deleted, &errors, false);
        assert!(loud.contains("<Deleted><Key>a</Key></Deleted>"));
        assert!(loud.contains("<Error><Key>b</Key><Code>InternalError</Code>"));

        let quiet = delete_result_body(&deleted, &errors, true);
        assert!(!quiet.contains("<Deleted>"));
        assert!(quiet.contains("<Error><Key>b</Key>"));
    }

    #[test]
    fn etag_fields_are_quoted() {
        let body = copy_object_body("abc123", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(body.contains("<ETag>\"abc123\"</ETag>"));

        // already-quoted etags are not double-quoted
        let body = complete_upload_body("/b/k", "b", "k", "\"abc123\"");
        assert!(body.contains("<ETag>\"abc123\"</ETag>"));
    }
}
