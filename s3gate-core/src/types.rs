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

//! Types exchanged between the request pipeline and origins.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Maximum number of keys returned in object listings by default.
pub const DEFAULT_MAX_KEYS: usize = 1000;
/// Upper bound accepted for `max-keys`; hadoop's S3 client asks for 5000.
pub const MAX_KEYS_CEILING: usize = 5000;
/// Maximum number of uploads returned in multipart listings by default.
pub const DEFAULT_MAX_UPLOADS: usize = 1000;
/// Maximum number of parts returned in part listings by default.
pub const DEFAULT_MAX_PARTS: usize = 1000;
/// Highest part number allowed in a multipart upload.
pub const MAX_PARTS_ALLOWED: u32 = 10000;

/// A bucket owner or upload initiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Canonical user ID.
    pub id: String,
    /// Display name shown in listings.
    pub display_name: String,
}

impl Owner {
    /// Creates an owner record.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A bucket.
#[derive(Debug, Clone)]
pub struct Bucket {
    /// Bucket name, matching `[A-Za-z0-9._-]{1,255}`.
    pub name: String,
    /// When the bucket was created. Serialized at second precision.
    pub creation_date: DateTime<Utc>,
}

/// An object entry as returned by listings.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object key; may contain `/`.
    pub key: String,
    /// When the object was last modified.
    pub last_modified: DateTime<Utc>,
    /// Hex content hash, with or without surrounding quotes.
    pub etag: String,
    /// Object size in bytes.
    pub size: u64,
    /// Storage class used for the object.
    pub storage_class: String,
    /// Owner of the object.
    pub owner: Owner,
}

/// Result of a ListObjects call.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsResult {
    /// Objects in the requested page.
    pub contents: Vec<ObjectInfo>,
    /// Key-space groupings produced by a delimiter; values end with the
    /// delimiter and never also appear in `contents`.
    pub common_prefixes: Vec<String>,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
}

/// Result of a GetObject call.
#[derive(Debug, Clone)]
pub struct GetObjectResult {
    /// Hex content hash, with or without surrounding quotes.
    pub etag: String,
    /// Object version, if the origin supports versioning.
    pub version: Option<String>,
    /// Whether a delete marker sits in place of the object.
    pub delete_marker: bool,
    /// When the object was last modified.
    pub mod_time: DateTime<Utc>,
    /// Object contents.
    pub content: Bytes,
}

/// Result of a PutObject call.
#[derive(Debug, Clone, Default)]
pub struct PutObjectResult {
    /// Hex content hash of the stored object.
    pub etag: String,
    /// New object version, if the origin supports versioning.
    pub version: Option<String>,
}

/// Result of a DeleteObject call.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectResult {
    /// Version that was deleted, or of the created delete marker.
    pub version: Option<String>,
    /// Whether a delete marker was created.
    pub delete_marker: bool,
}

/// An in-progress multipart upload.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    /// Object key the upload targets.
    pub key: String,
    /// Server-generated opaque upload ID.
    pub upload_id: String,
    /// User that initiated the upload.
    pub initiator: Owner,
    /// Owner of the resulting object.
    pub owner: Owner,
    /// Storage class used for the object.
    pub storage_class: String,
    /// When the upload was initiated. Serialized at second precision.
    pub initiated: DateTime<Utc>,
}

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Index of the part, 1..=10000.
    pub part_number: u32,
    /// Hex content hash of the part, with or without surrounding quotes.
    pub etag: String,
}

/// Result of a ListMultipart call.
#[derive(Debug, Clone, Default)]
pub struct ListMultipartResult {
    /// Uploads in the requested page.
    pub uploads: Vec<MultipartUpload>,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
}

/// Result of a ListParts call.
#[derive(Debug, Clone)]
pub struct ListPartsResult {
    /// User that initiated the upload.
    pub initiator: Owner,
    /// Owner of the resulting object.
    pub owner: Owner,
    /// Storage class used for the object.
    pub storage_class: String,
    /// Parts in the requested page.
    pub parts: Vec<Part>,
    /// Whether more results exist beyond this page.
    pub is_truncated: bool,
}

/// Result of a CompleteMultipart call.
#[derive(Debug, Clone)]
pub struct CompleteMultipartResult {
    /// Location of the assembled object.
    pub location: String,
    /// Hex content hash of the assembled object.
    pub etag: String,
    /// New object version, if the origin supports versioning.
    pub version: Option<String>,
}
