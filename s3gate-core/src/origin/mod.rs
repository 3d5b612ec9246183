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

//! Origin capability traits.
//!
//! Rather than one fat interface, the gateway consumes four narrow
//! capability surfaces so a backend may implement only what it supports.
//! Surfaces a backend leaves out fall through to [`UnimplementedOrigin`],
//! which answers every call with `OriginError::NotImplemented`.

pub mod fs;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::OriginError;
use crate::types::{
    Bucket, CompleteMultipartResult, DeleteObjectResult, GetObjectResult, ListMultipartResult,
    ListObjectsResult, ListPartsResult, Part, PutObjectResult,
};

/// Service-level functionality.
#[async_trait]
pub trait ServiceOrigin: Send + Sync {
    /// Lists all buckets.
    async fn list_buckets(&self) -> Result<Vec<Bucket>, OriginError>;
}

/// Bucket-level functionality.
#[async_trait]
pub trait BucketOrigin: Send + Sync {
    /// Returns the location of the bucket.
    async fn get_location(&self, bucket: &str) -> Result<String, OriginError>;

    /// Lists objects within the bucket.
    ///
    /// `marker` is exclusive: only keys strictly greater than it are
    /// returned. When `delimiter` is non-empty, keys sharing a prefix up to
    /// the first delimiter occurrence past `prefix` are rolled up into
    /// common prefixes.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: usize,
    ) -> Result<ListObjectsResult, OriginError>;

    /// Creates a new bucket.
    async fn create_bucket(&self, bucket: &str) -> Result<(), OriginError>;

    /// Deletes the bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), OriginError>;
}

/// Object-level functionality.
#[async_trait]
pub trait ObjectOrigin: Send + Sync {
    /// Gets an object, or a specific version of it.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        version: Option<&str>,
    ) -> Result<GetObjectResult, OriginError>;

    /// Stores an object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<PutObjectResult, OriginError>;

    /// Copies an object. `source` is the already-fetched source object;
    /// returns the destination version, if any.
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        source: &GetObjectResult,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<Option<String>, OriginError>;

    /// Deletes an object, or a specific version of it.
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version: Option<&str>,
    ) -> Result<DeleteObjectResult, OriginError>;
}

/// Multipart-upload functionality.
#[async_trait]
pub trait MultipartOrigin: Send + Sync {
    /// Lists in-progress multipart uploads in a bucket.
    async fn list_uploads(
        &self,
        bucket: &str,
        key_marker: &str,
        upload_id_marker: &str,
        max_uploads: usize,
    ) -> Result<ListMultipartResult, OriginError>;

    /// Initializes a new multipart upload, returning its upload ID.
    async fn init_upload(&self, bucket: &str, key: &str) -> Result<String, OriginError>;

    /// Uploads one part of an in-progress upload, returning the part etag.
    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<String, OriginError>;

    /// Finishes a multipart upload from the given part list.
    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[Part],
    ) -> Result<CompleteMultipartResult, OriginError>;

    /// Aborts an in-progress multipart upload.
    async fn abort_upload(&self, bucket: &str, key: &str, upload_id: &str)
        -> Result<(), OriginError>;

    /// Lists the parts of an in-progress multipart upload.
    async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: usize,
    ) -> Result<ListPartsResult, OriginError>;
}

/// Fallback origin for capability surfaces a backend does not provide.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedOrigin;

#[async_trait]
impl ServiceOrigin for UnimplementedOrigin {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, OriginError> {
        Err(OriginError::NotImplemented)
    }
}

#[async_trait]
impl BucketOrigin for UnimplementedOrigin {
    async fn get_location(&self, _bucket: &str) -> Result<String, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn list_objects(
        &self,
        _bucket: &str,
        _prefix: &str,
        _marker: &str,
        _delimiter: &str,
        _max_keys: usize,
    ) -> Result<ListObjectsResult, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn create_bucket(&self, _bucket: &str) -> Result<(), OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn delete_bucket(&self, _bucket: &str) -> Result<(), OriginError> {
        Err(OriginError::NotImplemented)
    }
}

#[async_trait]
impl ObjectOrigin for UnimplementedOrigin {
    async fn get_object(
        &self,
        _bucket: &str,
        _key: &str,
        _version: Option<&str>,
    ) -> Result<GetObjectResult, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn put_object(
        &self,
        _bucket: &str,
        _key: &str,
        _data: Bytes,
    ) -> Result<PutObjectResult, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn copy_object(
        &self,
        _src_bucket: &str,
        _src_key: &str,
        _source: &GetObjectResult,
        _dst_bucket: &str,
        _dst_key: &str,
    ) -> Result<Option<String>, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn delete_object(
        &self,
        _bucket: &str,
        _key: &str,
        _version: Option<&str>,
    ) -> Result<DeleteObjectResult, OriginError> {
        Err(OriginError::NotImplemented)
    }
}

#[async_trait]
impl MultipartOrigin for UnimplementedOrigin {
    async fn list_uploads(
        &self,
        _bucket: &str,
        _key_marker: &str,
        _upload_id_marker: &str,
        _max_uploads: usize,
    ) -> Result<ListMultipartResult, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn init_upload(&self, _bucket: &str, _key: &str) -> Result<String, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        _upload_id: &str,
        _part_number: u32,
        _data: Bytes,
    ) -> Result<String, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn complete_upload(
        &self,
        _bucket: &str,
        _key: &str,
        _upload_id: &str,
        _parts: &[Part],
    ) -> Result<CompleteMultipartResult, OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn abort_upload(
        &self,
        _bucket: &str,
        _key: &str,
        _upload_id: &str,
    ) -> Result<(), OriginError> {
        Err(OriginError::NotImplemented)
    }

    async fn list_parts(
        &self,
        _bucket: &str,
        _key: &str,
        _upload_id: &str,
        _part_number_marker: u32,
        _max_parts: usize,
    ) -> Result<ListPartsResult, OriginError> {
        Err(OriginError::NotImplemented)
    }
}
