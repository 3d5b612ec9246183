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

//! Error sentinels reported by origins.
//!
//! The request pipeline matches these by variant to pick an S3 error code;
//! anything it does not recognize degrades to `InternalError` on the wire.

use thiserror::Error;

/// Errors that can occur in an origin backend.
#[derive(Error, Debug)]
pub enum OriginError {
    /// The bucket does not exist.
    #[error("bucket not found: {bucket}")]
    NoSuchBucket {
        /// Bucket that was not found.
        bucket: String,
    },

    /// The object key does not exist.
    #[error("key not found: {key}")]
    NoSuchKey {
        /// Key that was not found.
        key: String,
    },

    /// The bucket name is taken by another owner.
    #[error("bucket already exists: {bucket}")]
    BucketAlreadyExists {
        /// Bucket that already exists.
        bucket: String,
    },

    /// The bucket already exists and is owned by the caller.
    #[error("bucket already owned by you: {bucket}")]
    BucketAlreadyOwnedByYou {
        /// Bucket that already exists.
        bucket: String,
    },

    /// The bucket still contains objects.
    #[error("bucket not empty: {bucket}")]
    BucketNotEmpty {
        /// Bucket that is not empty.
        bucket: String,
    },

    /// The multipart upload does not exist.
    #[error("upload not found: {upload_id}")]
    NoSuchUpload {
        /// Upload ID that was not found.
        upload_id: String,
    },

    /// The origin does not support this operation.
    #[error("operation not implemented by this origin")]
    NotImplemented,

    /// IO error from the backing store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}
