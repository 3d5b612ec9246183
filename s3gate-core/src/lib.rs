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

//! S3Gate core - data model and origin capabilities.
//!
//! This crate defines the types exchanged between the S3 request pipeline
//! and the backend ("origin") the gateway proxies to, the four narrow
//! origin capability traits, and an illustrative filesystem origin.

pub mod error;
pub mod origin;
pub mod types;

pub use error::OriginError;
pub use origin::{
    fs::FsOrigin, BucketOrigin, MultipartOrigin, ObjectOrigin, ServiceOrigin, UnimplementedOrigin,
};
pub use types::{
    Bucket, CompleteMultipartResult, DeleteObjectResult, GetObjectResult, ListMultipartResult,
    ListObjectsResult, ListPartsResult, MultipartUpload, ObjectInfo, Owner, Part, PutObjectResult,
};
