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

//! S3Gate API layer - the S3 REST request pipeline.
//!
//! This crate implements the gateway core:
//! - AWS Signature V4 authentication, including streaming chunked payloads
//! - Request routing over the S3 REST surface (2006-03-01)
//! - XML response framing and the S3 error taxonomy
//! - The middleware stack: request IDs, ETag quoting, auth, body validation
//!
//! Storage itself is delegated to the origin capabilities defined in
//! `s3gate-core`.

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod s3;
pub mod server;

pub use auth::{SecretKeys, StaticKeys};
pub use s3::errors::S3Error;
pub use server::{create_router, AppState};
