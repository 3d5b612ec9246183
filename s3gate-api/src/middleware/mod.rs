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

//! HTTP middleware. Stack order is significant:
//! request ID, ETag quoting, authentication, body validation.

pub mod auth;
pub mod body;
pub mod etag;
pub mod request_id;

pub use auth::auth_middleware;
pub use body::body_validation_middleware;
pub use etag::etag_quoting_middleware;
pub use request_id::{request_id_middleware, RequestContext};
