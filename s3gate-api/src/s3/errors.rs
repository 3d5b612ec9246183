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

//! The S3 error taxonomy.
//!
//! A closed set of error codes with fixed HTTP status and canonical
//! message, rendered as an `<Error>` XML document. Origin failures are
//! funneled through [`S3Error::from_origin`]: recognized sentinels map to
//! specific codes, anything else degrades to `InternalError` with the
//! upstream message preserved and no backtrace leaked.

use axum::http::StatusCode;
use s3gate_core::OriginError;
use thiserror::Error;

/// S3 API errors. The variant identifiers mirror the wire-level codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum S3Error {
    /// Authorization was presented but rejected.
    #[error("Access Denied")]
    AccessDenied,

    /// The access key does not exist.
    #[error("The AWS access key ID you provided does not exist in our records")]
    InvalidAccessKeyId,

    /// The computed signature differs from the presented one.
    #[error("The request signature we calculated does not match the signature you provided; check your key and signing method")]
    SignatureDoesNotMatch,

    /// The Authorization header does not match the SigV4 grammar.
    #[error("The authorization header is malformed")]
    AuthorizationHeaderMalformed,

    /// A form value was out of bounds or unparseable.
    #[error("Invalid Argument")]
    InvalidArgument,

    /// The bucket name fails validation.
    #[error("The specified bucket is not valid")]
    InvalidBucketName,

    /// The request is semantically conflicting.
    #[error("{0}")]
    InvalidRequest(String),

    /// A digest header has the wrong format.
    #[error("The Content-MD5 or x-amz-content-sha256 you specified is not valid")]
    InvalidDigest,

    /// A digest header did not match the received body.
    #[error("The Content-MD5 or x-amz-content-sha256 you specified did not match what we received")]
    BadDigest,

    /// Content-Length exceeds the configured maximum.
    #[error("Your proposed upload exceeds the maximum allowed size")]
    EntityTooLarge,

    /// Fewer bytes arrived than Content-Length declared.
    #[error("You did not provide the number of bytes specified by the Content-Length HTTP header")]
    IncompleteBody,

    /// Content-Length is required but missing.
    #[error("You must provide the Content-Length HTTP header")]
    MissingContentLength,

    /// The request XML body cannot be parsed.
    #[error("The XML you provided was not well-formed or did not validate against our published schema")]
    MalformedXML,

    /// The object does not exist, or a delete marker is latest.
    #[error("The specified key does not exist")]
    NoSuchKey,

    /// The bucket does not exist.
    #[error("The specified bucket does not exist")]
    NoSuchBucket,

    /// The multipart upload does not exist.
    #[error("The specified multipart upload does not exist; the upload ID may be invalid, or the upload may have been aborted or completed")]
    NoSuchUpload,

    /// The bucket name is taken.
    #[error("The requested bucket name is not available")]
    BucketAlreadyExists,

    /// The bucket already exists under the caller's ownership.
    #[error("The bucket you tried to create already exists, and you own it")]
    BucketAlreadyOwnedByYou,

    /// The bucket still contains objects.
    #[error("The bucket you tried to delete is not empty")]
    BucketNotEmpty,

    /// The method does not match any route for the path.
    #[error("The specified method is not allowed against this resource")]
    MethodNotAllowed,

    /// A conditional header rejected the request.
    #[error("At least one of the preconditions you specified did not hold")]
    PreconditionFailed,

    /// Reading the request body exceeded the configured deadline.
    #[error("Your socket connection to the server was not read from or written to within the timeout period")]
    RequestTimeout,

    /// The subresource or operation is deliberately unsupported.
    #[error("This functionality is not implemented")]
    NotImplemented,

    /// CompleteMultipartUpload parts were not strictly ascending.
    #[error("The list of parts was not in ascending order; parts must be ordered by part number")]
    InvalidPartOrder,

    /// Unexpected backend failure; the message is the upstream error.
    #[error("{0}")]
    InternalError(String),
}

impl S3Error {
    /// Returns the wire-level error code.
    pub fn code(&self) -> &'static str {
        match self {
            S3Error::AccessDenied => "AccessDenied",
            S3Error::InvalidAccessKeyId => "InvalidAccessKeyId",
            S3Error::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            S3Error::AuthorizationHeaderMalformed => "AuthorizationHeaderMalformed",
            S3Error::InvalidArgument => "InvalidArgument",
            S3Error::InvalidBucketName => "InvalidBucketName",
            S3Error::InvalidRequest(_) => "InvalidRequest",
            S3Error::InvalidDigest => "InvalidDigest",
            S3Error::BadDigest => "BadDigest",
            S3Error::EntityTooLarge => "EntityTooLarge",
            S3Error::IncompleteBody => "IncompleteBody",
            S3Error::MissingContentLength => "MissingContentLength",
            S3Error::MalformedXML => "MalformedXML",
            S3Error::NoSuchKey => "NoSuchKey",
            S3Error::NoSuchBucket => "NoSuchBucket",
            S3Error::NoSuchUpload => "NoSuchUpload",
            S3Error::BucketAlreadyExists => "BucketAlreadyExists",
            S3Error::BucketAlreadyOwnedByYou => "BucketAlreadyOwnedByYou",
            S3Error::BucketNotEmpty => "BucketNotEmpty",
            S3Error::MethodNotAllowed => "MethodNotAllowed",
            S3Error::PreconditionFailed => "PreconditionFailed",
            S3Error::RequestTimeout => "RequestTimeout",
            S3Error::NotImplemented => "NotImplemented",
            S3Error::InvalidPartOrder => "InvalidPartOrder",
            S3Error::InternalError(_) => "InternalError",
        }
    }

    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            S3Error::AccessDenied => StatusCode::FORBIDDEN,
            S3Error::InvalidAccessKeyId => StatusCode::FORBIDDEN,
            S3Error::SignatureDoesNotMatch => StatusCode::FORBIDDEN,
            S3Error::AuthorizationHeaderMalformed => StatusCode::BAD_REQUEST,
            S3Error::InvalidArgument => StatusCode::BAD_REQUEST,
            S3Error::InvalidBucketName => StatusCode::BAD_REQUEST,
            S3Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            S3Error::InvalidDigest => StatusCode::BAD_REQUEST,
            S3Error::BadDigest => StatusCode::BAD_REQUEST,
            S3Error::EntityTooLarge => StatusCode::BAD_REQUEST,
            S3Error::IncompleteBody => StatusCode::BAD_REQUEST,
            S3Error::MissingContentLength => StatusCode::LENGTH_REQUIRED,
            S3Error::MalformedXML => StatusCode::BAD_REQUEST,
            S3Error::NoSuchKey => StatusCode::NOT_FOUND,
            S3Error::NoSuchBucket => StatusCode::NOT_FOUND,
            S3Error::NoSuchUpload => StatusCode::NOT_FOUND,
            S3Error::BucketAlreadyExists => StatusCode::CONFLICT,
            S3Error::BucketAlreadyOwnedByYou => StatusCode::CONFLICT,
            S3Error::BucketNotEmpty => StatusCode::CONFLICT,
            S3Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            S3Error::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            S3Error::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            S3Error::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            S3Error::InvalidPartOrder => StatusCode::BAD_REQUEST,
            S3Error::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps an origin failure onto the taxonomy. Sentinels are matched by
    /// variant; everything else becomes `InternalError` with the upstream
    /// message in `<Message>`.
    pub fn from_origin(err: OriginError) -> Self {
        match err {
            OriginError::NoSuchBucket { .. } => S3Error::NoSuchBucket,
            OriginError::NoSuchKey { .. } => S3Error::NoSuchKey,
            OriginError::BucketAlreadyExists { .. } => S3Error::BucketAlreadyExists,
            OriginError::BucketAlreadyOwnedByYou { .. } => S3Error::BucketAlreadyOwnedByYou,
            OriginError::BucketNotEmpty { .. } => S3Error::BucketNotEmpty,
            OriginError::NoSuchUpload { .. } => S3Error::NoSuchUpload,
            OriginError::NotImplemented => S3Error::NotImplemented,
            other => S3Error::InternalError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_contract() {
        assert_eq!(S3Error::AccessDenied.code(), "AccessDenied");
        assert_eq!(S3Error::InvalidAccessKeyId.code(), "InvalidAccessKeyId");
        assert_eq!(S3Error::SignatureDoesNotMatch.code(), "SignatureDoesNotMatch");
        assert_eq!(S3Error::InvalidPartOrder.code(), "InvalidPartOrder");
        assert_eq!(S3Error::NotImplemented.code(), "NotImplemented");
    }

    #[test]
    fn statuses() {
        assert_eq!(S3Error::AccessDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            S3Error::AuthorizationHeaderMalformed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(S3Error::NoSuchKey.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            S3Error::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            S3Error::PreconditionFailed.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(S3Error::RequestTimeout.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(S3Error::NotImplemented.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            S3Error::MissingContentLength.status_code(),
            StatusCode::LENGTH_REQUIRED
        );
    }

    #[test]
    fn origin_sentinels_map_by_identity() {
        assert_eq!(
            S3Error::from_origin(OriginError::NoSuchBucket {
                bucket: "b".into()
            }),
            S3Error::NoSuchBucket
        );
        assert_eq!(
            S3Error::from_origin(OriginError::NoSuchKey { key: "k".into() }),
            S3Error::NoSuchKey
        );
        assert_eq!(
            S3Error::from_origin(OriginError::NotImplemented),
            S3Error::NotImplemented
        );
    }

    #[test]
    fn unknown_origin_errors_degrade_to_internal() {
        let err = S3Error::from_origin(OriginError::Other("disk exploded".into()));
        assert_eq!(err.code(), "InternalError");
        assert_eq!(err.to_string(), "disk exploded");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
