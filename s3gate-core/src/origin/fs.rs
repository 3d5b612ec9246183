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

//! Filesystem origin.
//!
//! Buckets are directories under a data root; objects are files (keys may
//! contain `/` and map to subdirectories). Multipart uploads are staged
//! under a hidden spool directory and assembled on completion. Point
//! operations go through `tokio::fs`; the recursive listing walk runs on
//! the blocking pool. This origin is illustrative: it favors clarity over
//! throughput and recomputes etags from content instead of persisting
//! them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use crate::error::OriginError;
use crate::origin::{BucketOrigin, MultipartOrigin, ObjectOrigin, ServiceOrigin};
use crate::types::{
    Bucket, CompleteMultipartResult, DeleteObjectResult, GetObjectResult, ListMultipartResult,
    ListObjectsResult, ListPartsResult, MultipartUpload, ObjectInfo, Owner, Part, PutObjectResult,
};

/// Directory under the data root where in-progress uploads are staged.
const SPOOL_DIR: &str = ".multipart";
/// Storage class reported for every object.
const STORAGE_CLASS: &str = "STANDARD";

/// An origin backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsOrigin {
    root: PathBuf,
    region: String,
    owner: Owner,
}

impl FsOrigin {
    /// Opens (creating if needed) a filesystem origin rooted at `root`.
    ///
    /// `region` is what GetBucketLocation reports; the directory tree has
    /// no region of its own.
    pub async fn new(
        root: impl Into<PathBuf>,
        region: impl Into<String>,
    ) -> Result<Self, OriginError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::create_dir_all(root.join(SPOOL_DIR)).await?;
        Ok(Self {
            root,
            region: region.into(),
            owner: Owner::new("s3gate", "s3gate"),
        })
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, OriginError> {
        validate_key(key)?;
        Ok(self.root.join(bucket).join(key))
    }

    fn upload_path(&self, upload_id: &str) -> PathBuf {
        self.root.join(SPOOL_DIR).join(upload_id)
    }

    async fn require_bucket(&self, bucket: &str) -> Result<PathBuf, OriginError> {
        let path = self.bucket_path(bucket);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(OriginError::NoSuchBucket {
                bucket: bucket.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(OriginError::NoSuchBucket {
                bucket: bucket.to_string(),
            }),
            Err(e) => Err(OriginError::Io(e)),
        }
    }

    /// Loads the (bucket, key, initiated) record of a staged upload.
    async fn upload_meta(
        &self,
        upload_id: &str,
    ) -> Result<(String, String, DateTime<Utc>), OriginError> {
        let meta_path = self.upload_path(upload_id).join("meta");
        let raw = tokio::fs::read_to_string(&meta_path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                OriginError::NoSuchUpload {
                    upload_id: upload_id.to_string(),
                }
            } else {
                OriginError::Io(e)
            }
        })?;
        let initiated = match tokio::fs::metadata(&meta_path).await {
            Ok(meta) => meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now()),
            Err(_) => Utc::now(),
        };
        let mut lines = raw.splitn(2, '\n');
        let bucket = lines.next().unwrap_or_default().to_string();
        let key = lines.next().unwrap_or_default().to_string();
        Ok((bucket, key, initiated))
    }
}

#[async_trait]
impl ServiceOrigin for FsOrigin {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, OriginError> {
        let mut buckets = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type().await?.is_dir() || name.starts_with('.') {
                continue;
            }
            let creation_date = match entry.metadata().await {
                Ok(meta) => meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now()),
                Err(_) => Utc::now(),
            };
            buckets.push(Bucket {
                name,
                creation_date,
            });
        }
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }
}

#[async_trait]
impl BucketOrigin for FsOrigin {
    async fn get_location(&self, bucket: &str) -> Result<String, OriginError> {
        self.require_bucket(bucket).await?;
        Ok(self.region.clone())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        delimiter: &str,
        max_keys: usize,
    ) -> Result<ListObjectsResult, OriginError> {
        let bucket_dir = self.require_bucket(bucket).await?;

        // The recursive walk touches an unbounded number of files; keep it
        // off the async workers.
        let prefix = prefix.to_string();
        let marker = marker.to_string();
        let delimiter = delimiter.to_string();
        let owner = self.owner.clone();
        task::spawn_blocking(move || {
            list_objects_blocking(&bucket_dir, &prefix, &marker, &delimiter, max_keys, &owner)
        })
        .await
        .map_err(|e| OriginError::Other(format!("listing task failed: {e}")))?
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), OriginError> {
        match tokio::fs::create_dir(self.bucket_path(bucket)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(OriginError::BucketAlreadyOwnedByYou {
                    bucket: bucket.to_string(),
                })
            }
            Err(e) => Err(OriginError::Io(e)),
        }
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), OriginError> {
        let path = self.require_bucket(bucket).await?;
        let mut entries = tokio::fs::read_dir(&path).await?;
        if entries.next_entry().await?.is_some() {
            return Err(OriginError::BucketNotEmpty {
                bucket: bucket.to_string(),
            });
        }
        tokio::fs::remove_dir(&path).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectOrigin for FsOrigin {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        _version: Option<&str>,
    ) -> Result<GetObjectResult, OriginError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_as_no_such_key(e, key))?;
        let mod_time = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now()),
            Err(_) => Utc::now(),
        };
        Ok(GetObjectResult {
            etag: md5_hex(&data),
            version: None,
            delete_marker: false,
            mod_time,
            content: Bytes::from(data),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<PutObjectResult, OriginError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!(bucket, key, size = data.len(), "storing object");
        tokio::fs::write(&path, &data).await?;
        Ok(PutObjectResult {
            etag: md5_hex(&data),
            version: None,
        })
    }

    async fn copy_object(
        &self,
        _src_bucket: &str,
        _src_key: &str,
        source: &GetObjectResult,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<Option<String>, OriginError> {
        let result = self
            .put_object(dst_bucket, dst_key, source.content.clone())
            .await?;
        Ok(result.version)
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        _version: Option<&str>,
    ) -> Result<DeleteObjectResult, OriginError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_as_no_such_key(e, key))?;
        Ok(DeleteObjectResult::default())
    }
}

#[async_trait]
impl MultipartOrigin for FsOrigin {
    async fn list_uploads(
        &self,
        bucket: &str,
        key_marker: &str,
        upload_id_marker: &str,
        max_uploads: usize,
    ) -> Result<ListMultipartResult, OriginError> {
        self.require_bucket(bucket).await?;

        let mut uploads = Vec::new();
        let mut entries = tokio::fs::read_dir(self.root.join(SPOOL_DIR)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let upload_id = entry.file_name().to_string_lossy().into_owned();
            let Ok((upload_bucket, key, initiated)) = self.upload_meta(&upload_id).await else {
                continue;
            };
            if upload_bucket != bucket {
                continue;
            }
            uploads.push(MultipartUpload {
                key,
                upload_id,
                initiator: self.owner.clone(),
                owner: self.owner.clone(),
                storage_class: STORAGE_CLASS.to_string(),
                initiated,
            });
        }
        uploads.sort_by(|a, b| (&a.key, &a.upload_id).cmp(&(&b.key, &b.upload_id)));

        let after_marker = |u: &MultipartUpload| {
            if key_marker.is_empty() {
                return true;
            }
            if upload_id_marker.is_empty() {
                u.key.as_str() > key_marker
            } else {
                (u.key.as_str(), u.upload_id.as_str()) > (key_marker, upload_id_marker)
            }
        };

        let mut result = ListMultipartResult::default();
        for upload in uploads.into_iter().filter(after_marker) {
            if result.uploads.len() >= max_uploads {
                result.is_truncated = true;
                break;
            }
            result.uploads.push(upload);
        }
        Ok(result)
    }

    async fn init_upload(&self, bucket: &str, key: &str) -> Result<String, OriginError> {
        self.require_bucket(bucket).await?;
        validate_key(key)?;
        let upload_id = Uuid::new_v4().to_string();
        let dir = self.upload_path(&upload_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("meta"), format!("{bucket}\n{key}")).await?;
        debug!(bucket, key, %upload_id, "initiated multipart upload");
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<String, OriginError> {
        self.upload_meta(upload_id).await?;
        let path = self.upload_path(upload_id).join(part_file_name(part_number));
        tokio::fs::write(&path, &data).await?;
        Ok(md5_hex(&data))
    }

    async fn complete_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[Part],
    ) -> Result<CompleteMultipartResult, OriginError> {
        self.upload_meta(upload_id).await?;
        let dir = self.upload_path(upload_id);

        let mut assembled = Vec::new();
        for part in parts {
            let data = tokio::fs::read(dir.join(part_file_name(part.part_number)))
                .await
                .map_err(|e| {
                    if e.kind() == ErrorKind::NotFound {
                        OriginError::Other(format!("part {} was never uploaded", part.part_number))
                    } else {
                        OriginError::Io(e)
                    }
                })?;
            assembled.extend_from_slice(&data);
        }

        let result = self.put_object(bucket, key, Bytes::from(assembled)).await?;
        tokio::fs::remove_dir_all(&dir).await?;
        Ok(CompleteMultipartResult {
            location: format!("/{bucket}/{key}"),
            etag: result.etag,
            version: result.version,
        })
    }

    async fn abort_upload(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
    ) -> Result<(), OriginError> {
        self.upload_meta(upload_id).await?;
        tokio::fs::remove_dir_all(self.upload_path(upload_id)).await?;
        Ok(())
    }

    async fn list_parts(
        &self,
        _bucket: &str,
        _key: &str,
        upload_id: &str,
        part_number_marker: u32,
        max_parts: usize,
    ) -> Result<ListPartsResult, OriginError> {
        self.upload_meta(upload_id).await?;
        let dir = self.upload_path(upload_id);

        let mut numbers = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(n) = name.strip_prefix("part-").and_then(|s| s.parse::<u32>().ok()) {
                numbers.push(n);
            }
        }
        numbers.sort_unstable();

        let mut result = ListPartsResult {
            initiator: self.owner.clone(),
            owner: self.owner.clone(),
            storage_class: STORAGE_CLASS.to_string(),
            parts: Vec::new(),
            is_truncated: false,
        };
        for n in numbers.into_iter().filter(|n| *n > part_number_marker) {
            if result.parts.len() >= max_parts {
                result.is_truncated = true;
                break;
            }
            let data = tokio::fs::read(dir.join(part_file_name(n))).await?;
            result.parts.push(Part {
                part_number: n,
                etag: md5_hex(&data),
            });
        }
        Ok(result)
    }
}

/// Listing body run on the blocking pool: walks the bucket tree, applies
/// prefix/marker/delimiter, and reads entries up to `max_keys`.
fn list_objects_blocking(
    bucket_dir: &Path,
    prefix: &str,
    marker: &str,
    delimiter: &str,
    max_keys: usize,
    owner: &Owner,
) -> Result<ListObjectsResult, OriginError> {
    let keys = walk_keys(bucket_dir)?;

    let mut result = ListObjectsResult::default();
    if max_keys == 0 {
        return Ok(result);
    }

    for key in keys {
        if !key.starts_with(prefix) || key.as_str() <= marker {
            continue;
        }

        if !delimiter.is_empty() {
            if let Some(idx) = key[prefix.len()..].find(delimiter) {
                let rollup = key[..prefix.len() + idx + delimiter.len()].to_string();
                if result.common_prefixes.contains(&rollup) {
                    continue;
                }
                if result.contents.len() + result.common_prefixes.len() >= max_keys {
                    result.is_truncated = true;
                    break;
                }
                result.common_prefixes.push(rollup);
                continue;
            }
        }

        if result.contents.len() + result.common_prefixes.len() >= max_keys {
            result.is_truncated = true;
            break;
        }

        let path = bucket_dir.join(&key);
        let meta = std::fs::metadata(&path)?;
        let data = std::fs::read(&path)?;
        result.contents.push(ObjectInfo {
            key,
            last_modified: meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now()),
            etag: md5_hex(&data),
            size: meta.len(),
            storage_class: STORAGE_CLASS.to_string(),
            owner: owner.clone(),
        });
    }

    Ok(result)
}

/// Collects all object keys under a bucket directory, sorted bytewise.
/// Runs on the blocking pool via `list_objects_blocking`.
fn walk_keys(base: &Path) -> Result<Vec<String>, OriginError> {
    let mut keys = Vec::new();
    let mut stack = vec![base.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(base) {
                keys.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    keys.sort();
    Ok(keys)
}

fn part_file_name(part_number: u32) -> String {
    format!("part-{part_number:05}")
}

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn not_found_as_no_such_key(e: std::io::Error, key: &str) -> OriginError {
    if e.kind() == ErrorKind::NotFound {
        OriginError::NoSuchKey {
            key: key.to_string(),
        }
    } else {
        OriginError::Io(e)
    }
}

/// Rejects keys that would escape the bucket directory.
fn validate_key(key: &str) -> Result<(), OriginError> {
    let escapes = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|segment| segment == "..");
    if escapes {
        return Err(OriginError::Other(format!("unusable object key: {key:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn origin() -> (FsOrigin, TempDir) {
        let tmp = TempDir::new().expect("tempdir");
        let origin = FsOrigin::new(tmp.path(), "us-east-1").await.expect("origin");
        (origin, tmp)
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();

        let put = origin
            .put_object("b", "dir/hello.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        let got = origin.get_object("b", "dir/hello.txt", None).await.unwrap();

        assert_eq!(got.content, Bytes::from_static(b"hello"));
        assert_eq!(got.etag, put.etag);
        assert_eq!(put.etag, "5d41402abc4b2a76b9719d911017c592");
    }

    #[tokio::test]
    async fn get_missing_bucket_and_key() {
        let (origin, _tmp) = origin().await;
        assert!(matches!(
            origin.get_object("nope", "k", None).await,
            Err(OriginError::NoSuchBucket { .. })
        ));

        origin.create_bucket("b").await.unwrap();
        assert!(matches!(
            origin.get_object("b", "k", None).await,
            Err(OriginError::NoSuchKey { .. })
        ));
    }

    #[tokio::test]
    async fn create_bucket_twice() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();
        assert!(matches!(
            origin.create_bucket("b").await,
            Err(OriginError::BucketAlreadyOwnedByYou { .. })
        ));
    }

    #[tokio::test]
    async fn delete_bucket_not_empty() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();
        origin.put_object("b", "k", Bytes::from_static(b"x")).await.unwrap();

        assert!(matches!(
            origin.delete_bucket("b").await,
            Err(OriginError::BucketNotEmpty { .. })
        ));

        origin.delete_object("b", "k", None).await.unwrap();
        origin.delete_bucket("b").await.unwrap();
        assert!(matches!(
            origin.get_location("b").await,
            Err(OriginError::NoSuchBucket { .. })
        ));
    }

    #[tokio::test]
    async fn list_objects_delimiter_rollup() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();
        for key in ["a.txt", "photos/1.jpg", "photos/2.jpg", "z.txt"] {
            origin.put_object("b", key, Bytes::from_static(b"x")).await.unwrap();
        }

        let result = origin.list_objects("b", "", "", "/", 1000).await.unwrap();
        let keys: Vec<_> = result.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "z.txt"]);
        assert_eq!(result.common_prefixes, vec!["photos/".to_string()]);
        assert!(!result.is_truncated);

        // rolled-up keys never also appear as contents
        for prefix in &result.common_prefixes {
            assert!(!keys.iter().any(|k| k == prefix));
        }
    }

    #[tokio::test]
    async fn list_objects_marker_and_truncation() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();
        for key in ["a", "b", "c", "d"] {
            origin.put_object("b", key, Bytes::from_static(b"x")).await.unwrap();
        }

        let page = origin.list_objects("b", "", "", "", 2).await.unwrap();
        assert!(page.is_truncated);
        let keys: Vec<_> = page.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let rest = origin.list_objects("b", "", "b", "", 2).await.unwrap();
        let keys: Vec<_> = rest.contents.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "d"]);
        assert!(!rest.is_truncated);
    }

    #[tokio::test]
    async fn multipart_assembles_in_order() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();

        let upload_id = origin.init_upload("b", "big").await.unwrap();
        let etag1 = origin
            .upload_part("b", "big", &upload_id, 1, Bytes::from_static(b"hello "))
            .await
            .unwrap();
        let etag2 = origin
            .upload_part("b", "big", &upload_id, 2, Bytes::from_static(b"world"))
            .await
            .unwrap();

        let listed = origin.list_parts("b", "big", &upload_id, 0, 1000).await.unwrap();
        assert_eq!(listed.parts.len(), 2);
        assert_eq!(listed.parts[0].etag, etag1);

        let parts = vec![
            Part {
                part_number: 1,
                etag: etag1,
            },
            Part {
                part_number: 2,
                etag: etag2,
            },
        ];
        let done = origin.complete_upload("b", "big", &upload_id, &parts).await.unwrap();
        assert_eq!(done.location, "/b/big");

        let got = origin.get_object("b", "big", None).await.unwrap();
        assert_eq!(got.content, Bytes::from_static(b"hello world"));

        // spool is cleaned up
        assert!(matches!(
            origin.list_parts("b", "big", &upload_id, 0, 1000).await,
            Err(OriginError::NoSuchUpload { .. })
        ));
    }

    #[tokio::test]
    async fn abort_discards_upload() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();

        let upload_id = origin.init_upload("b", "k").await.unwrap();
        origin
            .upload_part("b", "k", &upload_id, 1, Bytes::from_static(b"x"))
            .await
            .unwrap();
        origin.abort_upload("b", "k", &upload_id).await.unwrap();

        assert!(matches!(
            origin.abort_upload("b", "k", &upload_id).await,
            Err(OriginError::NoSuchUpload { .. })
        ));
    }

    #[tokio::test]
    async fn list_uploads_markers() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();

        let mut ids = Vec::new();
        for key in ["a", "b", "c"] {
            ids.push(origin.init_upload("b", key).await.unwrap());
        }

        let all = origin.list_uploads("b", "", "", 1000).await.unwrap();
        assert_eq!(all.uploads.len(), 3);
        assert_eq!(all.uploads[0].key, "a");

        let after_a = origin.list_uploads("b", "a", "", 1000).await.unwrap();
        let keys: Vec<_> = after_a.uploads.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "c"]);

        let page = origin.list_uploads("b", "", "", 2).await.unwrap();
        assert!(page.is_truncated);
        assert_eq!(page.uploads.len(), 2);
    }

    #[tokio::test]
    async fn traversal_keys_rejected() {
        let (origin, _tmp) = origin().await;
        origin.create_bucket("b").await.unwrap();
        assert!(origin
            .put_object("b", "../escape", Bytes::from_static(b"x"))
            .await
            .is_err());
        assert!(origin.put_object("b", "", Bytes::from_static(b"x")).await.is_err());
    }
}
