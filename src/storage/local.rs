// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Local filesystem adapter rooted at a base directory.

use std::fmt::{Debug, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};
use url::Url;

use super::adapter::{bytes_stream, Adapter, AttributeStream, ByteStream, Capabilities};
use super::attribute::{Attribute, DirectoryAttribute, FileAttribute, Visibility};
use super::error::{StorageError, StorageResult};
use super::path::{join_url, key_from_url, normalize, parent};
use super::{mime, thumbnail};

/// Chunk size used when streaming files off disk.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes inspected when the extension does not reveal the MIME type.
const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalConfig {
    /// Existing directory every path is resolved against.
    pub base_path: String,
    /// URL the base directory is served under. Without it `full_path`
    /// returns `file://` URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl LocalConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
}

/// `access(2)` check, so a denied path is reported as PermissionDenied
/// rather than surfacing later as an opaque I/O failure.
#[cfg(unix)]
fn check_access(path: &Path, key: &str, access: Access) -> StorageResult<()> {
    use nix::errno::Errno;
    use nix::unistd::AccessFlags;

    let flags = match access {
        Access::Read => AccessFlags::R_OK,
        Access::Write => AccessFlags::W_OK,
    };
    match nix::unistd::access(path, flags) {
        Ok(()) => Ok(()),
        Err(Errno::ENOENT) => Err(StorageError::NotFound(key.to_string())),
        Err(Errno::EACCES) | Err(Errno::EPERM) | Err(Errno::EROFS) => {
            let what = match access {
                Access::Read => "readable",
                Access::Write => "writable",
            };
            Err(StorageError::PermissionDenied(format!("{} is not {}", key, what)))
        }
        Err(errno) => Err(StorageError::IoError(io::Error::from(errno))),
    }
}

#[cfg(not(unix))]
fn check_access(_path: &Path, _key: &str, _access: Access) -> StorageResult<()> {
    Ok(())
}

/// Map I/O errors on `key`, naming the key instead of the OS message.
fn io_error(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |error| match error.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
        io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(key.to_string()),
        _ => StorageError::IoError(error),
    }
}

fn unix_seconds(modified: io::Result<SystemTime>) -> i64 {
    modified
        .map(|time| DateTime::<Utc>::from(time).timestamp())
        .unwrap_or(0)
}

fn child_key(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// MIME type from the extension, or from the first bytes of the file.
async fn sniff_file(absolute: &Path, key: &str) -> String {
    if let Some(mime_type) = mime::from_path(key) {
        return mime_type;
    }
    let mut header = Vec::with_capacity(SNIFF_LEN);
    if let Ok(file) = tokio::fs::File::open(absolute).await {
        if let Err(e) = file.take(SNIFF_LEN as u64).read_to_end(&mut header).await {
            debug!("Could not sniff {}: {}", key, e);
        }
    }
    mime::sniff(key, &header)
}

async fn attribute_for(
    absolute: &Path,
    key: String,
    metadata: &std::fs::Metadata,
) -> Attribute {
    let last_modified = unix_seconds(metadata.modified());
    if metadata.is_dir() {
        DirectoryAttribute::new(&key, Visibility::Public, last_modified).into()
    } else {
        let mime_type = sniff_file(absolute, &key).await;
        FileAttribute::new(key, Visibility::Public, mime_type, metadata.len(), last_modified)
            .into()
    }
}

/// `root.join(key)`, rejected when a symlink along the way leads outside
/// `root`. Missing trailing components are fine, so the result can be used
/// for files about to be created.
async fn resolve_within(root: &Path, key: &str) -> StorageResult<PathBuf> {
    let joined = if key.is_empty() {
        root.to_path_buf()
    } else {
        root.join(key)
    };
    let mut existing = joined.as_path();
    loop {
        match tokio::fs::canonicalize(existing).await {
            Ok(real) if real.starts_with(root) => return Ok(joined),
            Ok(_) => {
                return Err(StorageError::InvalidPath(format!(
                    "{} resolves outside the storage root",
                    key
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if tokio::fs::symlink_metadata(existing).await.is_ok() {
                    return Err(StorageError::InvalidPath(format!(
                        "{} goes through a dangling symlink",
                        key
                    )));
                }
                match existing.parent() {
                    Some(up) if up.starts_with(root) => existing = up,
                    _ => return Ok(joined),
                }
            }
            Err(e) => return Err(io_error(key)(e)),
        }
    }
}

pub struct LocalAdapter {
    root: PathBuf,
    base_url: Url,
}

impl LocalAdapter {
    /// Open a local store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_path` does not exist, is not a
    /// directory, or `base_url` is not a valid URL.
    pub fn new(config: &LocalConfig) -> StorageResult<Self> {
        let root = std::fs::canonicalize(&config.base_path).map_err(|e| {
            StorageError::ConfigError(format!(
                "Local base path '{}' is not accessible: {}",
                config.base_path, e
            ))
        })?;
        if !root.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Local base path '{}' is not a directory",
                config.base_path
            )));
        }

        let base_url = match config.base_url.as_deref() {
            Some(base_url) => {
                let mut url = Url::parse(base_url).map_err(|e| {
                    StorageError::ConfigError(format!("Invalid base url '{}': {}", base_url, e))
                })?;
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                url
            }
            None => Url::from_directory_path(&root).map_err(|_| {
                StorageError::ConfigError(format!(
                    "Cannot express '{}' as a file URL",
                    root.display()
                ))
            })?,
        };

        info!(
            "Created local adapter for root={}, base_url={}",
            root.display(),
            base_url
        );
        Ok(Self { root, base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        resolve_within(&self.root, key).await
    }

    fn file_key(path: &str) -> StorageResult<String> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Err(StorageError::InvalidPath(
                "the storage root is not a file".to_string(),
            ));
        }
        Ok(key)
    }

    async fn existing_file(&self, key: &str) -> StorageResult<(PathBuf, std::fs::Metadata)> {
        let absolute = self.resolve(key).await?;
        let metadata = tokio::fs::metadata(&absolute).await.map_err(io_error(key))?;
        if metadata.is_dir() {
            return Err(StorageError::InvalidPath(format!("{} is a directory", key)));
        }
        Ok((absolute, metadata))
    }

    /// Metadata of an existing regular file, checked for `access`.
    async fn file_metadata(
        &self,
        key: &str,
        access: Access,
    ) -> StorageResult<(PathBuf, std::fs::Metadata)> {
        let (absolute, metadata) = self.existing_file(key).await?;
        check_access(&absolute, key, access)?;
        Ok((absolute, metadata))
    }

    /// Create the parent directories of `key` and make sure they accept writes.
    async fn prepare_parent(&self, key: &str) -> StorageResult<()> {
        let parent_key = parent(key);
        let parent_path = self.resolve(parent_key).await?;
        tokio::fs::create_dir_all(&parent_path)
            .await
            .map_err(io_error(parent_key))?;
        check_access(&parent_path, parent_key, Access::Write)
    }
}

#[async_trait]
impl Adapter for LocalAdapter {
    fn name(&self) -> &'static str {
        "local"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            verifiable_dirs: true,
            remote_thumbnails: false,
        }
    }

    async fn validate_connection(&self) -> StorageResult<()> {
        let metadata = tokio::fs::metadata(&self.root).await.map_err(io_error(""))?;
        if !metadata.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "{} is no longer a directory",
                self.root.display()
            )));
        }
        check_access(&self.root, "", Access::Read)?;
        check_access(&self.root, "", Access::Write)
    }

    async fn info(&self, path: &str) -> StorageResult<Attribute> {
        let key = normalize(path)?;
        let absolute = self.resolve(&key).await?;
        let metadata = tokio::fs::metadata(&absolute).await.map_err(io_error(&key))?;
        check_access(&absolute, &key, Access::Read)?;
        Ok(attribute_for(&absolute, key, &metadata).await)
    }

    async fn has_file(&self, path: &str) -> bool {
        match Self::file_key(path) {
            Ok(key) => self.file_metadata(&key, Access::Read).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn has_dir(&self, path: &str) -> bool {
        let Ok(key) = normalize(path) else {
            return false;
        };
        let Ok(absolute) = self.resolve(&key).await else {
            return false;
        };
        match tokio::fs::metadata(&absolute).await {
            Ok(metadata) => {
                metadata.is_dir() && check_access(&absolute, &key, Access::Read).is_ok()
            }
            Err(_) => false,
        }
    }

    async fn read(&self, path: &str) -> StorageResult<ByteStream> {
        let key = Self::file_key(path)?;
        let (absolute, _) = self.file_metadata(&key, Access::Read).await?;
        let mut file = tokio::fs::File::open(&absolute)
            .await
            .map_err(io_error(&key))?;

        let stream = async_stream::try_stream! {
            let mut buffer = vec![0u8; READ_CHUNK_SIZE];
            loop {
                let read = file.read(&mut buffer).await.map_err(StorageError::from)?;
                if read == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buffer[..read]);
            }
        };
        Ok(stream.boxed())
    }

    async fn save(
        &self,
        path: &str,
        mut content: ByteStream,
        _mime_type: Option<&str>,
    ) -> StorageResult<()> {
        let key = Self::file_key(path)?;
        let absolute = self.resolve(&key).await?;
        if let Ok(metadata) = tokio::fs::metadata(&absolute).await {
            if metadata.is_dir() {
                return Err(StorageError::InvalidPath(format!("{} is a directory", key)));
            }
            check_access(&absolute, &key, Access::Write)?;
        }
        self.prepare_parent(&key).await?;

        let mut file = tokio::fs::File::create(&absolute)
            .await
            .map_err(io_error(&key))?;
        let written: StorageResult<()> = async {
            while let Some(chunk) = content.try_next().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(remove_error) = tokio::fs::remove_file(&absolute).await {
                warn!("Failed to remove partial file {}: {}", key, remove_error);
            }
            return Err(e);
        }
        debug!("Saved {}", key);
        Ok(())
    }

    async fn copy_file(&self, src: &str, dst: &str) -> StorageResult<()> {
        let src_key = Self::file_key(src)?;
        let dst_key = Self::file_key(dst)?;
        let (from, _) = self.file_metadata(&src_key, Access::Read).await?;
        self.prepare_parent(&dst_key).await?;

        let to = self.resolve(&dst_key).await?;
        if let Ok(metadata) = tokio::fs::metadata(&to).await {
            if metadata.is_dir() {
                return Err(StorageError::InvalidPath(format!("{} is a directory", dst_key)));
            }
            check_access(&to, &dst_key, Access::Write)?;
        }
        tokio::fs::copy(&from, &to).await.map_err(io_error(&src_key))?;
        debug!("Copied {} to {}", src_key, dst_key);
        Ok(())
    }

    async fn cover(&self, src: &str, dst: &str, width: u32, height: u32) -> StorageResult<()> {
        let src_key = Self::file_key(src)?;
        let dst_key = Self::file_key(dst)?;
        let source = self.read_bytes(&src_key).await?;
        let rendered = thumbnail::render_blocking(source, src_key, width, height).await?;
        self.save(
            &dst_key,
            bytes_stream(rendered.content),
            Some(&rendered.mime_type),
        )
        .await
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let key = Self::file_key(path)?;
        // Unlinking needs a writable directory; the file's own mode is irrelevant.
        let (absolute, _) = self.existing_file(&key).await?;
        let parent_key = parent(&key);
        check_access(&self.resolve(parent_key).await?, parent_key, Access::Write)?;
        tokio::fs::remove_file(&absolute)
            .await
            .map_err(io_error(&key))?;
        debug!("Deleted {}", key);
        Ok(())
    }

    async fn delete_multiple(&self, paths: &[String]) -> StorageResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let keys = paths
            .iter()
            .map(|path| Self::file_key(path))
            .collect::<StorageResult<Vec<_>>>()?;

        let mut missing = Vec::new();
        for key in &keys {
            match tokio::fs::metadata(self.resolve(key).await?).await {
                Ok(metadata) if metadata.is_file() => {}
                Ok(_) => {
                    return Err(StorageError::InvalidPath(format!("{} is a directory", key)))
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => missing.push(key.clone()),
                Err(e) => return Err(io_error(key)(e)),
            }
        }
        if !missing.is_empty() {
            return Err(StorageError::NotFound(missing.join(", ")));
        }

        let mut failed = Vec::new();
        for key in &keys {
            if let Err(e) = self.delete(key).await {
                failed.push(format!("{}: {}", key, e));
            }
        }
        if !failed.is_empty() {
            return Err(StorageError::PartialFailure {
                operation: "delete_multiple",
                total: keys.len(),
                failed,
            });
        }
        Ok(())
    }

    async fn mk_dir(&self, path: &str, mode: u32) -> StorageResult<()> {
        let key = normalize(path)?;
        let absolute = self.resolve(&key).await?;
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(mode);
        builder.create(&absolute).await.map_err(io_error(&key))?;
        debug!("Created directory {} with mode {:o}", key, mode);
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Err(StorageError::InvalidPath(
                "refusing to delete the storage root".to_string(),
            ));
        }
        let absolute = self.resolve(&key).await?;
        let metadata = tokio::fs::metadata(&absolute).await.map_err(io_error(&key))?;
        if !metadata.is_dir() {
            return Err(StorageError::InvalidPath(format!("{} is not a directory", key)));
        }
        let parent_key = parent(&key);
        check_access(&self.resolve(parent_key).await?, parent_key, Access::Write)?;
        tokio::fs::remove_dir(&absolute)
            .await
            .map_err(io_error(&key))?;
        debug!("Deleted directory {}", key);
        Ok(())
    }

    fn list(&self, dir: &str) -> AttributeStream {
        let normalized = normalize(dir);
        let root = self.root.clone();

        let stream = async_stream::try_stream! {
            let dir = normalized?;
            let absolute = resolve_within(&root, &dir).await?;
            check_access(&absolute, &dir, Access::Read)?;
            let mut entries = tokio::fs::read_dir(&absolute).await.map_err(io_error(&dir))?;

            while let Some(entry) = entries.next_entry().await.map_err(StorageError::from)? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = child_key(&dir, &name);
                let entry_path = entry.path();
                // Follow symlinks; dangling ones and those leaving the root are skipped.
                if let Err(e) = resolve_within(&root, &key).await {
                    debug!("Skipping {}: {}", key, e);
                    continue;
                }
                let metadata = match tokio::fs::metadata(&entry_path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        debug!("Skipping {}: {}", key, e);
                        continue;
                    }
                };
                yield attribute_for(&entry_path, key, &metadata).await;
            }
        };
        stream.boxed()
    }

    async fn full_path(&self, path: &str) -> StorageResult<String> {
        let key = normalize(path)?;
        Ok(join_url(&self.base_url, &key)?.to_string())
    }

    fn original_path(&self, full_url: &str) -> StorageResult<String> {
        key_from_url(full_url, &self.base_url)
    }
}

impl Debug for LocalAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Adapter(type=local, root={}, base_url={})",
            self.root.display(),
            self.base_url
        )
    }
}
