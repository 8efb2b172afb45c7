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

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::warn;

use super::attribute::Attribute;
use super::error::{StorageError, StorageResult};
use super::path::normalize;

/// Lazily consumed file content. Dropping the stream releases the
/// underlying file handle or connection.
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Lazily produced directory listing.
pub type AttributeStream = BoxStream<'static, StorageResult<Attribute>>;

/// Wrap an in-memory buffer as a [`ByteStream`].
pub fn bytes_stream(content: impl Into<Bytes>) -> ByteStream {
    let content = content.into();
    stream::once(async move { Ok(content) }).boxed()
}

/// Drain a [`ByteStream`] into one buffer.
pub async fn collect_bytes(mut content: ByteStream) -> StorageResult<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = content.try_next().await? {
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// What a backend can and cannot guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `has_dir` reflects reality. Object stores only emulate directories
    /// and always answer `true`.
    pub verifiable_dirs: bool,
    /// `cover` can run on the backend's own image pipeline.
    pub remote_thumbnails: bool,
}

/// Uniform file-storage contract implemented by every backend.
///
/// Paths are backend-relative and normalized with
/// [`normalize`](super::path::normalize) before use.
/// Implementations hold no per-call mutable state and are shared as
/// `Arc<dyn Adapter>` across tasks.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short backend identifier, e.g. `"local"` or `"alioss"`.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Validate the connection to the backend.
    ///
    /// This performs one cheap round trip to ensure credentials and
    /// connectivity work. Adapter construction never does this on its own.
    async fn validate_connection(&self) -> StorageResult<()>;

    /// Metadata of a file or directory.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the target does not exist
    /// * `PermissionDenied` - the target exists but cannot be read
    /// * `Transient` - the backend could not be reached
    async fn info(&self, path: &str) -> StorageResult<Attribute>;

    /// Whether `path` is an existing file. Any lookup failure yields `false`;
    /// call [`Adapter::info`] to tell "absent" from "unreachable".
    async fn has_file(&self, path: &str) -> bool;

    /// Whether `path` is an existing directory. Never fails; see
    /// [`Capabilities::verifiable_dirs`].
    async fn has_dir(&self, path: &str) -> bool;

    /// Open a file for streaming reads.
    async fn read(&self, path: &str) -> StorageResult<ByteStream>;

    /// Read a whole file into memory.
    async fn read_bytes(&self, path: &str) -> StorageResult<Bytes> {
        collect_bytes(self.read(path).await?).await
    }

    /// Write `content` to `path`, creating or overwriting it.
    async fn save(
        &self,
        path: &str,
        content: ByteStream,
        mime_type: Option<&str>,
    ) -> StorageResult<()>;

    async fn copy_file(&self, src: &str, dst: &str) -> StorageResult<()>;

    /// Copy `src` to `dst`, then delete `src`.
    ///
    /// No backend offers an atomic rename for every case, so this is the
    /// same two-step operation everywhere. When the copy succeeds but the
    /// delete fails, both copies are left in place and the call fails with
    /// [`StorageError::PartialMove`].
    async fn move_file(&self, src: &str, dst: &str) -> StorageResult<()> {
        if normalize(src)? == normalize(dst)? {
            return self.info(src).await.map(|_| ());
        }

        self.copy_file(src, dst).await?;

        if let Err(e) = self.delete(src).await {
            warn!(
                "Move of {} to {} left the source behind: {}",
                src, dst, e
            );
            return Err(StorageError::PartialMove {
                src: src.to_string(),
                dst: dst.to_string(),
                source: Box::new(e),
            });
        }

        Ok(())
    }

    /// Write a resized copy of the image at `src` to `dst`, keeping the
    /// source format. A `width` or `height` of 0 scales that side in
    /// proportion to the other.
    async fn cover(&self, src: &str, dst: &str, width: u32, height: u32) -> StorageResult<()>;

    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Delete every path in `paths`.
    ///
    /// Fails with `NotFound` before deleting anything when a target is
    /// missing, and with `PartialFailure` when the backend rejects some of
    /// the deletions.
    async fn delete_multiple(&self, paths: &[String]) -> StorageResult<()>;

    /// Create `path` and any missing parents. A no-op on object storage.
    async fn mk_dir(&self, path: &str, mode: u32) -> StorageResult<()>;

    /// Remove an empty directory. A no-op on object storage.
    async fn delete_dir(&self, path: &str) -> StorageResult<()>;

    /// Immediate children of `dir`, in backend order. The stream drives any
    /// pagination to the end and never yields `dir` itself.
    fn list(&self, dir: &str) -> AttributeStream;

    /// Public URL, or a signed time-limited URL for private storage.
    async fn full_path(&self, path: &str) -> StorageResult<String>;

    /// Inverse of [`Adapter::full_path`]. Fails with `InvalidUrl` for URLs
    /// this adapter did not produce.
    fn original_path(&self, full_url: &str) -> StorageResult<String>;
}

impl Debug for dyn Adapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Adapter(name={})", self.name())
    }
}
