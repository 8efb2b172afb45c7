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

//! # Storage Adapter
//!
//! One file-storage contract over the local filesystem and the major
//! object-storage services.
//!
//! Application code talks to an [`Adapter`] and never to a vendor SDK. Which
//! backend sits behind it is decided by an [`AdapterConfig`], typically
//! loaded from JSON.
//!
//! ## Features
//!
//! - **Backends**: local disk, Aliyun OSS, Huawei OBS, Tencent COS, MinIO and AWS S3
//! - **Streaming**: reads and uploads are byte streams; large uploads switch to multipart
//! - **Attributes**: uniform file/directory metadata with a stable JSON form
//! - **URLs**: public or signed URLs, and the inverse mapping back to storage paths
//! - **Thumbnails**: vendor image pipelines where available, local resizing otherwise
//!
//! ## Quick Start
//!
//! ### Local Filesystem Example
//!
//! ```rust,no_run
//! use storage_adapter::storage::{bytes_stream, new_adapter, LocalConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let adapter = new_adapter(
//!     LocalConfig::new("./data").with_base_url("https://cdn.example.com/data"),
//! )
//! .await?;
//!
//! adapter
//!     .save("docs/readme.md", bytes_stream("# hello"), Some("text/markdown"))
//!     .await?;
//! let attribute = adapter.info("docs/readme.md").await?;
//! println!("{}", attribute.to_json()?);
//! println!("{}", adapter.full_path("docs/readme.md").await?);
//! # Ok(())
//! # }
//! ```
//!
//! ### MinIO Example
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use storage_adapter::storage::{new_adapter, Attribute, MinioConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = MinioConfig::new("minioadmin", "minioadmin", "127.0.0.1:9000", "media")
//!     .with_ssl(false)
//!     .with_private(true);
//!
//! let adapter = new_adapter(config).await?;
//! adapter.validate_connection().await?;
//!
//! let entries: Vec<Attribute> = adapter.list("photos").try_collect().await?;
//! for entry in entries {
//!     println!("{} {}", entry.file_type(), entry.path());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`storage`] - The adapter contract, attribute model and backends
//! - [`util`] - Utility functions and helpers

pub mod storage;
pub mod util;

// Re-export commonly used types
pub use storage::{
    new_adapter, Adapter, AdapterConfig, Attribute, StorageError, StorageResult, Visibility,
};
