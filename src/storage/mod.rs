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

//! File storage abstraction layer
//!
//! This module provides one [`Adapter`] interface over the local filesystem
//! and several object-storage services (Aliyun OSS, Huawei OBS, Tencent COS,
//! MinIO / AWS S3), plus the [`Attribute`] model describing stored entries.
//!
//! All object-storage backends share [`ObjectStoreAdapter`], built on the
//! `object_store` crate's S3 client. Vendor modules only decide endpoints,
//! URL shapes and the remote image pipeline.

pub mod adapter;
pub mod alioss;
pub mod attribute;
pub mod config;
pub mod error;
pub mod factory;
pub mod hwobs;
pub mod local;
pub mod mime;
pub mod minio;
pub mod object_store;
pub mod path;
#[cfg(test)]
pub(crate) mod test_server;
pub mod thumbnail;
pub mod txcos;

// Public exports
pub use adapter::{bytes_stream, collect_bytes, Adapter, AttributeStream, ByteStream, Capabilities};
pub use alioss::AliOssConfig;
pub use attribute::{Attribute, DirectoryAttribute, FileAttribute, FileType, Visibility};
pub use config::{AdapterConfig, Secret, TransportOptions};
pub use error::{ErrorKind, StorageError, StorageResult};
pub use factory::{new_adapter, AdapterFactory};
pub use hwobs::HwObsConfig;
pub use local::{LocalAdapter, LocalConfig};
pub use minio::MinioConfig;
pub use self::object_store::{BucketLocation, ObjectStoreAdapter, Vendor};
pub use txcos::TxCosConfig;
