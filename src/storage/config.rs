// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::alioss::AliOssConfig;
use super::error::StorageResult;
use super::hwobs::HwObsConfig;
use super::local::LocalConfig;
use super::minio::MinioConfig;
use super::txcos::TxCosConfig;

/// Backend configuration, one variant per supported store.
///
/// Serialized with a `type` tag so deployments can keep adapter settings
/// in JSON.
///
/// # Examples
///
/// ## Local filesystem
/// ```
/// use storage_adapter::storage::{AdapterConfig, LocalConfig};
///
/// let config = AdapterConfig::Local(
///     LocalConfig::new("/tmp/data").with_base_url("https://cdn.example.com/data"),
/// );
/// assert_eq!(config.backend_name(), "local");
/// ```
///
/// ## MinIO
/// ```
/// use storage_adapter::storage::{AdapterConfig, MinioConfig};
///
/// let config = AdapterConfig::from_json(
///     r#"{"type":"minio","access_key":"AK","secret_key":"SK",
///         "endpoint":"127.0.0.1:9000","bucket":"media"}"#,
/// )
/// .unwrap();
/// assert_eq!(config.backend_name(), "minio");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdapterConfig {
    /// Local filesystem storage
    Local(LocalConfig),
    /// Aliyun Object Storage Service
    AliOss(AliOssConfig),
    /// Huawei Cloud Object Storage Service
    HwObs(HwObsConfig),
    /// Tencent Cloud Object Storage
    TxCos(TxCosConfig),
    /// MinIO or AWS S3
    Minio(MinioConfig),
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Get the backend type as a string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            AdapterConfig::Local(_) => "local",
            AdapterConfig::AliOss(_) => "alioss",
            AdapterConfig::HwObs(_) => "hwobs",
            AdapterConfig::TxCos(_) => "txcos",
            AdapterConfig::Minio(_) => "minio",
        }
    }
}

impl From<LocalConfig> for AdapterConfig {
    fn from(config: LocalConfig) -> Self {
        AdapterConfig::Local(config)
    }
}

impl From<AliOssConfig> for AdapterConfig {
    fn from(config: AliOssConfig) -> Self {
        AdapterConfig::AliOss(config)
    }
}

impl From<HwObsConfig> for AdapterConfig {
    fn from(config: HwObsConfig) -> Self {
        AdapterConfig::HwObs(config)
    }
}

impl From<TxCosConfig> for AdapterConfig {
    fn from(config: TxCosConfig) -> Self {
        AdapterConfig::TxCos(config)
    }
}

impl From<MinioConfig> for AdapterConfig {
    fn from(config: MinioConfig) -> Self {
        AdapterConfig::Minio(config)
    }
}

/// Timeout, retry and connection pool settings for remote backends.
///
/// All durations are in seconds; a timeout of 0 disables it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportOptions {
    pub timeout: u64,
    pub connect_timeout: u64,
    /// Per-request retries inside the HTTP client.
    pub max_retries: usize,
    pub retry_timeout: u64,
    /// Whole-operation retries for idempotent reads, on top of `max_retries`.
    pub operation_retries: usize,
    pub pool_idle_timeout: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: 1200,
            connect_timeout: 30,
            max_retries: 20,
            retry_timeout: 1200,
            operation_retries: 3,
            pool_idle_timeout: 15,
            pool_max_idle_per_host: 5,
        }
    }
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}
