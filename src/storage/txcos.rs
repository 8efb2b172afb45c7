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

//! Tencent Cloud Object Storage.
//!
//! COS buckets are addressed as `{bucket}.cos.{region}.myqcloud.com`, so
//! the endpoint is derived from the region and never configured directly.

use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use super::config::{Secret, TransportOptions};
use super::error::StorageResult;
use super::object_store::{
    build_adapter, parse_base_url, scheme, visibility, BucketLocation, ObjectStoreAdapter, Vendor,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxCosConfig {
    pub secret_id: String,
    pub secret_key: Secret,
    /// Temporary session token issued by STS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Secret>,
    /// e.g. `ap-guangzhou`
    pub region: String,
    /// Full bucket name including the APPID suffix, e.g. `media-1250000000`.
    pub bucket: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,
    #[serde(default)]
    pub transport: TransportOptions,
}

fn default_use_ssl() -> bool {
    true
}

impl TxCosConfig {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<Secret>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            token: None,
            region: region.into(),
            bucket: bucket.into(),
            is_private: false,
            use_ssl: true,
            transport: TransportOptions::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<Secret>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// `{scheme}://{bucket}.cos.{region}.myqcloud.com/`
    pub fn public_base(&self) -> String {
        format!(
            "{}://{}.cos.{}.myqcloud.com/",
            scheme(self.use_ssl),
            self.bucket,
            self.region
        )
    }
}

/// Data-processing suffix for `imageMogr2` thumbnails: `WxH`, `Wx` or `xH`.
pub(crate) fn image_process_query(width: u32, height: u32) -> String {
    let mut operation = String::from("imageMogr2/thumbnail/");
    if width > 0 {
        operation.push_str(&format!("{}x", width));
    }
    if height > 0 {
        if width > 0 {
            operation.push_str(&height.to_string());
        } else {
            operation.push_str(&format!("x{}", height));
        }
    }
    operation
}

/// Build an adapter for a COS bucket. No request is sent.
pub fn build(config: &TxCosConfig) -> StorageResult<ObjectStoreAdapter> {
    let public_base = parse_base_url(&config.public_base())?;
    let endpoint = public_base.as_str().trim_end_matches('/').to_string();

    let mut builder = AmazonS3Builder::new()
        .with_access_key_id(&config.secret_id)
        .with_secret_access_key(config.secret_key.expose())
        .with_region(&config.region)
        .with_bucket_name(&config.bucket)
        .with_endpoint(endpoint)
        .with_virtual_hosted_style_request(true)
        .with_allow_http(!config.use_ssl);
    if let Some(token) = config.token.as_ref().filter(|token| !token.is_empty()) {
        builder = builder.with_token(token.expose());
    }

    build_adapter(
        BucketLocation {
            vendor: Vendor::TxCos,
            bucket: config.bucket.clone(),
            public_base,
            visibility: visibility(config.is_private),
        },
        builder,
        &config.transport,
    )
}
