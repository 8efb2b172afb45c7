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

//! Aliyun Object Storage Service, through its S3-compatible API.

use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use super::config::{Secret, TransportOptions};
use super::error::StorageResult;
use super::object_store::{
    build_adapter, endpoint_host, parse_base_url, scheme, visibility, BucketLocation,
    ObjectStoreAdapter, Vendor,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliOssConfig {
    pub access_id: String,
    pub access_key: Secret,
    /// e.g. `oss-cn-hangzhou.aliyuncs.com`
    pub endpoint: String,
    /// e.g. `cn-hangzhou`
    pub region: String,
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

impl AliOssConfig {
    pub fn new(
        access_id: impl Into<String>,
        access_key: impl Into<Secret>,
        endpoint: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            access_id: access_id.into(),
            access_key: access_key.into(),
            endpoint: endpoint.into(),
            region: region.into(),
            bucket: bucket.into(),
            is_private: false,
            use_ssl: true,
            transport: TransportOptions::default(),
        }
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

    /// `{scheme}://{bucket}.{endpoint}/`
    pub fn public_base(&self) -> String {
        format!(
            "{}://{}.{}/",
            scheme(self.use_ssl),
            self.bucket,
            endpoint_host(&self.endpoint)
        )
    }
}

/// `x-oss-process` resize in "fit inside" mode.
pub(crate) fn image_process_query(width: u32, height: u32) -> String {
    format!("x-oss-process={}", lfit_resize_style(width, height))
}

/// `image/resize,m_lfit[,w_W][,h_H]`, shared with OBS.
pub(crate) fn lfit_resize_style(width: u32, height: u32) -> String {
    let mut style = String::from("image/resize,m_lfit");
    if width > 0 {
        style.push_str(&format!(",w_{}", width));
    }
    if height > 0 {
        style.push_str(&format!(",h_{}", height));
    }
    style
}

/// Build an adapter for an OSS bucket. No request is sent.
pub fn build(config: &AliOssConfig) -> StorageResult<ObjectStoreAdapter> {
    let public_base = parse_base_url(&config.public_base())?;
    let endpoint = public_base.as_str().trim_end_matches('/').to_string();

    let builder = AmazonS3Builder::new()
        .with_access_key_id(&config.access_id)
        .with_secret_access_key(config.access_key.expose())
        .with_region(&config.region)
        .with_bucket_name(&config.bucket)
        .with_endpoint(endpoint)
        .with_virtual_hosted_style_request(true)
        .with_allow_http(!config.use_ssl);

    build_adapter(
        BucketLocation {
            vendor: Vendor::AliOss,
            bucket: config.bucket.clone(),
            public_base,
            visibility: visibility(config.is_private),
        },
        builder,
        &config.transport,
    )
}
