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

//! Huawei Cloud Object Storage Service.

use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use super::alioss::lfit_resize_style;
use super::config::{Secret, TransportOptions};
use super::error::StorageResult;
use super::object_store::{
    build_adapter, endpoint_host, parse_base_url, scheme, visibility, BucketLocation,
    ObjectStoreAdapter, Vendor,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HwObsConfig {
    pub access_key: String,
    pub secret_key: Secret,
    /// e.g. `obs.cn-north-4.myhuaweicloud.com`
    pub endpoint: String,
    /// Signing region. Derived from `endpoint` when empty.
    #[serde(default)]
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

impl HwObsConfig {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<Secret>,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            endpoint: endpoint.into(),
            region: String::new(),
            bucket: bucket.into(),
            is_private: false,
            use_ssl: true,
            transport: TransportOptions::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
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

    /// The configured region, or the one embedded in `obs.{region}.myhuaweicloud.com`.
    pub fn signing_region(&self) -> String {
        if !self.region.is_empty() {
            return self.region.clone();
        }
        let host = endpoint_host(&self.endpoint);
        host.strip_prefix("obs.")
            .and_then(|rest| rest.split('.').next())
            .filter(|region| !region.is_empty())
            .unwrap_or("cn-north-4")
            .to_string()
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

/// `x-image-process` resize in "fit inside" mode.
pub(crate) fn image_process_query(width: u32, height: u32) -> String {
    format!("x-image-process={}", lfit_resize_style(width, height))
}

/// Build an adapter for an OBS bucket. No request is sent.
pub fn build(config: &HwObsConfig) -> StorageResult<ObjectStoreAdapter> {
    let public_base = parse_base_url(&config.public_base())?;
    let endpoint = public_base.as_str().trim_end_matches('/').to_string();

    let builder = AmazonS3Builder::new()
        .with_access_key_id(&config.access_key)
        .with_secret_access_key(config.secret_key.expose())
        .with_region(config.signing_region())
        .with_bucket_name(&config.bucket)
        .with_endpoint(endpoint)
        .with_virtual_hosted_style_request(true)
        .with_allow_http(!config.use_ssl);

    build_adapter(
        BucketLocation {
            vendor: Vendor::HwObs,
            bucket: config.bucket.clone(),
            public_base,
            visibility: visibility(config.is_private),
        },
        builder,
        &config.transport,
    )
}
