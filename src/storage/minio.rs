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

//! MinIO, or AWS S3 itself when `is_aws_s3` is set.
//!
//! MinIO is addressed path-style (`{endpoint}/{bucket}/{key}`), AWS S3
//! virtual-hosted (`{bucket}.{endpoint}/{key}`).

use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use super::config::{Secret, TransportOptions};
use super::error::StorageResult;
use super::object_store::{
    build_adapter, endpoint_host, parse_base_url, scheme, visibility, BucketLocation,
    ObjectStoreAdapter, Vendor,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinioConfig {
    pub access_key: String,
    pub secret_key: Secret,
    /// `host[:port]`, e.g. `127.0.0.1:9000` or `s3.us-west-2.amazonaws.com`
    pub endpoint: String,
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_aws_s3: bool,
    #[serde(default)]
    pub transport: TransportOptions,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_use_ssl() -> bool {
    true
}

impl MinioConfig {
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
            bucket: bucket.into(),
            region: default_region(),
            use_ssl: true,
            is_private: false,
            is_aws_s3: false,
            transport: TransportOptions::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    pub fn with_aws_s3(mut self, is_aws_s3: bool) -> Self {
        self.is_aws_s3 = is_aws_s3;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    fn endpoint_url(&self) -> String {
        format!("{}://{}", scheme(self.use_ssl), endpoint_host(&self.endpoint))
    }

    pub fn public_base(&self) -> String {
        if self.is_aws_s3 {
            format!(
                "{}://{}.{}/",
                scheme(self.use_ssl),
                self.bucket,
                endpoint_host(&self.endpoint)
            )
        } else {
            format!("{}/{}/", self.endpoint_url(), self.bucket)
        }
    }
}

/// Build an adapter for a MinIO or S3 bucket. No request is sent.
pub fn build(config: &MinioConfig) -> StorageResult<ObjectStoreAdapter> {
    let public_base = parse_base_url(&config.public_base())?;

    let builder = AmazonS3Builder::new()
        .with_access_key_id(&config.access_key)
        .with_secret_access_key(config.secret_key.expose())
        .with_region(&config.region)
        .with_bucket_name(&config.bucket)
        .with_allow_http(!config.use_ssl);
    let builder = if config.is_aws_s3 {
        builder
            .with_endpoint(public_base.as_str().trim_end_matches('/'))
            .with_virtual_hosted_style_request(true)
    } else {
        // Path-style: the client appends `/{bucket}` itself.
        builder.with_endpoint(config.endpoint_url())
    };

    build_adapter(
        BucketLocation {
            vendor: Vendor::Minio,
            bucket: config.bucket.clone(),
            public_base,
            visibility: visibility(config.is_private),
        },
        builder,
        &config.transport,
    )
}
