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

//! Adapter shared by every object-storage backend.
//!
//! Aliyun OSS, Huawei OBS, Tencent COS and MinIO all speak the S3 protocol,
//! so one `object_store` S3 client serves them all. What differs per vendor
//! is captured by [`BucketLocation`]: where public URLs live and which
//! remote image pipeline (if any) `cover` can use.

use super::adapter::{bytes_stream, Adapter, AttributeStream, ByteStream, Capabilities};
use super::attribute::{Attribute, DirectoryAttribute, FileAttribute, Visibility};
use super::config::TransportOptions;
use super::error::{StorageError, StorageResult};
use super::path::{join_url, key_from_url, normalize, to_object_path};
use super::{alioss, hwobs, mime, thumbnail, txcos};
use crate::util::retry::retry_with_max_retries;
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::signer::Signer;
use object_store::{
    Attribute as ObjectAttribute, Attributes, ClientOptions, GetOptions, ListResult, ObjectStore,
    ObjectStoreExt, RetryConfig,
};
use reqwest::header::CONTENT_TYPE;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Lifetime of signed URLs handed out for private buckets.
pub const SIGNED_URL_VALIDITY: Duration = Duration::from_secs(8 * 3600 + 60);

/// Concurrent existence checks issued by `delete_multiple`.
const EXISTENCE_CHECK_PARALLELISM: usize = 8;

/// Object-storage service behind an [`ObjectStoreAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    AliOss,
    HwObs,
    TxCos,
    Minio,
}

impl Vendor {
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::AliOss => "alioss",
            Vendor::HwObs => "hwobs",
            Vendor::TxCos => "txcos",
            Vendor::Minio => "minio",
        }
    }

    /// Query string asking the vendor's image pipeline for a thumbnail,
    /// `None` when the vendor has no pipeline or nothing needs resizing.
    pub fn image_process_query(&self, width: u32, height: u32) -> Option<String> {
        if width == 0 && height == 0 {
            return None;
        }
        match self {
            Vendor::AliOss => Some(alioss::image_process_query(width, height)),
            Vendor::HwObs => Some(hwobs::image_process_query(width, height)),
            Vendor::TxCos => Some(txcos::image_process_query(width, height)),
            Vendor::Minio => None,
        }
    }
}

/// Where a bucket lives and how it is exposed.
#[derive(Debug, Clone)]
pub struct BucketLocation {
    pub vendor: Vendor,
    pub bucket: String,
    /// URL that object keys are appended to, e.g.
    /// `https://media.oss-cn-hangzhou.aliyuncs.com/` or the path-style
    /// `http://127.0.0.1:9000/media/`.
    pub public_base: Url,
    pub visibility: Visibility,
}

/// Build connection options from transport settings.
pub(crate) fn build_connection_options(transport: &TransportOptions) -> ClientOptions {
    let mut client_options = ClientOptions::default();
    client_options = if transport.timeout == 0 {
        client_options.with_timeout_disabled()
    } else {
        client_options.with_timeout(Duration::from_secs(transport.timeout))
    };
    client_options = if transport.connect_timeout == 0 {
        client_options.with_connect_timeout_disabled()
    } else {
        client_options.with_connect_timeout(Duration::from_secs(transport.connect_timeout))
    };
    client_options
        .with_pool_idle_timeout(Duration::from_secs(transport.pool_idle_timeout))
        .with_pool_max_idle_per_host(transport.pool_max_idle_per_host)
}

/// Build retry options from transport settings.
pub(crate) fn build_retry_options(transport: &TransportOptions) -> RetryConfig {
    RetryConfig {
        backoff: Default::default(),
        max_retries: transport.max_retries,
        retry_timeout: Duration::from_secs(transport.retry_timeout),
    }
}

/// Finish an S3 builder with the shared transport settings.
///
/// # Errors
///
/// Returns `ConfigError` if the builder rejects its configuration
/// (missing bucket, malformed endpoint, ...). Nothing is sent over the
/// network here.
pub(crate) fn build_s3_store(
    builder: AmazonS3Builder,
    transport: &TransportOptions,
    vendor: Vendor,
) -> StorageResult<Arc<AmazonS3>> {
    let store = builder
        .with_client_options(build_connection_options(transport))
        .with_retry(build_retry_options(transport))
        .build()
        .map_err(|e| {
            StorageError::ConfigError(format!("Failed to create {} store: {}", vendor.name(), e))
        })?;
    Ok(Arc::new(store))
}

/// `http` or `https` depending on the transport flag.
pub(crate) fn scheme(use_ssl: bool) -> &'static str {
    if use_ssl {
        "https"
    } else {
        "http"
    }
}

/// Parse a base URL, keeping configuration mistakes as `ConfigError`.
pub(crate) fn parse_base_url(url: &str) -> StorageResult<Url> {
    Url::parse(url)
        .map_err(|e| StorageError::ConfigError(format!("Invalid endpoint '{}': {}", url, e)))
}

/// Endpoint host without scheme or trailing slash, so configs may carry
/// either `oss-cn-hangzhou.aliyuncs.com` or `https://oss-cn-hangzhou.aliyuncs.com/`.
pub(crate) fn endpoint_host(endpoint: &str) -> &str {
    let endpoint = endpoint.trim();
    let endpoint = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint);
    endpoint.trim_end_matches('/')
}

/// Build the S3 client for `location` and wrap it in an adapter.
///
/// `builder` must already carry credentials, bucket and endpoint. The store
/// doubles as the signer for private URLs.
pub(crate) fn build_adapter(
    location: BucketLocation,
    builder: AmazonS3Builder,
    transport: &TransportOptions,
) -> StorageResult<ObjectStoreAdapter> {
    if location.bucket.is_empty() {
        return Err(StorageError::ConfigError(format!(
            "{} bucket name must not be empty",
            location.vendor.name()
        )));
    }
    let store = build_s3_store(builder, transport, location.vendor)?;
    let signer: Arc<dyn Signer> = store.clone();
    ObjectStoreAdapter::new(location, store, signer, transport)
}

pub(crate) fn visibility(is_private: bool) -> Visibility {
    if is_private {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

/// Adapter over any S3-compatible object store.
pub struct ObjectStoreAdapter {
    location: BucketLocation,
    store: Arc<dyn ObjectStore>,
    signer: Arc<dyn Signer>,
    http: reqwest::Client,
    operation_retries: usize,
}

impl ObjectStoreAdapter {
    /// Assemble an adapter from an already built store and signer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client used for remote image
    /// processing cannot be created.
    pub fn new(
        location: BucketLocation,
        store: Arc<dyn ObjectStore>,
        signer: Arc<dyn Signer>,
        transport: &TransportOptions,
    ) -> StorageResult<Self> {
        let mut http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(transport.pool_idle_timeout))
            .pool_max_idle_per_host(transport.pool_max_idle_per_host);
        if transport.timeout > 0 {
            http = http.timeout(Duration::from_secs(transport.timeout));
        }
        if transport.connect_timeout > 0 {
            http = http.connect_timeout(Duration::from_secs(transport.connect_timeout));
        }
        let http = http
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Created {} adapter for bucket={}, public_base={}, visibility={:?}",
            location.vendor.name(),
            location.bucket,
            location.public_base,
            location.visibility
        );

        Ok(Self {
            location,
            store,
            signer,
            http,
            operation_retries: transport.operation_retries,
        })
    }

    pub fn location(&self) -> &BucketLocation {
        &self.location
    }

    /// Retry wrapper for operations that may fail due to transient network errors.
    async fn retry_operation<F, Fut, T>(&self, operation_name: &str, operation: F) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        retry_with_max_retries(self.operation_retries, operation_name, operation).await
    }

    fn file_key(path: &str) -> StorageResult<String> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Err(StorageError::InvalidPath(
                "the bucket root is not a file".to_string(),
            ));
        }
        Ok(key)
    }

    /// Ask the vendor's image pipeline for the derivative and store it.
    async fn remote_cover(&self, src_key: &str, dst_key: &str, query: &str) -> StorageResult<()> {
        let mut url = join_url(&self.location.public_base, src_key)?;
        url.set_query(Some(query));

        let response = self.http.get(url).send().await?.error_for_status()?;
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        self.save(dst_key, bytes_stream(body), mime_type.as_deref())
            .await
    }
}

/// Turn one delimiter listing of `prefix` into attributes.
///
/// Common prefixes become directories. The zero-length marker object some
/// tools create for `prefix/` itself is dropped.
pub(crate) fn listing_to_attributes(
    prefix: &str,
    listing: ListResult,
    visibility: Visibility,
) -> Vec<Attribute> {
    let directories = listing
        .common_prefixes
        .into_iter()
        .map(|common_prefix| {
            Attribute::from(DirectoryAttribute::new(common_prefix.to_string(), visibility, 0))
        });

    let files = listing
        .objects
        .into_iter()
        .filter(|meta| {
            let key: &str = meta.location.as_ref();
            !key.is_empty() && key != prefix
        })
        .map(|meta| {
            let key = meta.location.to_string();
            let mime_type = mime::guess(&key);
            Attribute::from(FileAttribute::new(
                key,
                visibility,
                mime_type,
                meta.size,
                meta.last_modified.timestamp(),
            ))
        });

    directories.chain(files).collect()
}

#[async_trait]
impl Adapter for ObjectStoreAdapter {
    fn name(&self) -> &'static str {
        self.location.vendor.name()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            verifiable_dirs: false,
            remote_thumbnails: self.location.visibility == Visibility::Public
                && self.location.vendor.image_process_query(1, 1).is_some(),
        }
    }

    async fn validate_connection(&self) -> StorageResult<()> {
        self.store.list_with_delimiter(None).await?;
        Ok(())
    }

    async fn info(&self, path: &str) -> StorageResult<Attribute> {
        let key = normalize(path)?;
        let visibility = self.location.visibility;
        if key.is_empty() {
            return Ok(DirectoryAttribute::new("", visibility, 0).into());
        }

        let location = to_object_path(&key);
        let store = Arc::clone(&self.store);
        let head = self
            .retry_operation(&format!("info({})", key), || async {
                let options = GetOptions {
                    head: true,
                    ..Default::default()
                };
                store
                    .get_opts(&location, options)
                    .await
                    .map_err(StorageError::from)
            })
            .await;

        match head {
            Ok(result) => {
                let mime_type = result
                    .attributes
                    .get(&ObjectAttribute::ContentType)
                    .map(|value| {
                        let value: &str = value.as_ref();
                        value.to_string()
                    })
                    .unwrap_or_else(|| mime::guess(&key));
                Ok(FileAttribute::new(
                    key,
                    visibility,
                    mime_type,
                    result.meta.size,
                    result.meta.last_modified.timestamp(),
                )
                .into())
            }
            Err(e) if e.is_not_found() => {
                // No object under this key; it may still be a prefix.
                let mut probe = self.store.list(Some(&location));
                match probe.next().await {
                    Some(Ok(_)) => Ok(DirectoryAttribute::new(&key, visibility, 0).into()),
                    Some(Err(e)) => Err(e.into()),
                    None => Err(StorageError::NotFound(key)),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn has_file(&self, path: &str) -> bool {
        match Self::file_key(path) {
            Ok(key) => self.store.head(&to_object_path(&key)).await.is_ok(),
            Err(_) => false,
        }
    }

    async fn has_dir(&self, _path: &str) -> bool {
        true
    }

    async fn read(&self, path: &str) -> StorageResult<ByteStream> {
        let key = Self::file_key(path)?;
        let location = to_object_path(&key);
        let store = Arc::clone(&self.store);

        let result = self
            .retry_operation(&format!("read({})", key), || async {
                store.get(&location).await.map_err(StorageError::from)
            })
            .await?;

        Ok(result.into_stream().map_err(StorageError::from).boxed())
    }

    async fn save(
        &self,
        path: &str,
        mut content: ByteStream,
        mime_type: Option<&str>,
    ) -> StorageResult<()> {
        let key = Self::file_key(path)?;
        let mime_type = mime_type
            .filter(|mime_type| !mime_type.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| mime::guess(&key));
        debug!("Saving {} as {}", key, mime_type);

        let mut attributes = Attributes::new();
        attributes.insert(ObjectAttribute::ContentType, mime_type.into());

        // Small payloads go out as one PUT, larger ones switch to multipart.
        let mut writer = BufWriter::new(Arc::clone(&self.store), to_object_path(&key))
            .with_attributes(attributes);

        let written: StorageResult<()> = async {
            while let Some(chunk) = content.try_next().await? {
                writer.write_all(&chunk).await?;
            }
            writer.shutdown().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            if let Err(abort_error) = writer.abort().await {
                warn!("Failed to abort upload of {}: {}", key, abort_error);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn copy_file(&self, src: &str, dst: &str) -> StorageResult<()> {
        let from = to_object_path(&Self::file_key(src)?);
        let to = to_object_path(&Self::file_key(dst)?);
        self.store.copy(&from, &to).await?;
        Ok(())
    }

    async fn cover(&self, src: &str, dst: &str, width: u32, height: u32) -> StorageResult<()> {
        let src_key = Self::file_key(src)?;
        let dst_key = Self::file_key(dst)?;

        if self.location.visibility == Visibility::Public {
            if let Some(query) = self.location.vendor.image_process_query(width, height) {
                match self.remote_cover(&src_key, &dst_key, &query).await {
                    Ok(()) => return Ok(()),
                    Err(e) => warn!(
                        "Remote thumbnail of {} on {} failed, resizing locally: {}",
                        src_key,
                        self.name(),
                        e
                    ),
                }
            }
        }

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
        self.store.delete(&to_object_path(&key)).await?;
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

        // Bulk delete reports absent keys as deleted, so check them up front.
        let store = Arc::clone(&self.store);
        let missing: Vec<String> = stream::iter(keys.clone())
            .map(|key| {
                let store = Arc::clone(&store);
                async move {
                    match store.head(&to_object_path(&key)).await {
                        Ok(_) => Ok(None),
                        Err(object_store::Error::NotFound { .. }) => Ok(Some(key)),
                        Err(e) => Err(StorageError::from(e)),
                    }
                }
            })
            .buffer_unordered(EXISTENCE_CHECK_PARALLELISM)
            .try_filter_map(|missing| future::ready(Ok(missing)))
            .try_collect()
            .await?;

        if !missing.is_empty() {
            return Err(StorageError::NotFound(missing.join(", ")));
        }

        let locations = stream::iter(
            keys.iter()
                .map(|key| Ok(to_object_path(key)))
                .collect::<Vec<_>>(),
        )
        .boxed();
        let failed: Vec<String> = self
            .store
            .delete_stream(locations)
            .filter_map(|result| future::ready(result.err().map(|e| e.to_string())))
            .collect()
            .await;

        if !failed.is_empty() {
            return Err(StorageError::PartialFailure {
                operation: "delete_multiple",
                total: keys.len(),
                failed,
            });
        }

        debug!("Deleted count={} objects from {}", keys.len(), self.location.bucket);
        Ok(())
    }

    async fn mk_dir(&self, path: &str, _mode: u32) -> StorageResult<()> {
        debug!("mk_dir({}) is a no-op on {}", path, self.name());
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        debug!("delete_dir({}) is a no-op on {}", path, self.name());
        Ok(())
    }

    fn list(&self, dir: &str) -> AttributeStream {
        let prefix = match normalize(dir) {
            Ok(prefix) => prefix,
            Err(e) => return stream::once(future::ready(Err(e))).boxed(),
        };
        let store = Arc::clone(&self.store);
        let visibility = self.location.visibility;
        let operation_retries = self.operation_retries;

        stream::once(async move {
            let location = (!prefix.is_empty()).then(|| to_object_path(&prefix));
            // `list_with_delimiter` follows continuation tokens until the
            // listing is no longer truncated.
            let listing = retry_with_max_retries(operation_retries, &format!("list({})", prefix), || async {
                store
                    .list_with_delimiter(location.as_ref())
                    .await
                    .map_err(StorageError::from)
            })
            .await?;

            debug!(
                "Listed prefix={}, found count={} objects and {} prefixes",
                prefix,
                listing.objects.len(),
                listing.common_prefixes.len()
            );
            Ok::<_, StorageError>(listing_to_attributes(&prefix, listing, visibility))
        })
        .map_ok(|attributes| stream::iter(attributes.into_iter().map(Ok::<_, StorageError>)))
        .try_flatten()
        .boxed()
    }

    async fn full_path(&self, path: &str) -> StorageResult<String> {
        let key = normalize(path)?;
        match self.location.visibility {
            Visibility::Public => Ok(join_url(&self.location.public_base, &key)?.to_string()),
            Visibility::Private => {
                let url = self
                    .signer
                    .signed_url(Method::GET, &to_object_path(&key), SIGNED_URL_VALIDITY)
                    .await?;
                Ok(url.to_string())
            }
        }
    }

    fn original_path(&self, full_url: &str) -> StorageResult<String> {
        key_from_url(full_url, &self.location.public_base)
    }
}

impl Debug for ObjectStoreAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Adapter(type={}, bucket={}, public_base={})",
            self.location.vendor.name(),
            self.location.bucket,
            self.location.public_base
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::adapter::collect_bytes;
    use crate::storage::minio::{self, MinioConfig};
    use crate::storage::test_server::{Request, Response, TestServer};
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;
    use object_store::{ClientConfigKey, ObjectMeta, PutPayload};
    use std::collections::HashSet;

    /// Deterministic stand-in for S3 query signing.
    #[derive(Debug)]
    pub(crate) struct TestSigner {
        pub base: Url,
    }

    #[async_trait]
    impl Signer for TestSigner {
        async fn signed_url(
            &self,
            _method: Method,
            path: &ObjectPath,
            expires_in: Duration,
        ) -> object_store::Result<Url> {
            let mut url = join_url(&self.base, path.as_ref()).map_err(|e| {
                object_store::Error::Generic {
                    store: "test",
                    source: Box::new(e),
                }
            })?;
            url.query_pairs_mut()
                .append_pair("X-Amz-Expires", &expires_in.as_secs().to_string())
                .append_pair("X-Amz-Signature", "deadbeef");
            Ok(url)
        }
    }

    pub(crate) fn memory_adapter(vendor: Vendor, visibility: Visibility) -> ObjectStoreAdapter {
        memory_adapter_at(vendor, visibility, "http://127.0.0.1:9000/media/")
    }

    /// In-memory bucket whose public URLs point at `public_base`.
    fn memory_adapter_at(vendor: Vendor, visibility: Visibility, public_base: &str) -> ObjectStoreAdapter {
        let public_base = Url::parse(public_base).unwrap();
        ObjectStoreAdapter::new(
            BucketLocation {
                vendor,
                bucket: "media".to_string(),
                public_base: public_base.clone(),
                visibility,
            },
            Arc::new(InMemory::new()),
            Arc::new(TestSigner { base: public_base }),
            &TransportOptions {
                max_retries: 0,
                operation_retries: 0,
                ..TransportOptions::default()
            },
        )
        .unwrap()
    }

    /// MinIO adapter whose S3 client talks to `server`.
    fn s3_adapter(server: &TestServer) -> ObjectStoreAdapter {
        let transport = TransportOptions {
            timeout: 10,
            connect_timeout: 5,
            max_retries: 0,
            retry_timeout: 5,
            operation_retries: 0,
            ..TransportOptions::default()
        };
        minio::build(
            &MinioConfig::new("AK", "SK", server.endpoint(), "media")
                .with_ssl(false)
                .with_transport(transport),
        )
        .unwrap()
    }

    fn s3_head() -> Response {
        Response::ok(Vec::new())
            .header("Content-Length", "1")
            .header("Last-Modified", "Mon, 01 Jan 2024 00:00:00 GMT")
            .header("ETag", "\"0cc175b9c0f1b6a831c399e269772661\"")
    }

    fn s3_object(key: &str, size: u64) -> String {
        format!(
            "<Contents><Key>{}</Key><LastModified>2024-01-01T00:00:00.000Z</LastModified>\
             <ETag>&quot;x&quot;</ETag><Size>{}</Size><StorageClass>STANDARD</StorageClass></Contents>",
            key, size
        )
    }

    const BULK_OBJECTS: usize = 2500;
    const PAGE_SIZE: usize = 1000;

    /// ListObjectsV2 over `bulk/`, `PAGE_SIZE` keys per page. The first
    /// page also carries the `bulk/` marker object, the second a sub-prefix.
    fn bulk_listing_page(request: &Request) -> Response {
        let start: usize = request
            .query("continuation-token")
            .and_then(|token| token.parse().ok())
            .unwrap_or(0);
        let end = (start + PAGE_SIZE).min(BULK_OBJECTS);

        let mut body = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Name>media</Name><Prefix>bulk/</Prefix><Delimiter>/</Delimiter>",
        );
        body.push_str(&format!("<KeyCount>{}</KeyCount>", end - start));
        if start == 0 {
            body.push_str(&s3_object("bulk/", 0));
        }
        for i in start..end {
            body.push_str(&s3_object(&format!("bulk/{:05}.bin", i), 1));
        }
        if start == PAGE_SIZE {
            body.push_str("<CommonPrefixes><Prefix>bulk/nested/</Prefix></CommonPrefixes>");
        }
        if end < BULK_OBJECTS {
            body.push_str(&format!(
                "<IsTruncated>true</IsTruncated><NextContinuationToken>{}</NextContinuationToken>",
                end
            ));
        } else {
            body.push_str("<IsTruncated>false</IsTruncated>");
        }
        body.push_str("</ListBucketResult>");
        Response::xml(body)
    }

    async fn put(adapter: &ObjectStoreAdapter, key: &str, content: &'static [u8]) {
        adapter
            .store
            .put(&to_object_path(key), PutPayload::from_static(content))
            .await
            .unwrap();
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut encoded = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut encoded),
                image::ImageFormat::Png,
            )
            .unwrap();
        encoded
    }

    #[test]
    fn test_build_connection_options_default() {
        let options = build_connection_options(&TransportOptions::default());
        assert!(options.get_config_value(&ClientConfigKey::Timeout).is_some());
        assert!(options.get_config_value(&ClientConfigKey::ConnectTimeout).is_some());
        assert!(options.get_config_value(&ClientConfigKey::PoolIdleTimeout).is_some());
        assert!(options
            .get_config_value(&ClientConfigKey::PoolMaxIdlePerHost)
            .is_some());
    }

    #[test]
    fn test_build_connection_options_disabled_timeout() {
        let transport = TransportOptions {
            timeout: 0,
            connect_timeout: 0,
            ..TransportOptions::default()
        };
        let options = build_connection_options(&transport);
        assert!(options.get_config_value(&ClientConfigKey::Timeout).is_none());
        assert!(options.get_config_value(&ClientConfigKey::ConnectTimeout).is_none());
    }

    #[test]
    fn test_build_retry_options_custom() {
        let transport = TransportOptions {
            max_retries: 5,
            retry_timeout: 300,
            ..TransportOptions::default()
        };
        let retry_config = build_retry_options(&transport);
        assert_eq!(retry_config.max_retries, 5);
        assert_eq!(retry_config.retry_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_scheme_follows_transport_flag() {
        assert_eq!(scheme(true), "https");
        assert_eq!(scheme(false), "http");
    }

    #[test]
    fn test_endpoint_host() {
        assert_eq!(endpoint_host("oss-cn-hangzhou.aliyuncs.com"), "oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(endpoint_host("https://obs.cn-north-4.myhuaweicloud.com/"), "obs.cn-north-4.myhuaweicloud.com");
        assert_eq!(endpoint_host(" http://127.0.0.1:9000 "), "127.0.0.1:9000");
    }

    #[test]
    fn test_image_process_query_needs_a_dimension() {
        assert!(Vendor::AliOss.image_process_query(0, 0).is_none());
        assert!(Vendor::Minio.image_process_query(100, 100).is_none());
        assert!(Vendor::TxCos.image_process_query(100, 0).is_some());
    }

    #[tokio::test]
    async fn test_save_then_read() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);

        adapter
            .save("docs/readme.md", bytes_stream("# hello"), Some("text/markdown"))
            .await
            .unwrap();

        assert!(adapter.has_file("docs/readme.md").await);
        let content = collect_bytes(adapter.read("/docs/readme.md").await.unwrap())
            .await
            .unwrap();
        assert_eq!(content, "# hello");
    }

    #[tokio::test]
    async fn test_info_of_file() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Private);
        adapter
            .save("docs/readme.md", bytes_stream("# hello"), Some("text/markdown"))
            .await
            .unwrap();

        let attribute = adapter.info("docs/readme.md").await.unwrap();
        let file = attribute.as_file().unwrap();
        assert_eq!(file.name(), "readme.md");
        assert_eq!(file.path(), "docs/readme.md");
        assert_eq!(file.file_size(), 7);
        assert_eq!(file.mime_type(), "text/markdown");
        assert_eq!(file.visibility(), Visibility::Private);
    }

    #[tokio::test]
    async fn test_info_of_missing_path() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);

        let error = adapter.info("nope.txt").await.unwrap_err();
        assert!(error.is_not_found());
        assert!(!adapter.has_file("nope.txt").await);
    }

    #[tokio::test]
    async fn test_info_of_prefix_is_directory() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        put(&adapter, "photos/2024/cat.png", b"png").await;

        let attribute = adapter.info("photos/").await.unwrap();
        assert!(attribute.is_dir());
        assert_eq!(attribute.path(), "photos");
    }

    #[tokio::test]
    async fn test_directories_are_emulated() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);

        assert!(adapter.has_dir("does/not/matter").await);
        adapter.mk_dir("new/dir", 0o755).await.unwrap();
        adapter.delete_dir("new/dir").await.unwrap();
        assert!(!adapter.capabilities().verifiable_dirs);
    }

    #[tokio::test]
    async fn test_list_groups_prefixes() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        put(&adapter, "photos/a.png", b"a").await;
        put(&adapter, "photos/b.png", b"bb").await;
        put(&adapter, "photos/2024/c.png", b"ccc").await;
        put(&adapter, "other/d.png", b"d").await;

        let entries: Vec<Attribute> = adapter.list("photos").try_collect().await.unwrap();

        let dirs: Vec<&str> = entries.iter().filter(|a| a.is_dir()).map(|a| a.path()).collect();
        let files: Vec<&str> = entries.iter().filter(|a| a.is_file()).map(|a| a.path()).collect();
        assert_eq!(dirs, vec!["photos/2024"]);
        assert_eq!(files, vec!["photos/a.png", "photos/b.png"]);
    }

    #[tokio::test]
    async fn test_list_is_exhaustive() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        for i in 0..2500 {
            adapter
                .store
                .put(
                    &to_object_path(&format!("bulk/{:05}.bin", i)),
                    PutPayload::from_static(b"x"),
                )
                .await
                .unwrap();
        }

        let entries: Vec<Attribute> = adapter.list("bulk/").try_collect().await.unwrap();
        let distinct: HashSet<&str> = entries.iter().map(|a| a.path()).collect();

        assert_eq!(entries.len(), 2500);
        assert_eq!(distinct.len(), 2500);
        assert!(!distinct.contains("bulk"));
    }

    #[tokio::test]
    async fn test_list_follows_continuation_tokens() {
        let server = TestServer::start(|request| {
            if request.method == "GET" && request.query("list-type").is_some() {
                bulk_listing_page(request)
            } else {
                Response::status(404)
            }
        })
        .await;
        let adapter = s3_adapter(&server);

        let entries: Vec<Attribute> = adapter.list("bulk").try_collect().await.unwrap();
        let distinct: HashSet<&str> = entries.iter().map(|a| a.path()).collect();
        let files = entries.iter().filter(|a| a.is_file()).count();
        let dirs: Vec<&str> = entries.iter().filter(|a| a.is_dir()).map(|a| a.path()).collect();

        assert_eq!(files, BULK_OBJECTS);
        assert_eq!(dirs, vec!["bulk/nested"]);
        assert_eq!(distinct.len(), BULK_OBJECTS + 1);
        assert!(!distinct.contains("bulk"));

        let pages: Vec<Option<String>> = server
            .requests()
            .iter()
            .filter(|request| request.query("list-type").is_some())
            .map(|request| request.query("continuation-token"))
            .collect();
        assert_eq!(
            pages,
            vec![None, Some("1000".to_string()), Some("2000".to_string())]
        );
    }

    #[test]
    fn test_listing_skips_directory_marker() {
        let meta = |key: &str, size: u64| ObjectMeta {
            location: ObjectPath::from(key),
            last_modified: chrono::Utc::now(),
            size,
            e_tag: None,
            version: None,
        };
        let listing = ListResult {
            common_prefixes: vec![ObjectPath::from("photos/2024")],
            // `photos/` parses to the same path as the prefix itself.
            objects: vec![meta("photos/", 0), meta("photos/a.png", 3)],
        };

        let attributes = listing_to_attributes("photos", listing, Visibility::Public);

        assert_eq!(attributes.len(), 2);
        assert!(attributes[0].is_dir());
        assert_eq!(attributes[0].name(), "2024");
        assert_eq!(attributes[1].path(), "photos/a.png");
        assert_eq!(attributes[1].as_file().unwrap().mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_list_error_surfaces_in_stream() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        let result: StorageResult<Vec<Attribute>> = adapter.list("../escape").try_collect().await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_copy_and_move() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        put(&adapter, "a.txt", b"alpha").await;

        adapter.copy_file("a.txt", "b.txt").await.unwrap();
        assert!(adapter.has_file("a.txt").await);
        assert_eq!(adapter.read_bytes("b.txt").await.unwrap(), "alpha");

        adapter.move_file("a.txt", "moved/c.txt").await.unwrap();
        assert!(!adapter.has_file("a.txt").await);
        assert_eq!(adapter.read_bytes("moved/c.txt").await.unwrap(), "alpha");
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        let error = adapter.copy_file("ghost.txt", "b.txt").await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_multiple() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        put(&adapter, "a", b"1").await;
        put(&adapter, "b", b"2").await;

        adapter
            .delete_multiple(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert!(!adapter.has_file("a").await);
        assert!(!adapter.has_file("b").await);
        adapter.delete_multiple(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_multiple_with_missing_key_deletes_nothing() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        put(&adapter, "a", b"1").await;
        put(&adapter, "c", b"3").await;

        let error = adapter
            .delete_multiple(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap_err();

        match error {
            StorageError::NotFound(message) => assert_eq!(message, "b"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert!(adapter.has_file("a").await);
        assert!(adapter.has_file("c").await);
    }

    #[tokio::test]
    async fn test_delete_multiple_reports_per_key_failures() {
        let server = TestServer::start(|request| match request.method.as_str() {
            "HEAD" => s3_head(),
            "POST" if request.query("delete").is_some() => Response::xml(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <DeleteResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
                 <Error><Key>b</Key><Code>AccessDenied</Code><Message>Access Denied</Message></Error>\
                 </DeleteResult>",
            ),
            _ => Response::status(404),
        })
        .await;
        let adapter = s3_adapter(&server);

        let error = adapter
            .delete_multiple(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        match error {
            StorageError::PartialFailure {
                operation,
                total,
                failed,
            } => {
                assert_eq!(operation, "delete_multiple");
                assert_eq!(total, 2);
                assert_eq!(failed.len(), 1);
            }
            other => panic!("Expected PartialFailure, got {:?}", other),
        }
        let requests = server.requests();
        assert_eq!(requests.iter().filter(|r| r.method == "HEAD").count(), 2);
        let bulk = requests.iter().find(|r| r.method == "POST").unwrap();
        let body = String::from_utf8_lossy(&bulk.body);
        assert!(body.contains("<Key>a</Key>") && body.contains("<Key>b</Key>"));
    }

    #[tokio::test]
    async fn test_public_url_round_trip() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);

        let url = adapter.full_path("/docs/a b.md").await.unwrap();
        assert_eq!(url, "http://127.0.0.1:9000/media/docs/a%20b.md");
        assert_eq!(adapter.original_path(&url).unwrap(), "docs/a b.md");
    }

    #[tokio::test]
    async fn test_signed_url_round_trip() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Private);

        let url = adapter.full_path("docs/readme.md").await.unwrap();
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains(&format!("X-Amz-Expires={}", SIGNED_URL_VALIDITY.as_secs())));
        assert_eq!(adapter.original_path(&url).unwrap(), "docs/readme.md");
    }

    #[test]
    fn test_original_path_rejects_foreign_urls() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        assert!(adapter
            .original_path("https://example.com/media/a.txt")
            .is_err());
        assert!(adapter
            .original_path("http://127.0.0.1:9000/other/a.txt")
            .is_err());
    }

    #[tokio::test]
    async fn test_cover_resizes_locally_without_pipeline() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        adapter
            .save("img/banner.png", bytes_stream(png(40, 20)), None)
            .await
            .unwrap();

        adapter
            .cover("img/banner.png", "img/banner_small.png", 10, 0)
            .await
            .unwrap();

        let content = adapter.read_bytes("img/banner_small.png").await.unwrap();
        let decoded = image::load_from_memory(&content).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 5));
        let attribute = adapter.info("img/banner_small.png").await.unwrap();
        assert_eq!(attribute.as_file().unwrap().mime_type(), "image/png");
    }

    #[tokio::test]
    async fn test_cover_uses_remote_pipeline() {
        let server = TestServer::start(|request| {
            if request.path() == "/media/img/banner.png" {
                Response::ok(&b"remote thumbnail"[..]).header("Content-Type", "image/jpeg")
            } else {
                Response::status(404)
            }
        })
        .await;
        let adapter =
            memory_adapter_at(Vendor::AliOss, Visibility::Public, &format!("{}/media/", server.url()));
        assert!(adapter.capabilities().remote_thumbnails);
        adapter
            .save("img/banner.png", bytes_stream(png(40, 20)), None)
            .await
            .unwrap();

        adapter
            .cover("img/banner.png", "img/banner_small.png", 20, 20)
            .await
            .unwrap();

        assert_eq!(
            adapter.read_bytes("img/banner_small.png").await.unwrap(),
            "remote thumbnail"
        );
        let attribute = adapter.info("img/banner_small.png").await.unwrap();
        assert_eq!(attribute.as_file().unwrap().mime_type(), "image/jpeg");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].query("x-oss-process").as_deref(),
            Some("image/resize,m_lfit,w_20,h_20")
        );
    }

    #[tokio::test]
    async fn test_cover_falls_back_when_pipeline_fails() {
        let server = TestServer::start(|_| Response::status(403)).await;
        let adapter =
            memory_adapter_at(Vendor::HwObs, Visibility::Public, &format!("{}/media/", server.url()));
        adapter
            .save("img/banner.png", bytes_stream(png(40, 20)), None)
            .await
            .unwrap();

        adapter
            .cover("img/banner.png", "img/banner_small.png", 20, 20)
            .await
            .unwrap();

        let content = adapter.read_bytes("img/banner_small.png").await.unwrap();
        let decoded = image::load_from_memory(&content).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
        let attribute = adapter.info("img/banner_small.png").await.unwrap();
        assert_eq!(attribute.as_file().unwrap().mime_type(), "image/png");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].query("x-image-process").is_some());
    }

    #[tokio::test]
    async fn test_private_bucket_skips_remote_pipeline() {
        let server = TestServer::start(|_| Response::ok(&b"remote thumbnail"[..])).await;
        let adapter =
            memory_adapter_at(Vendor::TxCos, Visibility::Private, &format!("{}/media/", server.url()));
        adapter
            .save("img/banner.png", bytes_stream(png(40, 20)), None)
            .await
            .unwrap();

        adapter
            .cover("img/banner.png", "img/banner_small.png", 10, 10)
            .await
            .unwrap();

        let content = adapter.read_bytes("img/banner_small.png").await.unwrap();
        let decoded = image::load_from_memory(&content).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 5));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cover_of_missing_source() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Private);
        let error = adapter.cover("nope.png", "out.png", 10, 10).await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_save_rejects_bucket_root() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        let error = adapter.save("/", bytes_stream("x"), None).await.unwrap_err();
        assert!(matches!(error, StorageError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_validate_connection() {
        let adapter = memory_adapter(Vendor::Minio, Visibility::Public);
        adapter.validate_connection().await.unwrap();
    }

    #[test]
    fn test_debug() {
        let adapter = memory_adapter(Vendor::HwObs, Visibility::Public);
        let debug_str = format!("{:?}", adapter);
        assert!(debug_str.contains("type=hwobs"));
        assert!(debug_str.contains("bucket=media"));
    }
}
