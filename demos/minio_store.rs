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

//! Expects a MinIO server, e.g.
//! `docker run -p 9000:9000 minio/minio server /data`, and a `media` bucket.
//! Settings are read from `MINIO_ENDPOINT`, `MINIO_ACCESS_KEY`,
//! `MINIO_SECRET_KEY` and `MINIO_BUCKET`.

use std::env;
use std::error::Error;

use futures::TryStreamExt;
use storage_adapter::storage::{bytes_stream, new_adapter, Attribute, MinioConfig};
use tracing::{info, warn};

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = MinioConfig::new(
        env_or("MINIO_ACCESS_KEY", "minioadmin"),
        env_or("MINIO_SECRET_KEY", "minioadmin"),
        env_or("MINIO_ENDPOINT", "127.0.0.1:9000"),
        env_or("MINIO_BUCKET", "media"),
    )
    .with_ssl(false)
    .with_private(true);

    let adapter = new_adapter(config).await?;
    if let Err(e) = adapter.validate_connection().await {
        warn!("MinIO is not reachable: {}", e);
        return Err(e.into());
    }

    adapter
        .save("demo/hello.txt", bytes_stream("hello from the adapter"), None)
        .await?;
    info!("{}", adapter.info("demo/hello.txt").await?.to_json()?);

    let entries: Vec<Attribute> = adapter.list("demo").try_collect().await?;
    info!("demo/ holds {} entries", entries.len());

    let url = adapter.full_path("demo/hello.txt").await?;
    info!("Signed URL: {}", url);
    info!("Maps back to {}", adapter.original_path(&url)?);

    adapter.delete("demo/hello.txt").await?;
    Ok(())
}
