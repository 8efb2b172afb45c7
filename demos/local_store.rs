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

use std::error::Error;

use futures::TryStreamExt;
use storage_adapter::storage::{bytes_stream, new_adapter, Attribute, LocalConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let base = tempfile::TempDir::new()?;
    let config = LocalConfig::new(base.path().to_string_lossy())
        .with_base_url("https://cdn.example.com/files");
    let adapter = new_adapter(config).await?;
    adapter.validate_connection().await?;

    adapter
        .save("docs/readme.md", bytes_stream("# storage adapter\n"), None)
        .await?;
    adapter
        .save("docs/notes/todo.txt", bytes_stream("write more docs\n"), None)
        .await?;
    adapter.copy_file("docs/readme.md", "docs/readme.copy.md").await?;
    adapter
        .move_file("docs/readme.copy.md", "archive/readme.md")
        .await?;

    let entries: Vec<Attribute> = adapter.list("docs").try_collect().await?;
    for entry in &entries {
        info!("{}", entry.to_json()?);
    }

    let url = adapter.full_path("archive/readme.md").await?;
    info!("archive/readme.md is served at {}", url);
    info!("{} maps back to {}", url, adapter.original_path(&url)?);

    adapter
        .delete_multiple(&[
            "docs/readme.md".to_string(),
            "archive/readme.md".to_string(),
        ])
        .await?;
    info!(
        "docs/readme.md exists after delete: {}",
        adapter.has_file("docs/readme.md").await
    );

    Ok(())
}
