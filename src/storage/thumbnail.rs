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

//! Local thumbnail rendering used by `cover` when no remote image
//! pipeline is available.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::ImageFormat;

use super::error::{StorageError, StorageResult};
use super::mime;

/// A rendered derivative and the MIME type of its (source) format.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub content: Bytes,
    pub mime_type: String,
}

/// Target size for a `width` x `height` request on an `original_width` x
/// `original_height` image. Two given sides are a bounding box the image is
/// fitted into without distortion. A 0 side follows the aspect ratio of the
/// other; two 0 sides keep the original size.
pub fn target_dimensions(
    original_width: u32,
    original_height: u32,
    width: u32,
    height: u32,
) -> (u32, u32) {
    let scale = |side: u32, numerator: u32, denominator: u32| -> u32 {
        if denominator == 0 {
            return side.max(1);
        }
        let scaled = (u64::from(side) * u64::from(numerator) + u64::from(denominator) / 2)
            / u64::from(denominator);
        scaled.clamp(1, u64::from(u32::MAX)) as u32
    };

    match (width, height) {
        (0, 0) => (original_width, original_height),
        (0, h) => (scale(h, original_width, original_height), h),
        (w, 0) => (w, scale(w, original_height, original_width)),
        (w, h) => {
            let fitted_height = scale(w, original_height, original_width);
            if fitted_height <= h {
                (w, fitted_height)
            } else {
                (scale(h, original_width, original_height).min(w), h)
            }
        }
    }
}

/// Resize `source` (named `source_path`), keeping its format.
///
/// The format comes from the path extension, or from the content when the
/// extension says nothing.
pub fn render(source: &[u8], source_path: &str, width: u32, height: u32) -> StorageResult<Thumbnail> {
    let format = ImageFormat::from_path(source_path)
        .or_else(|_| image::guess_format(source))?;
    let image = image::load_from_memory_with_format(source, format)?;

    let (target_width, target_height) =
        target_dimensions(image.width(), image.height(), width, height);
    let resized = if (target_width, target_height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(target_width, target_height, FilterType::Lanczos3)
    };

    let mut encoded = Vec::new();
    resized.write_to(&mut Cursor::new(&mut encoded), format)?;

    Ok(Thumbnail {
        content: Bytes::from(encoded),
        mime_type: mime::from_image_format(format),
    })
}

/// [`render`] on the blocking thread pool.
pub async fn render_blocking(
    source: Bytes,
    source_path: String,
    width: u32,
    height: u32,
) -> StorageResult<Thumbnail> {
    tokio::task::spawn_blocking(move || render(&source, &source_path, width, height))
        .await
        .map_err(|e| StorageError::IoError(std::io::Error::other(e)))?
}
