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

//! Best-effort MIME type detection.

use image::ImageFormat;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type implied by the file extension of `path`, if any.
pub fn from_path(path: &str) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// MIME type for an image format.
pub fn from_image_format(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .and_then(|ext| mime_guess::from_ext(ext).first())
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Extension first, then the image magic bytes found in `header`,
/// then `application/octet-stream`.
pub fn sniff(path: &str, header: &[u8]) -> String {
    from_path(path)
        .or_else(|| image::guess_format(header).ok().map(from_image_format))
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Extension-only guess with the octet-stream fallback.
pub fn guess(path: &str) -> String {
    from_path(path).unwrap_or_else(|| OCTET_STREAM.to_string())
}
