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

use object_store::path::Path as ObjectPath;
use percent_encoding::percent_decode_str;
use url::Url;

use super::error::{StorageError, StorageResult};

/// Normalize a caller-supplied path into the backend-relative form every
/// adapter works with: `/`-separated, no leading or trailing slash, no empty
/// or `.` segments. `..` is rejected so a path can never leave the store
/// root. The empty string denotes the root itself.
pub fn normalize(path: &str) -> StorageResult<String> {
    let unified = path.replace('\\', "/");
    let mut segments = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "'{}' escapes the storage root",
                    path
                )))
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}

/// Parent of a normalized path, `""` for top-level entries.
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Helper function to create an ObjectPath from a normalized key
pub(crate) fn to_object_path(key: &str) -> ObjectPath {
    ObjectPath::from(key)
}

/// Append a normalized key to a base URL, percent-encoding each segment.
pub fn join_url(base: &Url, key: &str) -> StorageResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| StorageError::InvalidUrl(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(key.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// Recover the backend-relative key from a URL built on `base`.
///
/// The query string (signing parameters included) is discarded. Scheme,
/// host and port must match `base` and the URL path must sit under the base
/// path; anything else was not produced by the same adapter.
pub fn key_from_url(full_url: &str, base: &Url) -> StorageResult<String> {
    let url = Url::parse(full_url)?;

    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return Err(StorageError::InvalidUrl(format!(
            "'{}' does not belong to '{}'",
            full_url, base
        )));
    }

    let prefix = base.path().trim_end_matches('/');
    let rest = url
        .path()
        .strip_prefix(prefix)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .ok_or_else(|| {
            StorageError::InvalidUrl(format!("'{}' is outside of '{}'", full_url, base))
        })?;

    let decoded = percent_decode_str(rest.trim_start_matches('/'))
        .decode_utf8()
        .map_err(|e| StorageError::InvalidUrl(format!("'{}': {}", full_url, e)))?;

    normalize(&decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_slashes() {
        assert_eq!(normalize("/a/b/c.txt").unwrap(), "a/b/c.txt");
        assert_eq!(normalize("a//b///c/").unwrap(), "a/b/c");
        assert_eq!(normalize("./a/./b").unwrap(), "a/b");
    }

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize("a\\b\\c.txt").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize("/").unwrap(), "");
    }

    #[test]
    fn test_normalize_rejects_parent_segments() {
        assert!(matches!(
            normalize("a/../../etc/passwd"),
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("a/b/c.txt"), "a/b");
        assert_eq!(parent("c.txt"), "");
    }

    #[test]
    fn test_join_url_virtual_host() {
        let base = Url::parse("https://bucket.oss-cn-hangzhou.aliyuncs.com").unwrap();
        let url = join_url(&base, "img/a b.png").unwrap();
        assert_eq!(
            url.as_str(),
            "https://bucket.oss-cn-hangzhou.aliyuncs.com/img/a%20b.png"
        );
    }

    #[test]
    fn test_join_url_path_style() {
        let base = Url::parse("http://127.0.0.1:9000/bucket/").unwrap();
        let url = join_url(&base, "docs/readme.md").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/bucket/docs/readme.md");
    }

    #[test]
    fn test_key_from_url_strips_query_and_prefix() {
        let base = Url::parse("http://127.0.0.1:9000/bucket/").unwrap();
        let key = key_from_url(
            "http://127.0.0.1:9000/bucket/docs/a%20b.md?X-Amz-Signature=abc&X-Amz-Expires=28860",
            &base,
        )
        .unwrap();
        assert_eq!(key, "docs/a b.md");
    }

    #[test]
    fn test_key_from_url_rejects_foreign_host() {
        let base = Url::parse("https://bucket.obs.cn-north-4.myhuaweicloud.com").unwrap();
        assert!(matches!(
            key_from_url("https://evil.example.com/a.txt", &base),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_key_from_url_rejects_other_bucket() {
        let base = Url::parse("http://127.0.0.1:9000/bucket/").unwrap();
        assert!(matches!(
            key_from_url("http://127.0.0.1:9000/bucket-two/a.txt", &base),
            Err(StorageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_key_from_url_rejects_garbage() {
        let base = Url::parse("https://cdn.example.com").unwrap();
        assert!(key_from_url("not a url", &base).is_err());
    }

    #[test]
    fn test_to_object_path() {
        let object_path = to_object_path("a/b/c/d/file.parquet");
        assert_eq!(object_path.as_ref(), "a/b/c/d/file.parquet");
        assert_eq!(to_object_path("").as_ref(), "");
    }
}
