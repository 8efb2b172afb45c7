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

//! File and directory metadata returned by `info` and `list`.
//!
//! Attributes are plain values: every query builds new ones and nothing
//! mutates them afterwards. The serialized form is a flat tagged record:
//!
//! ```json
//! {"name":"a.png","path":"img/a.png","type":"file","last_modified":1700000000,
//!  "visibility":"public","file_size":42,"mime_type":"image/png"}
//! ```
//!
//! `file_size` and `mime_type` only appear when `type` is `"file"`.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{StorageError, StorageResult};

/// Discriminates the two attribute shapes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileType::File => write!(f, "file"),
            FileType::Directory => write!(f, "directory"),
        }
    }
}

/// Whether an object is reachable through a static URL or needs a signed one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttribute {
    name: String,
    path: String,
    visibility: Visibility,
    last_modified: i64,
    file_size: u64,
    mime_type: String,
}

impl FileAttribute {
    /// The path is kept verbatim; the name is its last `/` segment.
    pub fn new(
        path: impl Into<String>,
        visibility: Visibility,
        mime_type: impl Into<String>,
        file_size: u64,
        last_modified: i64,
    ) -> Self {
        let path = path.into();
        Self {
            name: leaf_name(&path),
            path,
            visibility,
            last_modified,
            file_size,
            mime_type: mime_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn to_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a serialized attribute, failing with `TypeMismatch` when the
    /// payload describes a directory.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Attribute::from_json(json)?.try_into()
    }
}

/// Metadata of a directory (or an object-storage common prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAttribute {
    name: String,
    path: String,
    visibility: Visibility,
    last_modified: i64,
}

impl DirectoryAttribute {
    /// Leading and trailing slashes are stripped from `path`.
    pub fn new(path: impl AsRef<str>, visibility: Visibility, last_modified: i64) -> Self {
        let path = path.as_ref().trim_matches('/').to_string();
        Self {
            name: leaf_name(&path),
            path,
            visibility,
            last_modified,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    pub fn to_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a serialized attribute, failing with `TypeMismatch` when the
    /// payload describes a file.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Attribute::from_json(json)?.try_into()
    }
}

/// A file or directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    File(FileAttribute),
    Directory(DirectoryAttribute),
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::File(file) => file.name(),
            Attribute::Directory(dir) => dir.name(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Attribute::File(file) => file.path(),
            Attribute::Directory(dir) => dir.path(),
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Attribute::File(_) => FileType::File,
            Attribute::Directory(_) => FileType::Directory,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Attribute::File(file) => file.visibility(),
            Attribute::Directory(dir) => dir.visibility(),
        }
    }

    pub fn last_modified(&self) -> i64 {
        match self {
            Attribute::File(file) => file.last_modified(),
            Attribute::Directory(dir) => dir.last_modified(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Attribute::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Attribute::Directory(_))
    }

    pub fn as_file(&self) -> Option<&FileAttribute> {
        match self {
            Attribute::File(file) => Some(file),
            Attribute::Directory(_) => None,
        }
    }

    pub fn to_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<FileAttribute> for Attribute {
    fn from(file: FileAttribute) -> Self {
        Attribute::File(file)
    }
}

impl From<DirectoryAttribute> for Attribute {
    fn from(dir: DirectoryAttribute) -> Self {
        Attribute::Directory(dir)
    }
}

impl TryFrom<Attribute> for FileAttribute {
    type Error = StorageError;

    fn try_from(attribute: Attribute) -> Result<Self, Self::Error> {
        match attribute {
            Attribute::File(file) => Ok(file),
            Attribute::Directory(_) => Err(StorageError::TypeMismatch {
                expected: FileType::File,
                found: FileType::Directory,
            }),
        }
    }
}

impl TryFrom<Attribute> for DirectoryAttribute {
    type Error = StorageError;

    fn try_from(attribute: Attribute) -> Result<Self, Self::Error> {
        match attribute {
            Attribute::Directory(dir) => Ok(dir),
            Attribute::File(_) => Err(StorageError::TypeMismatch {
                expected: FileType::Directory,
                found: FileType::File,
            }),
        }
    }
}

/// Wire shape shared by both variants.
#[derive(Serialize, Deserialize)]
struct AttributeRecord {
    name: String,
    path: String,
    #[serde(rename = "type")]
    file_type: FileType,
    last_modified: i64,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

impl From<&FileAttribute> for AttributeRecord {
    fn from(file: &FileAttribute) -> Self {
        Self {
            name: file.name.clone(),
            path: file.path.clone(),
            file_type: FileType::File,
            last_modified: file.last_modified,
            visibility: file.visibility,
            file_size: Some(file.file_size),
            mime_type: Some(file.mime_type.clone()),
        }
    }
}

impl From<&DirectoryAttribute> for AttributeRecord {
    fn from(dir: &DirectoryAttribute) -> Self {
        Self {
            name: dir.name.clone(),
            path: dir.path.clone(),
            file_type: FileType::Directory,
            last_modified: dir.last_modified,
            visibility: dir.visibility,
            file_size: None,
            mime_type: None,
        }
    }
}

impl TryFrom<AttributeRecord> for Attribute {
    type Error = String;

    fn try_from(record: AttributeRecord) -> Result<Self, Self::Error> {
        match record.file_type {
            FileType::File => {
                let file_size = record
                    .file_size
                    .ok_or_else(|| "file attribute is missing `file_size`".to_string())?;
                Ok(Attribute::File(FileAttribute {
                    name: record.name,
                    path: record.path,
                    visibility: record.visibility,
                    last_modified: record.last_modified,
                    file_size,
                    mime_type: record.mime_type.unwrap_or_default(),
                }))
            }
            FileType::Directory => Ok(Attribute::Directory(DirectoryAttribute {
                name: record.name,
                path: record.path,
                visibility: record.visibility,
                last_modified: record.last_modified,
            })),
        }
    }
}

impl Serialize for FileAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AttributeRecord::from(self).serialize(serializer)
    }
}

impl Serialize for DirectoryAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AttributeRecord::from(self).serialize(serializer)
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attribute::File(file) => file.serialize(serializer),
            Attribute::Directory(dir) => dir.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = AttributeRecord::deserialize(deserializer)?;
        Attribute::try_from(record).map_err(serde::de::Error::custom)
    }
}

fn leaf_name(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
