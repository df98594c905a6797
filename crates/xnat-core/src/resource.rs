//! Remote resource model: the `RemoteResource` capability and `FileResource`.

use crate::property::PropertyStore;
use std::path::{Path, PathBuf};

/// Property key holding the file's name.
pub const FILE_NAME: &str = "Name";
/// Reserved key for free-text tags; uploaded as `tags`.
pub const FILE_TAGS: &str = "file_tags";
/// Reserved key for the file format; uploaded as `format`.
pub const FILE_FORMAT: &str = "file_format";
/// Reserved key for the content description; uploaded as `content`.
pub const FILE_CONTENT: &str = "file_content";

/// Schema type sent as `xsi:type` when none is configured.
pub const DEFAULT_SCHEMA_TYPE: &str = "xnat:abstractResource";

/// Anything addressable on the archive by URI, living inside a parent resource.
pub trait RemoteResource {
    /// URI of this resource, relative to the archive root (e.g. `/data/.../files/a.nii`).
    fn uri(&self) -> String;

    /// URI of the containing resource.
    fn parent_uri(&self) -> &str;
}

/// A single file inside a resource collection on the archive.
#[derive(Debug, Clone)]
pub struct FileResource {
    parent_uri: String,
    schema_type: String,
    properties: PropertyStore,
    local_file_path: PathBuf,
    exists_remotely: bool,
}

impl FileResource {
    /// New file resource under `parent_uri` with the default schema type.
    pub fn new(parent_uri: impl Into<String>) -> Self {
        Self::with_schema_type(parent_uri, DEFAULT_SCHEMA_TYPE)
    }

    pub fn with_schema_type(parent_uri: impl Into<String>, schema_type: impl Into<String>) -> Self {
        let parent_uri: String = parent_uri.into();
        Self {
            parent_uri: parent_uri.trim_end_matches('/').to_string(),
            schema_type: schema_type.into(),
            properties: PropertyStore::new(),
            local_file_path: PathBuf::new(),
            exists_remotely: false,
        }
    }

    pub fn name(&self) -> &str {
        self.property(FILE_NAME)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.properties.set(FILE_NAME, name);
    }

    pub fn file_format(&self) -> &str {
        self.property(FILE_FORMAT)
    }

    pub fn set_file_format(&mut self, format: impl Into<String>) {
        self.properties.set(FILE_FORMAT, format);
    }

    pub fn file_content(&self) -> &str {
        self.property(FILE_CONTENT)
    }

    pub fn set_file_content(&mut self, content: impl Into<String>) {
        self.properties.set(FILE_CONTENT, content);
    }

    pub fn file_tags(&self) -> &str {
        self.property(FILE_TAGS)
    }

    pub fn set_file_tags(&mut self, tags: impl Into<String>) {
        self.properties.set(FILE_TAGS, tags);
    }

    /// Value of an arbitrary property, or `""` when unset.
    pub fn property(&self, key: &str) -> &str {
        self.properties.get(key).unwrap_or("")
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.set(key, value);
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn schema_type(&self) -> &str {
        &self.schema_type
    }

    /// Local path of the file to upload. Empty when the file only exists remotely.
    pub fn local_file_path(&self) -> &Path {
        &self.local_file_path
    }

    pub fn set_local_file_path(&mut self, path: impl Into<PathBuf>) {
        self.local_file_path = path.into();
    }

    /// Whether the archive is known to already hold this file. Controls `overwrite=true`.
    pub fn exists_remotely(&self) -> bool {
        self.exists_remotely
    }

    pub fn set_exists_remotely(&mut self, exists: bool) {
        self.exists_remotely = exists;
    }
}

impl RemoteResource for FileResource {
    fn uri(&self) -> String {
        format!("{}/files/{}", self.parent_uri, self.name())
    }

    fn parent_uri(&self) -> &str {
        &self.parent_uri
    }
}
