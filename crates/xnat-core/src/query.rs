//! Upload request construction.
//!
//! The archive expects file metadata as query parameters on the upload URI.
//! Parameter order is part of the wire contract: schema type first, then the
//! generic properties in insertion order, then the file fields under their
//! upload names, the optional overwrite flag and finally `inbody=true`.

use url::form_urlencoded;

use crate::resource::{FileResource, RemoteResource, FILE_CONTENT, FILE_FORMAT, FILE_TAGS};

/// Target URI plus ordered query parameters for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub uri: String,
    pub params: Vec<(String, String)>,
}

impl UploadRequest {
    /// Builds the request for `resource` as it stands right now.
    pub fn for_resource(resource: &FileResource) -> Self {
        let mut params: Vec<(String, String)> = Vec::with_capacity(resource.properties().len() + 5);
        params.push(("xsi:type".into(), resource.schema_type().into()));

        // Reserved file keys go out under their short upload names below.
        for (key, value) in resource.properties().iter() {
            if key == FILE_TAGS || key == FILE_FORMAT || key == FILE_CONTENT {
                continue;
            }
            params.push((key.into(), value.into()));
        }

        params.push(("format".into(), resource.file_format().into()));
        params.push(("content".into(), resource.file_content().into()));
        params.push(("tags".into(), resource.file_tags().into()));

        if resource.exists_remotely() {
            params.push(("overwrite".into(), "true".into()));
        }

        params.push(("inbody".into(), "true".into()));

        Self {
            uri: resource.uri(),
            params,
        }
    }

    /// `key=value` pairs joined by `&`, without the leading `?`.
    ///
    /// Keys and values are form-encoded, so `&`, `=` or `+` inside a value can
    /// never introduce or split a parameter.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish()
    }

    /// Request target for logs: unescaped `uri`, then `?` and the encoded query.
    pub fn to_request_string(&self) -> String {
        format!("{}?{}", self.uri, self.query_string())
    }
}
