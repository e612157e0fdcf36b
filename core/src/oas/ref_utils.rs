#![deny(missing_docs)]

//! # Reference Targets
//!
//! Maps a `$ref` string onto a [`SchemaPath`] in the current document. The document
//! part of a reference must be empty or name this document (via `$self`); anything
//! else is external and stays unresolved.

use crate::oas::pointer::SchemaPath;
use percent_encoding::percent_decode_str;
use std::path::Path;
use url::Url;

/// Structural path a reference points at, or `None` for external and malformed refs.
pub(crate) fn local_target(reference: &str, self_uri: Option<&str>) -> Option<SchemaPath> {
    let (document, fragment) = reference.split_once('#')?;
    if !document.is_empty() && !names_document(document, self_uri?) {
        tracing::trace!(reference, "external reference");
        return None;
    }
    SchemaPath::from_pointer(&format!("#{}", fragment))
}

/// Unescapes one pointer segment: `~1` and `~0`, then percent-encoding.
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let unescaped = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&unescaped)
        .decode_utf8_lossy()
        .into_owned()
}

/// Whether the document part of a reference identifies the document whose `$self`
/// is `self_uri`.
fn names_document(document: &str, self_uri: &str) -> bool {
    if document == self_uri {
        return true;
    }
    match (Url::parse(document), Url::parse(self_uri)) {
        (Ok(doc_url), Ok(self_url)) => {
            doc_url.scheme() == self_url.scheme()
                && doc_url.host() == self_url.host()
                && doc_url.port_or_known_default() == self_url.port_or_known_default()
                && doc_url.path() == self_url.path()
        }
        // Absolute URL against a path-only `$self`.
        (Ok(doc_url), Err(_)) if self_uri.starts_with('/') => doc_url.path() == self_uri,
        (Err(_), Err(_)) => Path::new(document) == Path::new(self_uri),
        _ => false,
    }
}
