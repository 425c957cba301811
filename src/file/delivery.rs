//! Download response metadata: content type and disposition.

use std::path::Path;

use tokio::fs::File;

/// Content type used when nothing more specific is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension to MIME type table used in inline mode.
const MIME_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
];

/// How a stored file is handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Forced download: octet-stream with an attachment disposition.
    Attachment,
    /// Stream mode: inferred content type, rendered inline by browsers.
    Inline,
}

/// An opened stored file ready to be streamed.
#[derive(Debug)]
pub struct Download {
    /// Open handle positioned at the start of the file.
    pub file: File,
    /// Stored name that was resolved.
    pub stored_name: String,
    /// File size in bytes.
    pub size: u64,
    /// Value for the Content-Type header.
    pub content_type: &'static str,
    /// Value for the Content-Disposition header, if any.
    pub disposition: Option<String>,
}

/// Infer a content type from the file extension (case-insensitive).
pub fn content_type_for(name: &str) -> &'static str {
    let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };

    MIME_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}

/// Content type and disposition for a stored name in the given mode.
pub fn response_headers_for(name: &str, mode: DeliveryMode) -> (&'static str, Option<String>) {
    match mode {
        DeliveryMode::Attachment => (OCTET_STREAM, Some(content_disposition_header(name))),
        DeliveryMode::Inline => (content_type_for(name), None),
    }
}

/// Generate a safe `attachment` Content-Disposition value.
///
/// Control characters are dropped, quotes and backslashes replaced in the
/// plain `filename` parameter, and non-ASCII names are additionally sent as
/// an RFC 5987 `filename*` parameter.
pub fn content_disposition_header(filename: &str) -> String {
    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}
