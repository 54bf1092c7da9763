//! Extension-based MIME type lookup.
//!
//! The table is process-wide and read-only once built. Call [`init`] during
//! startup to build it eagerly; otherwise the first lookup builds it.

use std::collections::HashMap;

use mime::Mime;
use once_cell::sync::Lazy;

const EXTENSIONS: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".htm", "text/html"),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".mjs", "application/javascript"),
    (".json", "application/json"),
    (".xml", "text/xml"),
    (".txt", "text/plain"),
    (".csv", "text/csv"),
    (".md", "text/markdown"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".gif", "image/gif"),
    (".bmp", "image/bmp"),
    (".ico", "image/x-icon"),
    (".svg", "image/svg+xml"),
    (".webp", "image/webp"),
    (".mp3", "audio/mpeg"),
    (".wav", "audio/wav"),
    (".ogg", "audio/ogg"),
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
    (".avi", "video/x-msvideo"),
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    (".ttf", "font/ttf"),
    (".otf", "font/otf"),
    (".pdf", "application/pdf"),
    (".zip", "application/zip"),
    (".gz", "application/gzip"),
    (".tar", "application/x-tar"),
    (".wasm", "application/wasm"),
    (".bin", "application/octet-stream"),
];

static OCTET_STREAM: Mime = mime::APPLICATION_OCTET_STREAM;

static MIME_TYPES: Lazy<HashMap<&'static str, Mime>> = Lazy::new(|| {
    EXTENSIONS
        .iter()
        .filter_map(|(extension, essence)| essence.parse::<Mime>().ok().map(|mime| (*extension, mime)))
        .collect()
});

/// Builds the lookup table now instead of on first use.
pub fn init() {
    Lazy::force(&MIME_TYPES);
}

/// Returns the MIME type for `filename` by its extension, leading dot
/// included and matched case-sensitively. Unknown extensions map to
/// `application/octet-stream`.
pub fn mime_type(filename: &str) -> &'static Mime {
    filename
        .rfind('.')
        .and_then(|dot| MIME_TYPES.get(&filename[dot..]))
        .unwrap_or(&OCTET_STREAM)
}

/// String form of [`mime_type`].
pub fn get_mimetype(filename: &str) -> &'static str {
    mime_type(filename).as_ref()
}
