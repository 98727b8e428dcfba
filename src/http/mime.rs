//! Fixed content-type table for servable files.

use std::path::Path;

pub const TEXT_HTML: &str = "text/html; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns the content type for `path`, or `None` when its extension is not
/// in the table. Extension matching ignores ASCII case.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    match ext.as_str() {
        "html" => Some(TEXT_HTML),
        "txt" | "png" | "jpg" | "jpeg" => Some(OCTET_STREAM),
        _ => None,
    }
}

/// Octet-stream files are offered as downloads.
pub fn is_attachment(content_type: &str) -> bool {
    content_type == OCTET_STREAM
}
