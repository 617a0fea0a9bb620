//! Content-Type lookup by file suffix.

/// Fallback for paths without a known suffix.
pub const DEFAULT_TYPE: &str = "text/plain";

/// Returns the media type for `path` based on the text after its last `.`.
pub fn content_type(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.').map(|(_, suffix)| suffix) {
        Some("html") => "text/html",
        Some("xml") => "text/xml",
        Some("xhtml") => "application/xhtml+xml",
        Some("txt") => "text/plain",
        Some("rtf") => "application/rtf",
        Some("pdf") => "application/pdf",
        Some("word") => "application/msword",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("au") => "audio/basic",
        Some("mpeg" | "mpg") => "video/mpeg",
        Some("avi") => "video/x-msvideo",
        Some("gz") => "application/x-gzip",
        Some("tar") => "application/x-tar",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        _ => DEFAULT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(content_type("/index.html"), "text/html");
        assert_eq!(content_type("/static/app.js"), "text/javascript");
        assert_eq!(content_type("/img/cat.jpeg"), "image/jpeg");
        assert_eq!(content_type("/archive.tar.gz"), "application/x-gzip");
    }

    #[test]
    fn test_default_type() {
        assert_eq!(content_type("/README"), "text/plain");
        assert_eq!(content_type("/file.unknown"), "text/plain");
        assert_eq!(content_type("/dir.d/README"), "text/plain");
    }
}
