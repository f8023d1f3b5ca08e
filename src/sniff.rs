//! Content-type sniffing for the upload pipeline.
//!
//! Files are classified by their bytes, never by their filename: the first
//! few kilobytes are matched against magic numbers (via `infer`), with a
//! printable-text fallback for the formats that have no signature. The
//! resulting canonical extension is then checked against the fixed
//! allow-list of formats the service can process. Files that do not map to
//! an allow-listed extension are silently excluded from uploads.

use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// File extensions the processing service accepts, as canonical lowercase
/// extensions with a leading dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".abw", ".zabw", ".md", ".pm3", ".pm4", ".pm5", ".pm6", ".p65", ".cwk",
    ".agd", ".fhd", ".kth", ".key", ".numbers", ".pages", ".bmp", ".csv",
    ".txt", ".cdr", ".cmx", ".cgm", ".dif", ".dbf", ".xml", ".eps", ".emf",
    ".fb2", ".gnm", ".gnumeric", ".gif", ".hwp", ".plt", ".html", ".htm",
    ".jtd", ".jtt", ".jpg", ".jpeg", ".wk1", ".wks", ".123", ".wk3", ".wk4",
    ".pct", ".mml", ".xls", ".xlw", ".xlt", ".xlsx", ".docx", ".pptx",
    ".ppt", ".pps", ".pot", ".pub", ".rtf", ".doc", ".dot", ".wps", ".wdb",
    ".wri", ".vsd", ".pgm", ".pbm", ".ppm", ".odt", ".fodt", ".ods",
    ".fods", ".odp", ".fodp", ".odg", ".fodg", ".odf", ".odb", ".sxw",
    ".stw", ".sxc", ".stc", ".sxi", ".sti", ".sxd", ".std", ".sxm", ".pcx",
    ".pcd", ".psd", ".pdf",
];

/// How much of the file is read for type detection.
const SNIFF_LEN: usize = 8192;

/// Whether an extension (with leading dot) is in the allow-list,
/// case-insensitively.
pub fn is_supported_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&lower.as_str())
}

/// Sniff a file's canonical extension from its content.
///
/// Returns `Some(".ext")` (leading dot, lowercase) when the detected type
/// maps to an allow-listed extension, `None` when the file is of an
/// unsupported or undetectable type. I/O errors propagate.
pub fn sniff_extension(path: &Path) -> Result<Option<String>> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; SNIFF_LEN];
    let n = read_fully(&mut file, &mut buf)?;
    buf.truncate(n);

    let Some(detected) = detect_extension(&buf) else {
        return Ok(None);
    };
    let canonical = format!(".{detected}");
    if is_supported_extension(&canonical) {
        Ok(Some(canonical))
    } else {
        Ok(None)
    }
}

/// Read up to `buf.len()` bytes, tolerating short reads.
fn read_fully(file: &mut std::fs::File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    loop {
        let n = file.read(&mut buf[total..])?;
        if n == 0 || total + n == buf.len() {
            return Ok(total + n);
        }
        total += n;
    }
}

/// Map file bytes to an extension (without dot), or `None` for
/// unrecognizable content.
fn detect_extension(buf: &[u8]) -> Option<String> {
    if let Some(kind) = infer::get(buf) {
        return Some(kind.extension().to_string());
    }
    if !looks_like_text(buf) {
        return None;
    }
    // No magic number but printable: distinguish markup from plain text.
    let head = String::from_utf8_lossy(buf);
    let lowered = head.trim_start().to_ascii_lowercase();
    if lowered.starts_with("<?xml") {
        Some("xml".to_string())
    } else if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
        Some("html".to_string())
    } else {
        Some("txt".to_string())
    }
}

fn looks_like_text(buf: &[u8]) -> bool {
    if buf.is_empty() || buf.contains(&0) {
        return false;
    }
    match std::str::from_utf8(buf) {
        Ok(_) => true,
        // The sniff window may cut a multi-byte sequence at the end.
        Err(e) => e.valid_up_to() + 3 >= buf.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sniff_bytes(bytes: &[u8]) -> Option<String> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        sniff_extension(file.path()).unwrap()
    }

    #[test]
    fn test_pdf_magic() {
        assert_eq!(
            sniff_bytes(b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n"),
            Some(".pdf".to_string())
        );
    }

    #[test]
    fn test_gif_magic() {
        assert_eq!(
            sniff_bytes(b"GIF89a\x01\x00\x01\x00\x00\x00\x00;"),
            Some(".gif".to_string())
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            sniff_bytes(b"just some notes\nanother line\n"),
            Some(".txt".to_string())
        );
    }

    #[test]
    fn test_html_prefix() {
        assert_eq!(
            sniff_bytes(b"<!DOCTYPE html>\n<html><body>hi</body></html>"),
            Some(".html".to_string())
        );
    }

    #[test]
    fn test_xml_declaration() {
        assert_eq!(
            sniff_bytes(b"<?xml version=\"1.0\"?><root/>"),
            Some(".xml".to_string())
        );
    }

    #[test]
    fn test_png_detected_but_not_supported() {
        // PNG sniffs fine; the service just does not accept it.
        assert_eq!(sniff_bytes(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR"), None);
    }

    #[test]
    fn test_unrecognizable_binary() {
        assert_eq!(sniff_bytes(&[0x00, 0x01, 0x02, 0x03, 0x00, 0xff]), None);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(sniff_bytes(b""), None);
    }

    #[test]
    fn test_content_wins_over_filename() {
        // A GIF named as a PDF is still a GIF.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap();
        assert_eq!(sniff_extension(&path).unwrap(), Some(".gif".to_string()));
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        assert!(is_supported_extension(".PDF"));
        assert!(is_supported_extension(".Gif"));
        assert!(!is_supported_extension(".png"));
        assert!(!is_supported_extension(".exe"));
    }
}
