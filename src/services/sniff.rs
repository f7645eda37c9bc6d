//! Content-type detection from the leading bytes of an upload.
//!
//! Only the first [`SNIFF_LEN`] bytes are inspected. The client's declared
//! `Content-Type` is never consulted, so a mislabeled file is classified by
//! what it actually contains.

/// Number of leading bytes the sniffer looks at.
pub const SNIFF_LEN: usize = 512;

/// Fallback for content that matches no known signature.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// Tags that mark an HTML document when followed by a space or `>`.
const HTML_TAGS: [&[u8]; 17] = [
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Exact prefix signatures, checked in order.
const PREFIX_SIGNATURES: [(&[u8], &str); 14] = [
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_UTF8),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07", "application/x-rar-compressed"),
];

const TRAILING_SIGNATURES: [(&[u8], &str); 3] = [
    (b"\x00asm", "application/wasm"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
];

/// Classify a byte prefix and return its MIME type.
///
/// Never fails: anything unrecognised and binary-looking is reported as
/// `application/octet-stream`. Input longer than [`SNIFF_LEN`] is truncated.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let text = skip_leading_whitespace(data);
    if HTML_TAGS.iter().any(|tag| matches_html_tag(text, tag)) {
        return "text/html; charset=utf-8";
    }
    if text.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some(mime) = PREFIX_SIGNATURES
        .iter()
        .find_map(|(signature, mime)| data.starts_with(signature).then_some(*mime))
    {
        return mime;
    }

    if data.len() >= 14 && &data[..4] == b"RIFF" && &data[8..14] == b"WEBPVP" {
        return "image/webp";
    }

    if let Some(mime) = TRAILING_SIGNATURES
        .iter()
        .find_map(|(signature, mime)| data.starts_with(signature).then_some(*mime))
    {
        return mime;
    }

    if !data.iter().any(|b| is_binary_byte(*b)) {
        return TEXT_UTF8;
    }

    OCTET_STREAM
}

fn skip_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

/// Case-insensitive tag match that also requires a terminating space or `>`.
fn matches_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() + 1 {
        return false;
    }
    if !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    matches!(data[tag.len()], b' ' | b'>')
}

/// Control bytes that never appear in plain text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_png() {
        let mut data = PNG_HEADER.to_vec();
        data.extend_from_slice(&[0u8; 64]);
        assert_eq!(detect_content_type(&data), "image/png");
    }

    #[test]
    fn test_jpeg() {
        assert_eq!(detect_content_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), "image/jpeg");
    }

    #[test]
    fn test_gif_and_pdf() {
        assert_eq!(detect_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"%PDF-1.7\n"), "application/pdf");
    }

    #[test]
    fn test_webp() {
        assert_eq!(detect_content_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_byte_order_marks() {
        assert_eq!(
            detect_content_type(b"\xFE\xFF\x00h\x00i"),
            "text/plain; charset=utf-16be"
        );
        assert_eq!(
            detect_content_type(b"\xFF\xFEh\x00i\x00"),
            "text/plain; charset=utf-16le"
        );
        assert_eq!(detect_content_type(b"\xEF\xBB\xBFhello"), TEXT_UTF8);
    }

    #[test]
    fn test_xml() {
        assert_eq!(
            detect_content_type(b"\n<?xml version=\"1.0\"?><root/>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_content_type(b"now is the time\n"), TEXT_UTF8);
    }

    #[test]
    fn test_html_with_leading_whitespace() {
        assert_eq!(
            detect_content_type(b"  \n<html><body></body></html>"),
            "text/html; charset=utf-8"
        );
        // `<a` needs a terminator, otherwise it is just text.
        assert_eq!(detect_content_type(b"<abc"), TEXT_UTF8);
    }

    #[test]
    fn test_binary_falls_back_to_octet_stream() {
        assert_eq!(detect_content_type(&[0x00, 0x01, 0x02, 0x03, 0xAB]), OCTET_STREAM);
    }

    #[test]
    fn test_empty_is_text() {
        assert_eq!(detect_content_type(&[]), TEXT_UTF8);
    }

    #[test]
    fn test_only_prefix_is_inspected() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), TEXT_UTF8);
    }
}
