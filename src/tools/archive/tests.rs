#![cfg(test)]
mod tests {
    use crate::error::ArchiveError;
    use crate::tools::archive::*;

    fn mhtml(parts: &[&str]) -> Vec<u8> {
        let mut out = String::from(
            "From: <Saved by Blink>\r\n\
             Snapshot-Content-Location: https://www.facebook.com/ads/library/?id=1\r\n\
             Subject: Ad Library\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/related;\r\n\
             \ttype=\"text/html\";\r\n\
             \tboundary=\"----MultipartBoundary--abc123----\"\r\n\r\n",
        );
        for part in parts {
            out.push_str("------MultipartBoundary--abc123----\r\n");
            out.push_str(part);
            out.push_str("\r\n");
        }
        out.push_str("------MultipartBoundary--abc123------\r\n");
        out.into_bytes()
    }

    const QP_HTML: &str = "Content-Type: text/html\r\n\
        Content-ID: <frame-1@mhtml.blink>\r\n\
        Content-Transfer-Encoding: quoted-printable\r\n\
        Content-Location: https://www.facebook.com/ads/library/?id=1\r\n\r\n\
        <html><body><div class=3D\"xh8yej3\">Library ID: 42 caf=C3=A9 long=\r\n\
        line</div></body></html>";

    const IMAGE: &str = "Content-Type: image/jpeg\r\n\
        Content-Transfer-Encoding: base64\r\n\
        Content-Location: https://scontent.example.net/v/p_s600x600_1.jpg\r\n\r\n\
        /9j/4AAQSkZJRg==";

    #[test]
    fn test_decode_quoted_printable_markup() {
        let doc = decode(&mhtml(&[QP_HTML])).unwrap();
        assert!(doc.html.starts_with("<html>"));
        assert!(doc.html.contains(r#"class="xh8yej3""#));
        assert!(doc.html.contains("café"));
        assert!(doc.html.contains("longline"));
        assert_eq!(
            doc.snapshot_location.as_deref(),
            Some("https://www.facebook.com/ads/library/?id=1")
        );
    }

    #[test]
    fn test_collects_image_locators() {
        let doc = decode(&mhtml(&[QP_HTML, IMAGE, IMAGE])).unwrap();
        assert_eq!(doc.resources.len(), 1);
        assert_eq!(
            doc.resources[0].url,
            "https://scontent.example.net/v/p_s600x600_1.jpg"
        );
    }

    #[test]
    fn test_rejects_invalid_locators_and_non_images() {
        let bad_image = "Content-Type: image/png\r\nContent-Location: cid:img-1@mhtml\r\n\r\nxx";
        let css = "Content-Type: text/css\r\nContent-Location: https://static.example.net/a.css\r\n\r\nbody{}";
        let doc = decode(&mhtml(&[QP_HTML, bad_image, css])).unwrap();
        assert!(doc.resources.is_empty());
    }

    #[test]
    fn test_first_markup_part_wins() {
        let iframe = "Content-Type: text/html\r\n\r\n<html><body>iframe</body></html>";
        let doc = decode(&mhtml(&[QP_HTML, iframe])).unwrap();
        assert!(doc.html.contains("Library ID: 42"));
        assert!(!doc.html.contains("iframe"));
    }

    #[test]
    fn test_base64_markup_part() {
        // "<html><body>hi</body></html>"
        let part = "Content-Type: text/html; charset=utf-8\r\n\
            Content-Transfer-Encoding: base64\r\n\r\n\
            PGh0bWw+PGJvZHk+aGk8L2JvZHk+\r\nPC9odG1sPg==";
        let doc = decode(&mhtml(&[part])).unwrap();
        assert_eq!(doc.html, "<html><body>hi</body></html>");
    }

    #[test]
    fn test_lf_only_archive() {
        let raw = "Content-Type: multipart/related; boundary=\"b1\"\n\n\
            --b1\n\
            Content-Type: text/html\n\n\
            <html><body>lf</body></html>\n\
            --b1--\n";
        let doc = decode(raw.as_bytes()).unwrap();
        assert_eq!(doc.html, "<html><body>lf</body></html>");
    }

    #[test]
    fn test_boundary_token_inside_body_is_content() {
        let raw = "Content-Type: multipart/related; boundary=b\r\n\r\n\
            --b\r\n\
            Content-Type: text/html\r\n\r\n\
            <style>:root { --bg: red }</style><!-- --b --><div style=\"--bg: red\">x</div>\r\n\
            --b--\r\n";
        let archive = parse_archive(raw.as_bytes()).unwrap();
        assert_eq!(archive.parts.len(), 1);
        let doc = decode_archive(&archive);
        assert_eq!(
            doc.html,
            "<style>:root { --bg: red }</style><!-- --b --><div style=\"--bg: red\">x</div>"
        );
    }

    #[test]
    fn test_no_markup_part_is_empty_not_error() {
        let doc = decode(&mhtml(&[IMAGE])).unwrap();
        assert!(doc.is_empty());
        assert!(doc.resources.is_empty());
    }

    #[test]
    fn test_missing_boundary_is_format_error() {
        let raw = b"Content-Type: text/html\r\n\r\n<html></html>";
        assert_eq!(decode(raw), Err(ArchiveError::MissingBoundary));
    }

    #[test]
    fn test_boundary_without_parts_is_format_error() {
        let raw = b"Content-Type: multipart/related; boundary=\"zzz\"\r\n\r\nno delimiters here";
        assert!(matches!(decode(raw), Err(ArchiveError::NoParts { .. })));
    }

    #[test]
    fn test_parse_archive_keeps_part_headers() {
        let archive = parse_archive(&mhtml(&[QP_HTML, IMAGE])).unwrap();
        assert_eq!(archive.boundary, "----MultipartBoundary--abc123----");
        assert_eq!(archive.parts.len(), 2);
        assert_eq!(
            archive.parts[0].headers.transfer_encoding,
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(archive.parts[1].headers.content_type.as_deref(), Some("image/jpeg"));
    }
}
