#![cfg(test)]
//! End-to-end tests: archive bytes in, records out.

mod tests {
    use crate::config::ExtractConfig;
    use crate::diagnostics::Outcome;
    use crate::tools::clean::is_valid_url;
    use crate::types::{AdRecord, Platform, RunStatus};
    use crate::Pipeline;
    use chrono::NaiveDate;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

    fn mhtml(html: &str, image_locations: &[&str]) -> Vec<u8> {
        let mut out = String::from(
            "From: <Saved by Blink>\r\n\
             Snapshot-Content-Location: https://www.facebook.com/ads/library/\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/related;\r\n\
             \ttype=\"text/html\";\r\n\
             \tboundary=\"----MultipartBoundary--e2e----\"\r\n\r\n",
        );
        out.push_str("------MultipartBoundary--e2e----\r\n");
        out.push_str("Content-Type: text/html\r\n");
        out.push_str("Content-Location: https://www.facebook.com/ads/library/\r\n\r\n");
        out.push_str(html);
        out.push_str("\r\n");
        for location in image_locations {
            out.push_str("------MultipartBoundary--e2e----\r\n");
            out.push_str("Content-Type: image/jpeg\r\n");
            out.push_str("Content-Transfer-Encoding: base64\r\n");
            out.push_str(&format!("Content-Location: {location}\r\n\r\n"));
            out.push_str("/9j/4AAQSkZJRg==\r\n");
        }
        out.push_str("------MultipartBoundary--e2e------\r\n");
        out.into_bytes()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(&ExtractConfig::default()).unwrap()
    }

    const GALLERY: &str = r#"
        <html><body><div class="x1dr75xp">
        <div class="xh8yej3">
            <div class="xt0e3qv"><span class="x8t9es0 xw23nyj">Library ID: 1200345</span></div>
            <div class="x3nfvp2 x1e56ztr"><span class="x8t9es0 xw23nyj">Started running on Mar 14, 2024</span></div>
            <div class="x3nfvp2 x1e56ztr">
                <span class="x8t9es0 xw23nyj">Platforms</span>
                <div class="xtwfq29" style="mask-position: 0px -1188px"></div>
            </div>
            <div class="x6ikm8r x10wlt62">
                <div class="_4ik4 _4ik5"><span>Sponsored</span><span>Spring sale is live</span></div>
                <div class="_7jyg _7jyh">
                    <a href="https://l.facebook.com/l.php?u=https%3A%2F%2Fstore.example.com%2Fspring&amp;h=AT1" rel="nofollow noreferrer" target="_blank"><span>Shop Now</span></a>
                </div>
            </div>
            <div class="x1ywc1zp x78zum5 xl56j7k x1e56ztr x1277o0a">
                <img src="https://scontent.example.net/v/t39/p_s600x600_spring.jpg">
            </div>
        </div>
        <div class="xh8yej3">
            <div class="xt0e3qv"><span class="x8t9es0 xw23nyj">Ad ID: 1200346</span></div>
            <div class="x1qjc9v5"><video src="https://video.example.net/v/teaser.mp4"></video></div>
        </div>
        <div class="xh8yej3"><span>This ad ran without a visible id</span></div>
        </div></body></html>
    "#;

    #[test]
    fn test_scenario_no_cards() {
        let report = pipeline().run(&mhtml("<html><body><h1>No results</h1></body></html>", &[]));
        assert_eq!(report.status, RunStatus::NoCardsFound);
        assert!(report.records.is_empty());
        assert_eq!(report.diagnostics.count(Outcome::NoCardsFound), 1);
    }

    #[test]
    fn test_scenario_identifier_only_card() {
        let html = r#"<html><body><div class="xh8yej3"><span>Library ID: 998877</span></div></body></html>"#;
        let report = pipeline().run(&mhtml(html, &[]));
        assert_eq!(report.records, vec![AdRecord::bare("998877", vec![Platform::Instagram])]);
    }

    #[test]
    fn test_scenario_redirect_destination() {
        let html = r#"<html><body><div class="xh8yej3">
            <span>Library ID: 5</span>
            <a href="/redirect?u=https%3A%2F%2Fshop.example.com%2Fitem&amp;rel=nofollow" rel="nofollow noreferrer" target="_blank">Visit</a>
        </div></body></html>"#;
        let report = pipeline().run(&mhtml(html, &[]));
        assert_eq!(
            report.records[0].destination_url.as_deref(),
            Some("https://shop.example.com/item")
        );
    }

    #[test]
    fn test_scenario_embedded_resource_fallback() {
        let html = r#"<html><body><div class="xh8yej3">
            <span>Library ID: 6</span>
            <img src="https://scontent.example.net/v/s60x60_thumb.jpg">
        </div></body></html>"#;
        let archive = mhtml(
            html,
            &[
                "https://scontent.example.net/v/full_a.jpg",
                "https://scontent.example.net/v/full_b.jpg",
            ],
        );

        let report = pipeline().run(&archive);
        assert_eq!(report.resources, 2);
        assert_eq!(
            report.records[0].media_urls,
            vec![
                "https://scontent.example.net/v/full_a.jpg".to_string(),
                "https://scontent.example.net/v/full_b.jpg".to_string(),
            ]
        );

        let mut config = ExtractConfig::default();
        config.limits.max_resource_urls = 1;
        let report = Pipeline::new(&config).unwrap().run(&archive);
        assert_eq!(
            report.records[0].media_urls,
            vec!["https://scontent.example.net/v/full_a.jpg".to_string()]
        );
    }

    #[test]
    fn test_scenario_malformed_container() {
        let raw = b"MIME-Version: 1.0\r\nContent-Type: text/html\r\n\r\n<div class=\"xh8yej3\">Library ID: 1</div>";
        let report = pipeline().run(raw);
        assert_eq!(report.status, RunStatus::FormatError);
        assert!(report.records.is_empty());
        assert_eq!(report.diagnostics.count(Outcome::FormatError), 1);
    }

    #[test]
    fn test_gallery_end_to_end() {
        let report = pipeline().run(&mhtml(GALLERY, &[]));
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.cards_found, 3);
        assert_eq!(report.cards_skipped, 1);

        let first = &report.records[0];
        assert_eq!(first.identifier, "1200345");
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(first.platforms, vec![Platform::Facebook]);
        assert_eq!(first.creative_text.as_deref(), Some("Spring sale is live"));
        assert_eq!(first.call_to_action.as_deref(), Some("Shop Now"));
        assert_eq!(
            first.destination_url.as_deref(),
            Some("https://store.example.com/spring")
        );
        assert_eq!(
            first.media_urls,
            vec!["https://scontent.example.net/v/t39/p_s600x600_spring.jpg".to_string()]
        );

        let second = &report.records[1];
        assert_eq!(second.identifier, "1200346");
        assert_eq!(second.platforms, vec![Platform::Instagram]);
        assert_eq!(second.destination_url, None);
        assert_eq!(
            second.media_urls,
            vec!["https://video.example.net/v/teaser.mp4".to_string()]
        );
    }

    #[test]
    fn test_quoted_printable_snapshot() {
        let html = "<html><body><div class=3D\"xh8yej3\"><span>Library ID: 31=\r\n415</span></div></body></html>";
        let raw = format!(
            "Content-Type: multipart/related; boundary=\"qp\"\r\n\r\n\
             --qp\r\n\
             Content-Type: text/html; charset=\"utf-8\"\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\r\n\
             {html}\r\n\
             --qp--\r\n"
        );
        let report = pipeline().run(raw.as_bytes());
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].identifier, "31415");
    }

    #[test]
    fn test_short_boundary_with_custom_properties() {
        let raw = "Content-Type: multipart/related; boundary=\"b\"\r\n\r\n\
             --b\r\n\
             Content-Type: text/html\r\n\r\n\
             <div style=\"--bg: red\" class=\"xh8yej3\"><span>Library ID: 7</span></div>\r\n\
             --b--\r\n";
        let report = pipeline().run(raw.as_bytes());
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].identifier, "7");
    }

    #[test]
    fn test_runs_are_idempotent() {
        let raw = mhtml(GALLERY, &["https://scontent.example.net/v/full_a.jpg"]);
        let pipeline = pipeline();
        let a = pipeline.run(&raw);
        let b = pipeline.run(&raw);
        assert_eq!(a.records, b.records);
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn test_record_invariants_hold() {
        let raw = mhtml(GALLERY, &["https://scontent.example.net/v/full_a.jpg", "cid:frame"]);
        let report = pipeline().run(&raw);
        assert!(!report.records.is_empty());
        for record in &report.records {
            assert!(NUMERIC.is_match(&record.identifier));
            assert!(!record.platforms.is_empty());
            if let Some(url) = &record.destination_url {
                assert!(is_valid_url(url));
            }
            assert!(record.media_urls.iter().all(|u| is_valid_url(u)));
        }
    }
}
