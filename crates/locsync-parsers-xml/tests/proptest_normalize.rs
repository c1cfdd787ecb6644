//! Property tests for the source normalizer and the write-back round trip.

use locsync_core::DocumentKind;
use locsync_parsers_xml::{
    extract_segments, normalize, write_source_by_id, write_target_by_id, write_target_by_source,
};
use proptest::prelude::*;

fn doc_with(source: &str) -> String {
    format!(
        r#"<xliff><file><body><trans-unit id="u1"><source>{source}</source></trans-unit></body></file></xliff>"#
    )
}

proptest! {
    #[test]
    fn normalize_is_idempotent(s in any::<String>()) {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_markup(s in r"(<[a-z]{1,3}( id=.1.)?>|</[a-z]{1,3}>|[ \t\nA-Za-z<>]{0,6}){0,12}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn target_write_round_trips(text in "[A-Za-z0-9 &<>'\"]{1,24}") {
        let doc = doc_with("Submit");
        let out = write_target_by_source(&doc, "submit", &text);
        let segs = extract_segments(&out, DocumentKind::Xliff, "p.xlf");
        prop_assert_eq!(segs.len(), 1);
        prop_assert_eq!(&segs[0].target, &text);
    }

    #[test]
    fn target_by_id_round_trips(source in "[A-Za-z]{1,12}", text in "[A-Za-z0-9 &<>'\"]{1,24}") {
        let doc = doc_with(&source);
        let out = write_target_by_id(&doc, "u1", &text);
        let segs = extract_segments(&out, DocumentKind::Xliff, "p.xlf");
        prop_assert_eq!(segs.len(), 1);
        prop_assert_eq!(&segs[0].id, "u1");
        prop_assert_eq!(&segs[0].source, &source);
        prop_assert_eq!(&segs[0].target, &text);
    }

    #[test]
    fn source_write_round_trips(text in "[A-Za-z0-9 &<>]{1,24}") {
        let doc = doc_with("Old");
        let out = write_source_by_id(&doc, "u1", &text);
        let segs = extract_segments(&out, DocumentKind::Xliff, "p.xlf");
        prop_assert_eq!(&segs[0].id, "u1");
        prop_assert_eq!(&segs[0].source, &text);
    }
}
