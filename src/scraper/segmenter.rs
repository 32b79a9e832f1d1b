//! Segmentation of a norm's paragraphs into citable sub-section units

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scraper::xml::Norm;
use crate::types::LegalText;

/// Marker used by the source for repealed norms
const REPEALED_MARKER: &str = "(weggefallen)";

/// Matches a group whose entire content is a repeal stub: an optional
/// leading `(n)` marker, then exactly `(weggefallen)` or `(aufgehoben)`.
/// A sub-section that merely starts with repeal wording but carries
/// substantive text afterwards is kept.
static REPEAL_STUB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:\([0-9a-z]+\)\s*)?\((?:weggefallen|aufgehoben)\)\s*$")
        .expect("repeal stub pattern is valid")
});

/// Segment one norm into legal text units for the given code.
///
/// Norms without a section label (`enbez`) carry no citable identity and
/// are skipped, as are norms that are repealed as a whole. Paragraphs are
/// grouped by their sub-section number, preserving first-seen order, so
/// the produced (code, section, sub_section) tuples are unique per norm.
pub fn segment_norm(norm: &Norm, code: &str) -> Vec<LegalText> {
    let Some(section) = norm.metadata.enbez.as_deref() else {
        return Vec::new();
    };

    if is_repealed(norm) {
        tracing::debug!(section, "skipping repealed norm");
        return Vec::new();
    }

    let mut units = Vec::new();
    for (sub_section, text) in group_paragraphs(&norm.paragraphs) {
        if REPEAL_STUB.is_match(&text) {
            tracing::debug!(section, %sub_section, "dropping repeal stub");
            continue;
        }
        if text.trim().is_empty() {
            continue;
        }
        units.push(LegalText {
            text,
            code: code.to_string(),
            section: section.to_string(),
            sub_section,
        });
    }

    units
}

/// Whether a norm is repealed as a whole: its title carries the repeal
/// marker, or every one of its paragraphs is nothing but the marker.
fn is_repealed(norm: &Norm) -> bool {
    if let Some(titel) = norm.metadata.titel.as_deref() {
        if titel.to_lowercase().contains(REPEALED_MARKER) {
            return true;
        }
    }

    !norm.paragraphs.is_empty()
        && norm
            .paragraphs
            .iter()
            .all(|p| p.trim().eq_ignore_ascii_case(REPEALED_MARKER))
}

/// Group paragraphs by sub-section key, preserving first-seen key order
/// and within-key paragraph order. Each group is joined with a blank line.
fn group_paragraphs(paragraphs: &[String]) -> Vec<(String, String)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&str>> = HashMap::new();

    for paragraph in paragraphs {
        let key = sub_section_key(paragraph);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(paragraph);
    }

    order
        .into_iter()
        .map(|key| {
            let text = groups
                .remove(&key)
                .unwrap_or_default()
                .join("\n\n");
            (key, text)
        })
        .collect()
}

/// Derive the sub-section key of a paragraph.
///
/// Numbered sub-sections start with `(n)`: the key is the text between
/// the first `(` and the first following `)`. A parenthesis anywhere
/// else yields no key.
fn sub_section_key(paragraph: &str) -> String {
    match paragraph.trim_start().strip_prefix('(') {
        Some(rest) => rest.split(')').next().unwrap_or(rest).to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::xml::NormMetadata;

    fn norm(enbez: Option<&str>, titel: Option<&str>, paragraphs: &[&str]) -> Norm {
        Norm {
            metadata: NormMetadata {
                jurabk: Some("BGB".to_string()),
                enbez: enbez.map(str::to_string),
                titel: titel.map(str::to_string),
            },
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn extracts_single_digit_key() {
        assert_eq!(sub_section_key("(1) Die Rechtsfähigkeit..."), "1");
    }

    #[test]
    fn extracts_double_digit_key() {
        assert_eq!(sub_section_key("(12) Some longer text here"), "12");
    }

    #[test]
    fn extracts_alphanumeric_key() {
        assert_eq!(sub_section_key("(2a) Mixed numbering"), "2a");
    }

    #[test]
    fn no_key_without_leading_parenthesis() {
        assert_eq!(sub_section_key("Regular paragraph text"), "");
    }

    #[test]
    fn no_key_for_parenthesis_mid_text() {
        assert_eq!(sub_section_key("Text with (1) in middle"), "");
    }

    #[test]
    fn key_after_leading_whitespace() {
        assert_eq!(sub_section_key("  (3) Indented paragraph"), "3");
    }

    #[test]
    fn separates_numbered_sub_sections() {
        let norm = norm(
            Some("§ 1"),
            None,
            &[
                "(1) First subsection text.",
                "(2) Second subsection text.",
                "(3) Third subsection text.",
            ],
        );

        let units = segment_norm(&norm, "bgb");

        assert_eq!(units.len(), 3);
        let sub_sections: Vec<&str> = units.iter().map(|u| u.sub_section.as_str()).collect();
        assert_eq!(sub_sections, vec!["1", "2", "3"]);
    }

    #[test]
    fn concatenates_unnumbered_paragraphs() {
        let norm = norm(
            Some("§ 1"),
            None,
            &[
                "First paragraph without number.",
                "Second paragraph without number.",
            ],
        );

        let units = segment_norm(&norm, "bgb");

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].sub_section, "");
        assert_eq!(
            units[0].text,
            "First paragraph without number.\n\nSecond paragraph without number."
        );
    }

    #[test]
    fn mixes_numbered_and_unnumbered_paragraphs() {
        let norm = norm(
            Some("§ 1"),
            None,
            &[
                "(1) First numbered.",
                "Continuation of first.",
                "(2) Second numbered.",
                "Another unnumbered.",
            ],
        );

        let units = segment_norm(&norm, "bgb");

        assert_eq!(units.len(), 3);
        let sub_sections: Vec<&str> = units.iter().map(|u| u.sub_section.as_str()).collect();
        assert_eq!(sub_sections, vec!["1", "", "2"]);

        let unnumbered = units.iter().find(|u| u.sub_section.is_empty()).unwrap();
        assert_eq!(
            unnumbered.text,
            "Continuation of first.\n\nAnother unnumbered."
        );
    }

    #[test]
    fn uses_caller_code_not_jurabk() {
        let norm = norm(Some("§ 1"), None, &["Text."]);

        let units = segment_norm(&norm, "my_custom_code");

        assert_eq!(units[0].code, "my_custom_code");
    }

    #[test]
    fn skips_norm_without_enbez() {
        let norm = norm(None, None, &["Some text."]);

        assert!(segment_norm(&norm, "bgb").is_empty());
    }

    #[test]
    fn skips_norm_with_repealed_title() {
        let norm = norm(Some("§ 5"), Some("(weggefallen)"), &["(weggefallen)"]);

        assert!(segment_norm(&norm, "bgb").is_empty());
    }

    #[test]
    fn repealed_title_marker_is_case_insensitive() {
        let norm = norm(Some("§ 5"), Some("§ 5 (Weggefallen)"), &["Some text."]);

        assert!(segment_norm(&norm, "bgb").is_empty());
    }

    #[test]
    fn skips_norm_whose_paragraphs_are_all_repealed() {
        let norm = norm(
            Some("§ 5"),
            Some("Old title"),
            &["(weggefallen)", "  (WEGGEFALLEN)  "],
        );

        assert!(segment_norm(&norm, "bgb").is_empty());
    }

    #[test]
    fn drops_repeal_stub_groups() {
        let norm = norm(
            Some("§ 6"),
            None,
            &[
                "(1) Substantive rule.",
                "(2)(weggefallen)",
                "(3) (aufgehoben)",
                "(4) Another substantive rule.",
            ],
        );

        let units = segment_norm(&norm, "bgb");

        let sub_sections: Vec<&str> = units.iter().map(|u| u.sub_section.as_str()).collect();
        assert_eq!(sub_sections, vec!["1", "4"]);
    }

    #[test]
    fn bare_repeal_stub_group_is_dropped() {
        let norm = norm(Some("§ 6"), None, &["(1) Kept.", "(Aufgehoben)"]);

        let units = segment_norm(&norm, "bgb");

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].sub_section, "1");
    }

    #[test]
    fn repeal_wording_with_substantive_text_survives() {
        let norm = norm(
            Some("§ 7"),
            None,
            &["(1) (weggefallen) soweit nicht anders bestimmt, gilt Absatz 2."],
        );

        let units = segment_norm(&norm, "bgb");

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].sub_section, "1");
    }

    #[test]
    fn empty_paragraph_list_yields_no_units() {
        let norm = norm(Some("§ 1"), None, &[]);

        assert!(segment_norm(&norm, "bgb").is_empty());
    }

    #[test]
    fn output_keys_are_unique() {
        let norm = norm(
            Some("§ 1"),
            None,
            &[
                "Paragraph A without number.",
                "Paragraph B without number.",
                "(1) Numbered.",
                "Paragraph C without number.",
            ],
        );

        let units = segment_norm(&norm, "bgb");

        let mut keys: Vec<(&str, &str, &str)> = units
            .iter()
            .map(|u| (u.code.as_str(), u.section.as_str(), u.sub_section.as_str()))
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn preserves_paragraph_order_within_group() {
        let norm = norm(
            Some("§ 1"),
            None,
            &["First paragraph.", "Second paragraph.", "Third paragraph."],
        );

        let units = segment_norm(&norm, "bgb");

        let text = &units[0].text;
        let first = text.find("First").unwrap();
        let second = text.find("Second").unwrap();
        let third = text.find("Third").unwrap();
        assert!(first < second && second < third);
    }
}
