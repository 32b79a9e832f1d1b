//! Parser for the gesetze-im-internet.de norm document XML format
//!
//! A norm document is a `<dokumente>` root holding `<norm>` elements. Each
//! norm carries `<metadaten>` (abbreviation, section label, title) and
//! `<textdaten>` with the body paragraphs under `<text><Content><P>`.
//! Footnote blocks (`<fussnoten>`) contain their own `<text>` element and
//! are not body text.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

/// A parsed norm document: the ordered list of norms it contains.
#[derive(Debug, Clone, Default)]
pub struct LawDocument {
    /// Norms in document order
    pub norms: Vec<Norm>,
}

/// One norm (section-level unit) of a law document.
#[derive(Debug, Clone, Default)]
pub struct Norm {
    /// Norm metadata
    pub metadata: NormMetadata,
    /// Body paragraphs in document order, trimmed, empty ones dropped
    pub paragraphs: Vec<String>,
}

/// Metadata of a norm. All fields are optional in the source format;
/// consumers match on presence rather than probing.
#[derive(Debug, Clone, Default)]
pub struct NormMetadata {
    /// Official abbreviation of the code (e.g. "BGB")
    pub jurabk: Option<String>,
    /// Section label (e.g. "§ 1"); absent on framing norms without a
    /// citable identity
    pub enbez: Option<String>,
    /// Section title
    pub titel: Option<String>,
}

/// Metadata field currently being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Jurabk,
    Enbez,
    Titel,
}

/// Pull parser for norm documents.
pub struct GermanLegalXmlParser;

impl GermanLegalXmlParser {
    /// Parse a norm document from raw XML bytes.
    pub fn parse_bytes(data: &[u8]) -> Result<LawDocument> {
        let mut reader = Reader::from_reader(data);
        let mut buf = Vec::new();

        let mut document = LawDocument::default();
        let mut norm: Option<Norm> = None;

        let mut in_metadaten = false;
        let mut in_textdaten = false;
        let mut in_fussnoten = false;
        let mut in_text = false;
        let mut in_content = false;
        let mut paragraph_depth = 0usize;

        let mut capture: Option<MetaField> = None;
        let mut meta_buf = String::new();
        let mut paragraph_buf = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"norm" => {
                        norm = Some(Norm::default());
                        in_metadaten = false;
                        in_textdaten = false;
                        in_fussnoten = false;
                        in_text = false;
                        in_content = false;
                        paragraph_depth = 0;
                    }
                    b"metadaten" if norm.is_some() => in_metadaten = true,
                    b"jurabk" if in_metadaten => {
                        capture = Some(MetaField::Jurabk);
                        meta_buf.clear();
                    }
                    b"enbez" if in_metadaten => {
                        capture = Some(MetaField::Enbez);
                        meta_buf.clear();
                    }
                    b"titel" if in_metadaten => {
                        capture = Some(MetaField::Titel);
                        meta_buf.clear();
                    }
                    b"textdaten" if norm.is_some() => in_textdaten = true,
                    b"fussnoten" if in_textdaten => in_fussnoten = true,
                    b"text" if in_textdaten && !in_fussnoten => in_text = true,
                    b"Content" if in_text => in_content = true,
                    b"P" if in_content => {
                        if paragraph_depth == 0 {
                            paragraph_buf.clear();
                        }
                        paragraph_depth += 1;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    let text = e
                        .decode()
                        .map_err(|e| Error::xml(format!("invalid text content: {}", e)))?;
                    if capture.is_some() {
                        meta_buf.push_str(&text);
                    } else if paragraph_depth > 0 {
                        paragraph_buf.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e);
                    if capture.is_some() {
                        meta_buf.push_str(&text);
                    } else if paragraph_depth > 0 {
                        paragraph_buf.push_str(&text);
                    }
                }
                // Character and entity references (`&#167;`, `&amp;`) arrive
                // as separate events and carry the section sign itself
                Ok(Event::GeneralRef(e)) => {
                    let text = resolve_reference(&e).ok_or_else(|| {
                        Error::xml(format!(
                            "unknown entity reference '&{};'",
                            String::from_utf8_lossy(&e)
                        ))
                    })?;
                    if capture.is_some() {
                        meta_buf.push_str(&text);
                    } else if paragraph_depth > 0 {
                        paragraph_buf.push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"norm" => {
                        if let Some(n) = norm.take() {
                            document.norms.push(n);
                        }
                    }
                    b"metadaten" => in_metadaten = false,
                    b"jurabk" | b"enbez" | b"titel" => {
                        if let (Some(field), Some(n)) = (capture.take(), norm.as_mut()) {
                            let value = meta_buf.trim();
                            if !value.is_empty() {
                                let slot = match field {
                                    MetaField::Jurabk => &mut n.metadata.jurabk,
                                    MetaField::Enbez => &mut n.metadata.enbez,
                                    MetaField::Titel => &mut n.metadata.titel,
                                };
                                // jurabk may repeat; the first occurrence wins
                                if slot.is_none() {
                                    *slot = Some(value.to_string());
                                }
                            }
                        }
                    }
                    b"textdaten" => in_textdaten = false,
                    b"fussnoten" => in_fussnoten = false,
                    b"text" => in_text = false,
                    b"Content" => in_content = false,
                    b"P" if paragraph_depth > 0 => {
                        paragraph_depth -= 1;
                        if paragraph_depth == 0 {
                            let paragraph = paragraph_buf.trim();
                            if !paragraph.is_empty() {
                                if let Some(n) = norm.as_mut() {
                                    n.paragraphs.push(paragraph.to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::xml(format!(
                        "malformed document at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        tracing::debug!(norms = document.norms.len(), "parsed norm document");

        Ok(document)
    }
}

/// Resolve a character or predefined entity reference to its text.
fn resolve_reference(name: &[u8]) -> Option<String> {
    match name {
        b"amp" => Some("&".to_string()),
        b"lt" => Some("<".to_string()),
        b"gt" => Some(">".to_string()),
        b"apos" => Some("'".to_string()),
        b"quot" => Some("\"".to_string()),
        _ => {
            let name = std::str::from_utf8(name).ok()?;
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code).map(String::from)
        }
    }
}
