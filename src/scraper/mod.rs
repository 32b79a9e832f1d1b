//! Scrape pipeline for gesetze-im-internet.de
//!
//! Fetch → extract → parse → segment, as a linear pipeline per code.
//! Fetching goes through the [`DocumentSource`] trait so tests can swap
//! in a deterministic source.

pub mod archive;
pub mod segmenter;
pub mod xml;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::types::LegalText;
use self::xml::GermanLegalXmlParser;

/// Source of compressed norm documents, one per code.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the compressed document for a code. Non-success responses
    /// are errors; retries, if any, belong to the implementation.
    async fn fetch(&self, code: &str) -> Result<Vec<u8>>;
}

/// HTTP document source for the public gesetze-im-internet.de tree.
pub struct HttpDocumentSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentSource {
    /// Create a source for the configured document tree.
    pub fn new(config: &ScraperConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Deterministic locator of the archive for a code.
    pub fn document_url(&self, code: &str) -> String {
        format!("{}/{}/xml.zip", self.base_url, code)
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, code: &str) -> Result<Vec<u8>> {
        let url = self.document_url(code);
        tracing::info!(%url, "fetching norm document");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        Ok(bytes.to_vec())
    }
}

/// Scraper for legal texts from gesetze-im-internet.de.
pub struct GesetzeImInternetScraper {
    source: Arc<dyn DocumentSource>,
}

impl GesetzeImInternetScraper {
    /// Create a scraper fetching from the configured document tree.
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            source: Arc::new(HttpDocumentSource::new(config)),
        }
    }

    /// Create a scraper with an explicit document source.
    pub fn with_source(source: Arc<dyn DocumentSource>) -> Self {
        Self { source }
    }

    /// Scrape all legal text units for a code.
    ///
    /// Fetch, archive and parse failures propagate; an empty result is
    /// valid (e.g. a document with no citable norms).
    pub async fn scrape(&self, code: &str) -> Result<Vec<LegalText>> {
        let archive_bytes = self.source.fetch(code).await?;
        let xml_bytes = archive::extract_first_member(&archive_bytes)?;
        let document = GermanLegalXmlParser::parse_bytes(&xml_bytes)?;

        let mut texts = Vec::new();
        for norm in &document.norms {
            texts.extend(segmenter::segment_norm(norm, code));
        }

        tracing::info!(
            code,
            norms = document.norms.len(),
            units = texts.len(),
            "scraped norm document"
        );

        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    /// Deterministic source serving canned archive bytes.
    struct FakeSource {
        payload: Result<Vec<u8>>,
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn fetch(&self, _code: &str) -> Result<Vec<u8>> {
            match &self.payload {
                Ok(bytes) => Ok(bytes.clone()),
                Err(_) => Err(Error::archive("fetch failed")),
            }
        }
    }

    fn zipped(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("norm.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn scraper_for(xml: &str) -> GesetzeImInternetScraper {
        GesetzeImInternetScraper::with_source(Arc::new(FakeSource {
            payload: Ok(zipped(xml)),
        }))
    }

    #[test]
    fn builds_deterministic_document_url() {
        let source = HttpDocumentSource::new(&ScraperConfig::default());

        assert_eq!(
            source.document_url("bgb"),
            "https://www.gesetze-im-internet.de/bgb/xml.zip"
        );
    }

    #[tokio::test]
    async fn scrapes_units_with_caller_code() {
        let scraper = scraper_for(
            r#"<dokumente>
                <norm>
                    <metadaten><jurabk>BGB</jurabk><enbez>§ 1</enbez></metadaten>
                    <textdaten><text><Content><P>Text.</P></Content></text></textdaten>
                </norm>
            </dokumente>"#,
        );

        let texts = scraper.scrape("my_custom_code").await.unwrap();

        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].code, "my_custom_code");
        assert_eq!(texts[0].section, "§ 1");
    }

    #[tokio::test]
    async fn accumulates_units_across_norms_in_order() {
        let scraper = scraper_for(
            r#"<dokumente>
                <norm>
                    <metadaten><enbez>§ 1</enbez></metadaten>
                    <textdaten><text><Content>
                        <P>(1) First.</P>
                        <P>(2) Second.</P>
                    </Content></text></textdaten>
                </norm>
                <norm>
                    <metadaten><enbez>§ 2</enbez></metadaten>
                    <textdaten><text><Content><P>Third.</P></Content></text></textdaten>
                </norm>
            </dokumente>"#,
        );

        let texts = scraper.scrape("bgb").await.unwrap();

        let keys: Vec<(&str, &str)> = texts
            .iter()
            .map(|t| (t.section.as_str(), t.sub_section.as_str()))
            .collect();
        assert_eq!(keys, vec![("§ 1", "1"), ("§ 1", "2"), ("§ 2", "")]);
    }

    #[tokio::test]
    async fn empty_document_is_a_valid_empty_result() {
        let scraper = scraper_for("<dokumente></dokumente>");

        let texts = scraper.scrape("bgb").await.unwrap();

        assert!(texts.is_empty());
    }

    #[tokio::test]
    async fn scraping_twice_yields_identical_units() {
        let xml = r#"<dokumente>
            <norm>
                <metadaten><enbez>§ 1</enbez></metadaten>
                <textdaten><text><Content><P>(1) Stable text.</P></Content></text></textdaten>
            </norm>
        </dokumente>"#;
        let scraper = scraper_for(xml);

        let first = scraper.scrape("bgb").await.unwrap();
        let second = scraper.scrape("bgb").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let scraper = GesetzeImInternetScraper::with_source(Arc::new(FakeSource {
            payload: Err(Error::archive("unused")),
        }));

        let result = scraper.scrape("bgb").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn invalid_archive_errors_propagate() {
        let scraper = GesetzeImInternetScraper::with_source(Arc::new(FakeSource {
            payload: Ok(b"not a zip".to_vec()),
        }));

        let result = scraper.scrape("bgb").await;

        assert!(matches!(result, Err(Error::Archive(_))));
    }
}
