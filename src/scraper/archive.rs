//! Extraction of the XML payload from the downloaded ZIP archive

use std::io::{Cursor, Read};

use crate::error::{Error, Result};

/// Extract the first member of a ZIP archive.
///
/// gesetze-im-internet.de ships exactly one XML file per archive; any
/// additional members are ignored. Fails on malformed archives and on
/// archives with no members.
pub fn extract_first_member(data: &[u8]) -> Result<Vec<u8>> {
    let cursor = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| Error::archive(format!("invalid ZIP archive: {}", e)))?;

    if archive.is_empty() {
        return Err(Error::archive("archive contains no members"));
    }

    let mut member = archive
        .by_index(0)
        .map_err(|e| Error::archive(format!("failed to read archive member: {}", e)))?;

    let mut buffer = Vec::with_capacity(member.size() as usize);
    member.read_to_end(&mut buffer)?;

    tracing::debug!(member = member.name(), bytes = buffer.len(), "extracted archive member");

    Ok(buffer)
}
