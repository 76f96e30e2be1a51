//! Replay decoding: `.bbrz` archive → [`Record`].
//!
//! A `.bbrz` file is a zip archive whose first entry is the replay XML. The
//! parser is pure and synchronous; callers on an async runtime should run it on
//! the blocking pool.

pub mod mapping;
pub mod record;
pub mod replay;

use std::io::{Cursor, Read};

pub use record::{PlayerResult, Record, TeamStats};

use crate::error::ParseError;

/// Decodes raw artifact bytes into a [`Record`].
///
/// Implementations must be safe to call from many workers at once and must
/// never return a partially filled record.
pub trait ReplayParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<Record, ParseError>;
}

/// Parser for zipped replay archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct BbrzParser;

impl BbrzParser {
    pub fn new() -> Self {
        Self
    }
}

impl ReplayParser for BbrzParser {
    fn parse(&self, raw: &[u8]) -> Result<Record, ParseError> {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(raw)).map_err(|e| ParseError::Archive(e.to_string()))?;
        if archive.is_empty() {
            return Err(ParseError::EmptyArchive);
        }

        let mut entry = archive
            .by_index(0)
            .map_err(|e| ParseError::Archive(e.to_string()))?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;

        parse_xml(&xml)
    }
}

/// Decode an already extracted replay document.
pub fn parse_xml(xml: &str) -> Result<Record, ParseError> {
    let xml = xml.trim_start_matches('\u{feff}');
    let replay: replay::Replay =
        quick_xml::de::from_str(xml).map_err(|e| ParseError::Xml(e.to_string()))?;
    Record::from_replay(replay)
}
