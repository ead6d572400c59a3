use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::{AppConfig, Error, Result};

/// A feed subscription listed in an OPML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpmlFeed {
    pub name: String,
    pub url: String,
}

/// Read and parse an OPML file
pub fn parse_opml_file(path: &Path) -> Result<Vec<OpmlFeed>> {
    let content = std::fs::read_to_string(path)?;
    parse_opml(&content)
}

/// Collect every `outline` that carries an `xmlUrl`; category outlines are skipped
pub fn parse_opml(content: &str) -> Result<Vec<OpmlFeed>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut feeds = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                let mut xml_url = None;
                let mut title = None;
                let mut text = None;

                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                    match attr.key.as_ref() {
                        b"xmlUrl" => xml_url = Some(value),
                        b"title" => title = Some(value),
                        b"text" => text = Some(value),
                        _ => {}
                    }
                }

                if let Some(url) = xml_url.filter(|u| !u.trim().is_empty()) {
                    let name = title.or(text).unwrap_or_else(|| url.clone());
                    feeds.push(OpmlFeed { name, url: url.trim().to_string() });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Opml(format!(
                    "Failed to parse OPML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(feeds)
}

/// Merge OPML feeds into the config. Returns how many were new.
pub fn import_into(config: &mut AppConfig, feeds: &[OpmlFeed]) -> usize {
    feeds
        .iter()
        .filter(|feed| {
            let added = config.add_feed(&feed.url);
            if added {
                tracing::info!("Imported feed '{}' ({})", feed.name, feed.url);
            }
            added
        })
        .count()
}
