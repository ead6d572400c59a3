use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::models::Article;
use crate::time::parse_timestamp;
use crate::{Error, Result};

/// Formats some feeds use that are not worth showing as relative time
/// but still need to take part in the recency filter
const LENIENT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a timestamp found inside a feed document
fn parse_feed_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(ts) = parse_timestamp(raw) {
        return ts.to_utc();
    }

    LENIENT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Timestamp text of one entry, exactly as written in the document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RawDates {
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum DateField {
    Published,
    Updated,
}

fn date_field(local_name: &[u8]) -> Option<DateField> {
    match local_name {
        b"pubDate" | b"published" | b"issued" | b"date" => Some(DateField::Published),
        b"updated" | b"modified" => Some(DateField::Updated),
        _ => None,
    }
}

/// Collect the date elements that are direct children of each `item` or
/// `entry`, in document order. `None` if the document is not XML.
fn raw_entry_dates(content: &[u8]) -> Option<Vec<RawDates>> {
    let mut reader = Reader::from_reader(content);
    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut entry: Option<(usize, RawDates)> = None;
    let mut capture: Option<(DateField, String)> = None;

    loop {
        match reader.read_event_into(&mut buf).ok()? {
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                match entry.as_ref().map(|(entry_depth, _)| *entry_depth) {
                    None if matches!(local.as_ref(), b"item" | b"entry") => {
                        entry = Some((depth, RawDates::default()));
                    }
                    Some(entry_depth) if depth == entry_depth + 1 => {
                        capture = date_field(local.as_ref()).map(|field| (field, String::new()));
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some((_, captured)) = &mut capture {
                    captured.push_str(&text.unescape().ok()?);
                }
            }
            Event::CData(data) => {
                if let Some((_, captured)) = &mut capture {
                    captured.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                match entry.take() {
                    Some((entry_depth, mut dates)) if depth == entry_depth + 1 => {
                        if let Some((field, captured)) = capture.take() {
                            let slot = match field {
                                DateField::Published => &mut dates.published,
                                DateField::Updated => &mut dates.updated,
                            };
                            let captured = captured.trim();
                            if slot.is_none() && !captured.is_empty() {
                                *slot = Some(captured.to_string());
                            }
                        }
                        entry = Some((entry_depth, dates));
                    }
                    Some((entry_depth, dates)) if depth == entry_depth => entries.push(dates),
                    other => entry = other,
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Some(entries)
}

/// Parse RSS/Atom content and keep entries dated at or after `cutoff`.
///
/// Entries carrying neither a parsable published nor updated timestamp are
/// dropped. The returned articles keep the entry's own timestamp text,
/// published before updated, even when that text could not be parsed.
pub fn parse_articles(content: &[u8], source: &str, cutoff: DateTime<Utc>) -> Result<Vec<Article>> {
    let feed = parser::Builder::new()
        .timestamp_parser(parse_feed_timestamp)
        .build()
        .parse(content)
        .map_err(|e| Error::FeedParse(e.to_string()))?;

    let total = feed.entries.len();

    // feed-rs only hands back parsed instants; the text comes from a second pass
    let raw_dates = raw_entry_dates(content).filter(|dates| dates.len() == total);
    if raw_dates.is_none() && total > 0 {
        tracing::debug!("{}: entry dates not recoverable as text, using parsed values", source);
    }

    let articles: Vec<Article> = feed
        .entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let timestamp = entry.published.or(entry.updated)?;
            if timestamp < cutoff {
                tracing::debug!("Skipping entry older than cutoff: {:?}", entry_title(&entry));
                return None;
            }

            let published = raw_dates
                .as_ref()
                .and_then(|dates| dates.get(index))
                .and_then(|raw| raw.published.clone().or_else(|| raw.updated.clone()))
                .unwrap_or_else(|| timestamp.to_rfc2822());

            Some(Article {
                title: entry_title(&entry).unwrap_or_default(),
                link: primary_link(&entry.links).unwrap_or_default(),
                published,
                source: source.to_string(),
            })
        })
        .collect();

    tracing::debug!("{}: {} of {} entries within window", source, articles.len(), total);

    Ok(articles)
}

fn entry_title(entry: &Entry) -> Option<String> {
    entry.title.as_ref().map(|t| t.content.trim().to_string())
}

/// The alternate link if the entry marks one, otherwise the first link
fn primary_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().map_or(false, |rel| rel == "alternate"))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap()
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <link>https://blog.example.com/</link>
    <item>
      <title>Fresh post</title>
      <link>https://blog.example.com/fresh</link>
      <pubDate>Thu, 14 Mar 2024 09:30:00 +0800</pubDate>
    </item>
    <item>
      <title>Old post</title>
      <link>https://blog.example.com/old</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated post</title>
      <link>https://blog.example.com/undated</link>
    </item>
    <item>
      <title>Boundary post</title>
      <link>https://blog.example.com/boundary</link>
      <pubDate>Fri, 08 Mar 2024 00:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:example:feed</id>
  <updated>2024-03-14T10:00:00Z</updated>
  <entry>
    <title>Updated only</title>
    <id>urn:example:1</id>
    <link rel="alternate" href="https://atom.example.com/1"/>
    <updated>2024-03-12T08:00:00Z</updated>
  </entry>
  <entry>
    <title>Published and updated</title>
    <id>urn:example:2</id>
    <link rel="edit" href="https://atom.example.com/edit/2"/>
    <link rel="alternate" href="https://atom.example.com/2"/>
    <published>2024-03-10T08:00:00+08:00</published>
    <updated>2024-03-13T08:00:00Z</updated>
  </entry>
  <entry>
    <id>urn:example:3</id>
    <updated>2024-03-11T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_rss_filters_by_cutoff() {
        let articles = parse_articles(RSS.as_bytes(), "blog.example.com", cutoff()).unwrap();

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Fresh post", "Boundary post"]);
        assert!(articles.iter().all(|a| a.source == "blog.example.com"));
    }

    #[test]
    fn test_rss_keeps_raw_timestamp_text() {
        let articles = parse_articles(RSS.as_bytes(), "blog.example.com", cutoff()).unwrap();
        assert_eq!(articles[0].published, "Thu, 14 Mar 2024 09:30:00 +0800");
        assert_eq!(articles[0].link, "https://blog.example.com/fresh");
    }

    #[test]
    fn test_atom_prefers_published_then_updated() {
        let articles = parse_articles(ATOM.as_bytes(), "atom.example.com", cutoff()).unwrap();
        assert_eq!(articles.len(), 3);

        assert_eq!(articles[0].title, "Updated only");
        assert_eq!(articles[0].published, "2024-03-12T08:00:00Z");

        assert_eq!(articles[1].published, "2024-03-10T08:00:00+08:00");
        assert_eq!(articles[1].link, "https://atom.example.com/2");

        // Missing title and link become empty strings
        assert_eq!(articles[2].title, "");
        assert_eq!(articles[2].link, "");
    }

    #[test]
    fn test_published_before_cutoff_excludes_entry_even_if_updated_later() {
        let late_cutoff = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        let articles = parse_articles(ATOM.as_bytes(), "atom.example.com", late_cutoff).unwrap();

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Updated only", ""]);
    }

    #[test]
    fn test_future_cutoff_excludes_everything() {
        let articles =
            parse_articles(RSS.as_bytes(), "blog.example.com", Utc::now() + Duration::days(1)).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_empty_channel_is_not_an_error() {
        let rss = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let articles = parse_articles(rss.as_bytes(), "empty.example.com", cutoff()).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let result = parse_articles(b"<html><body>nope</body></html>", "x.example.com", cutoff());
        assert!(matches!(result, Err(Error::FeedParse(_))));
    }

    fn rss_with_dates(dates: &[&str]) -> String {
        let items: String = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                format!(
                    "<item><title>post {}</title><link>https://loose.example.com/{}</link><pubDate>{}</pubDate></item>",
                    i, i, date
                )
            })
            .collect();
        format!(r#"<rss version="2.0"><channel><title>Loose</title>{}</channel></rss>"#, items)
    }

    #[test]
    fn test_loosely_formatted_pub_dates_are_kept() {
        let dates = [
            "Thu, 14 Mar 2024 09:30:00 UTC",
            "Thursday, 14 Mar 2024 09:30:00 GMT",
            "Thu, 14 Mar 2024 9:30:00 +0800",
            "Thu, 14 Mar 2024 09:30:00 +08:00",
            "Thu, 14 March 2024 09:30:00 GMT",
        ];
        let rss = rss_with_dates(&dates);

        let articles = parse_articles(rss.as_bytes(), "loose.example.com", cutoff()).unwrap();

        let published: Vec<&str> = articles.iter().map(|a| a.published.as_str()).collect();
        assert_eq!(published, dates.to_vec());
    }

    #[test]
    fn test_unparsable_published_text_is_kept_over_updated() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Odd dates</title>
  <id>urn:odd</id>
  <updated>2024-03-14T10:00:00Z</updated>
  <entry>
    <title>Odd</title>
    <id>urn:odd:1</id>
    <link href="https://odd.example.com/1"/>
    <published>March 13th 2024</published>
    <updated>2024-03-12T08:00:00Z</updated>
  </entry>
</feed>"#;

        let articles = parse_articles(atom.as_bytes(), "odd.example.com", cutoff()).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published, "March 13th 2024");
    }

    #[test]
    fn test_same_instant_keeps_each_entrys_own_text() {
        let rss = r#"<rss version="2.0"><channel><title>Same</title>
            <lastBuildDate>Thu, 14 Mar 2024 01:30:00 GMT</lastBuildDate>
            <item><title>a</title><pubDate>Thu, 14 Mar 2024 09:30:00 +0800</pubDate></item>
            <item><title>b</title><pubDate>Thu, 14 Mar 2024 01:30:00 +0000</pubDate></item>
            </channel></rss>"#;

        let articles = parse_articles(rss.as_bytes(), "same.example.com", cutoff()).unwrap();

        let published: Vec<&str> = articles.iter().map(|a| a.published.as_str()).collect();
        assert_eq!(
            published,
            vec!["Thu, 14 Mar 2024 09:30:00 +0800", "Thu, 14 Mar 2024 01:30:00 +0000"]
        );
    }

    #[test]
    fn test_raw_dates_skip_nested_elements() {
        let atom = br#"<feed xmlns="http://www.w3.org/2005/Atom"><updated>2024-03-14T10:00:00Z</updated>
            <entry><source><updated>2020-01-01T00:00:00Z</updated></source>
            <updated><![CDATA[2024-03-12T08:00:00Z]]></updated></entry>
            <entry><published> 2024-03-11T08:00:00Z </published></entry></feed>"#;

        let dates = raw_entry_dates(atom).unwrap();

        assert_eq!(
            dates,
            vec![
                RawDates { published: None, updated: Some("2024-03-12T08:00:00Z".to_string()) },
                RawDates { published: Some("2024-03-11T08:00:00Z".to_string()), updated: None },
            ]
        );
    }

    #[test]
    fn test_lenient_feed_timestamps() {
        assert_eq!(
            parse_feed_timestamp("2024-03-14 09:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap())
        );
        assert_eq!(
            parse_feed_timestamp("2024-03-14"),
            Some(Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_feed_timestamp("someday"), None);
    }
}
