//! RSS 2.0 serialization of feed documents.
//!
//! # Output Shape
//!
//! ```text
//! <rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
//!   <channel>
//!     <title/> <link/> <description/> [atom:link rel="self"]
//!     <docs/> <generator/> <lastBuildDate/>
//!     <item> <title/> <link/> <guid isPermaLink="true"/> <pubDate/> </item>
//!     ...
//!   </channel>
//! </rss>
//! ```
//!
//! Items are written in the order given; [`write_document`] passes them newest
//! first. The file is replaced atomically so a failed run never leaves a
//! truncated feed behind.

use crate::errors::FeedError;
#[cfg(test)]
use crate::models::CandidateItem;
use crate::models::{FeedDocument, FeedMetadata, NewsItem};
use crate::utils::ensure_parent_dir;
#[cfg(test)]
use crate::validate::validate;
#[cfg(test)]
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const RSS_DOCS: &str = "https://www.rssboard.org/rss-specification";

fn xml_error(e: impl std::fmt::Display) -> FeedError {
    FeedError::Xml(e.to_string())
}

/// Drop characters that are not allowed in XML 1.0 text.
fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .filter(|&c| match c {
            '\t' | '\n' | '\r' => true,
            '\u{FFFE}' | '\u{FFFF}' => false,
            c => c >= '\u{20}',
        })
        .collect()
}

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<(), FeedError> {
    let text = sanitize_text(text);
    w.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)?;
    w.write_event(Event::Text(BytesText::new(&text))).map_err(xml_error)?;
    w.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)?;
    Ok(())
}

/// Serialize `items` and channel `metadata` into an RSS 2.0 document.
pub fn serialize(items: &[NewsItem], metadata: &FeedMetadata) -> Result<Vec<u8>, FeedError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    writer.write_event(Event::Start(rss)).map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .map_err(xml_error)?;

    write_text_element(&mut writer, "title", &metadata.title)?;
    write_text_element(&mut writer, "link", &metadata.link)?;
    write_text_element(&mut writer, "description", &metadata.description)?;
    if let Some(self_url) = &metadata.self_url {
        let mut atom_link = BytesStart::new("atom:link");
        atom_link.push_attribute(("href", self_url.as_str()));
        atom_link.push_attribute(("rel", "self"));
        atom_link.push_attribute(("type", "application/rss+xml"));
        writer.write_event(Event::Empty(atom_link)).map_err(xml_error)?;
    }
    write_text_element(&mut writer, "docs", RSS_DOCS)?;
    write_text_element(&mut writer, "generator", &metadata.generator)?;
    write_text_element(&mut writer, "lastBuildDate", &metadata.last_build.to_rfc2822())?;

    for item in items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(xml_error)?;
        write_text_element(&mut writer, "title", item.title())?;
        write_text_element(&mut writer, "link", item.link().as_str())?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        writer.write_event(Event::Start(guid)).map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(item.link().as_str())))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .map_err(xml_error)?;

        write_text_element(&mut writer, "pubDate", &item.date().to_rfc2822())?;
        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .map_err(xml_error)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
fn child<'a, 'input>(node: roxmltree::Node<'a, 'input>, name: &str) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().namespace().is_none() && n.tag_name().name() == name)
}

#[cfg(test)]
fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> String {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
fn parse_rfc2822(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read an RSS 2.0 document back into a [`FeedDocument`].
///
/// Every item goes through the same validation as scraped items. Only the
/// round-trip tests read feeds back, so this is compiled for tests alone.
#[cfg(test)]
pub fn parse(bytes: &[u8]) -> Result<FeedDocument, FeedError> {
    let text = std::str::from_utf8(bytes).map_err(|e| FeedError::Feed(format!("not UTF-8: {e}")))?;
    let doc = roxmltree::Document::parse(text).map_err(|e| FeedError::Feed(e.to_string()))?;

    let rss = doc.root_element();
    if rss.tag_name().name() != "rss" {
        return Err(FeedError::Feed(format!(
            "root element is <{}>, expected <rss>",
            rss.tag_name().name()
        )));
    }
    let channel = child(rss, "channel").ok_or_else(|| FeedError::Feed("missing <channel>".to_string()))?;

    let metadata = FeedMetadata {
        title: child_text(channel, "title"),
        description: child_text(channel, "description"),
        link: child_text(channel, "link"),
        self_url: channel
            .children()
            .find(|n| n.has_tag_name((ATOM_NS, "link")))
            .and_then(|n| n.attribute("href"))
            .map(str::to_string),
        generator: child_text(channel, "generator"),
        last_build: parse_rfc2822(&child_text(channel, "lastBuildDate")).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    };

    let items = channel
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "item")
        .enumerate()
        .map(|(index, node)| {
            let candidate = CandidateItem {
                title: child_text(node, "title"),
                link: child_text(node, "link"),
                date: parse_rfc2822(&child_text(node, "pubDate")),
            };
            validate(candidate).map_err(|e| FeedError::Feed(format!("item {index}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeedDocument::new(metadata, items))
}

fn temp_sibling(path: &Path) -> Result<PathBuf, FeedError> {
    let name = path.file_name().ok_or_else(|| {
        FeedError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name"),
        )
    })?;
    Ok(path.with_file_name(format!(".{}.tmp", name.to_string_lossy())))
}

/// Replace the file at `path` with `bytes`.
///
/// The bytes go to a temporary sibling first and are renamed into place, so
/// readers see either the old feed or the new one.
#[instrument(level = "debug", skip(bytes), fields(bytes = bytes.len()))]
pub async fn write(bytes: &[u8], path: &Path) -> Result<(), FeedError> {
    ensure_parent_dir(path).await?;
    let tmp = temp_sibling(path)?;

    if let Err(e) = fs::write(&tmp, bytes).await {
        discard_temp(&tmp).await;
        return Err(FeedError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        discard_temp(&tmp).await;
        return Err(FeedError::io(path, e));
    }
    Ok(())
}

async fn discard_temp(tmp: &Path) {
    match fs::remove_file(tmp).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            warn!(path = %tmp.display(), error = %e, "Failed to remove temporary feed file");
        }
        _ => {}
    }
}

/// Serialize a document and write it to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_document(document: &FeedDocument, path: &Path) -> Result<(), FeedError> {
    let bytes = serialize(document.items(), document.metadata())?;
    write(&bytes, path).await?;
    info!(
        path = %path.display(),
        items = document.items().len(),
        title = %document.metadata().title,
        "Feed saved"
    );
    Ok(())
}
