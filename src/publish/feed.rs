//! Podcast RSS rendering.

use crate::assemble::Episode;
use crate::config::SiteSettings;
use crate::error::{NewscastError, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const PODCAST_NS: &str = "https://podcastindex.org/namespace/1.0";

fn xml_error(e: impl std::fmt::Display) -> NewscastError {
    NewscastError::Publish(format!("XML write failed: {}", e))
}

struct FeedWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl FeedWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn start(&mut self, tag: BytesStart<'_>) -> Result<()> {
        self.event(Event::Start(tag))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut tag = BytesStart::new(name);
        for attr in attrs {
            tag.push_attribute(*attr);
        }
        self.event(Event::Empty(tag))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(BytesStart::new(name))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn cdata_element(&mut self, name: &str, content: &str) -> Result<()> {
        self.start(BytesStart::new(name))?;
        let safe = content.replace("]]>", "]]]]><![CDATA[>");
        self.event(Event::CData(BytesCData::new(safe.as_str())))?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner().into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(xml_error)
    }
}

/// Render an RSS 2.0 podcast feed over `episodes`, in the given order.
pub fn render_rss(site: &SiteSettings, episodes: &[Episode], feed_url: &str) -> Result<String> {
    let mut w = FeedWriter::new();
    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:itunes", ITUNES_NS));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    rss.push_attribute(("xmlns:podcast", PODCAST_NS));
    w.start(rss)?;
    w.start(BytesStart::new("channel"))?;

    w.text_element("title", &site.title)?;
    w.text_element("link", &site.link)?;
    w.text_element("description", &site.description)?;
    w.text_element("language", &site.language)?;
    w.empty(
        "atom:link",
        &[("href", feed_url), ("rel", "self"), ("type", "application/rss+xml")],
    )?;
    w.text_element("itunes:author", &site.author)?;
    w.start(BytesStart::new("itunes:owner"))?;
    w.text_element("itunes:name", &site.owner_name)?;
    w.text_element("itunes:email", &site.owner_email)?;
    w.end("itunes:owner")?;

    if !site.image_url.is_empty() {
        w.empty("itunes:image", &[("href", &site.image_url)])?;
        w.start(BytesStart::new("image"))?;
        w.text_element("url", &site.image_url)?;
        w.text_element("title", &site.title)?;
        w.text_element("link", &site.link)?;
        w.end("image")?;
    }

    for episode in episodes {
        write_item(&mut w, episode)?;
    }

    w.end("channel")?;
    w.end("rss")?;
    w.finish()
}

fn write_item(w: &mut FeedWriter, episode: &Episode) -> Result<()> {
    w.start(BytesStart::new("item"))?;
    w.text_element("title", &episode.title)?;
    w.text_element("link", &episode.link)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    w.start(guid)?;
    w.event(Event::Text(BytesText::new(&episode.id)))?;
    w.end("guid")?;

    w.text_element("pubDate", &episode.pub_date.to_rfc2822())?;

    if let Some(audio_url) = episode.audio_url.as_deref().filter(|u| !u.is_empty()) {
        let length = episode.audio_bytes.to_string();
        w.empty(
            "enclosure",
            &[("url", audio_url), ("length", &length), ("type", "audio/mpeg")],
        )?;
    }
    if let Some(transcript_url) = episode.transcript_url.as_deref().filter(|u| !u.is_empty()) {
        w.empty(
            "podcast:transcript",
            &[("url", transcript_url), ("type", "text/plain")],
        )?;
    }

    w.cdata_element("description", &episode.description_html)?;
    w.end("item")
}
