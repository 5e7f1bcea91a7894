//! Sitemap XML parsing

use quick_xml::events::Event;
use quick_xml::Reader;

/// Well-known sitemap locations, tried in order
pub const SITEMAP_SEEDS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/product-sitemap.xml"];

/// `<loc>` entries of one sitemap document, split by parent element
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    /// `<sitemap><loc>` entries of a sitemap index
    pub child_sitemaps: Vec<String>,
    /// `<url><loc>` entries of a URL set
    pub page_urls: Vec<String>,
}

impl SitemapDocument {
    /// Child sitemaps worth descending into (their URL mentions "product")
    pub fn product_children(&self) -> impl Iterator<Item = &String> {
        self.child_sitemaps
            .iter()
            .filter(|loc| loc.to_lowercase().contains("product"))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Parent {
    None,
    Sitemap,
    Url,
}

/// Parses a sitemap or sitemap index
///
/// Namespace prefixes are ignored. A `<loc>` outside `<sitemap>`/`<url>` is
/// not collected.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut document = SitemapDocument::default();
    let mut parent = Parent::None;
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemap" => parent = Parent::Sitemap,
                b"url" => parent = Parent::Url,
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"sitemap" | b"url" => parent = Parent::None,
                b"loc" => in_loc = false,
                _ => {}
            },
            Event::Text(t) if in_loc => {
                let loc = t.unescape()?.trim().to_string();
                if loc.is_empty() {
                    continue;
                }
                match parent {
                    Parent::Sitemap => document.child_sitemaps.push(loc),
                    Parent::Url => document.page_urls.push(loc),
                    Parent::None => {}
                }
            }
            Event::CData(t) if in_loc => {
                let loc = String::from_utf8_lossy(&t).trim().to_string();
                match parent {
                    Parent::Sitemap => document.child_sitemaps.push(loc),
                    Parent::Url => document.page_urls.push(loc),
                    Parent::None => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(document)
}
