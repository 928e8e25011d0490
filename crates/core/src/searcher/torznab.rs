//! Best-effort Torznab XML extraction.
//!
//! Indexers behind a metasearch provider emit inconsistent and sometimes
//! invalid XML, so documents are never parsed as a whole. Each `<item>` or
//! `<indexer>` block is located and scanned on its own; a block that yields
//! nothing useful is skipped and the rest of the document is unaffected.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::BTreeMap;

use super::{Enclosure, Indexer, RawItem, TorznabAttrs};

static INDEXER_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<indexer\b[^>]*?\bid="([^"]+)"[^>]*>(.*?)</indexer>"#).unwrap()
});
static ITEM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<item(?:\s[^>]*)?>(.*?)</item>").unwrap());
static ROOT_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(?:<\?xml[^>]*\?>\s*)?<error\b([^>]*)>").unwrap()
});

static SIZE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<size>\s*(\d+)\s*</size>").unwrap());
static TORZNAB_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<torznab:attr\b([^>]*)>").unwrap());
static ENCLOSURE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<enclosure\b([^>]*)>").unwrap());
static CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<category>(.*?)</category>").unwrap());

static NAME_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bname="([^"]*)""#).unwrap());
static VALUE_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bvalue="([^"]*)""#).unwrap());
static URL_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\burl="([^"]*)""#).unwrap());
static TYPE_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\btype="([^"]*)""#).unwrap());
static CODE_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\bcode="([^"]*)""#).unwrap());
static DESCRIPTION_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bdescription="([^"]*)""#).unwrap());

static TITLE: Lazy<TagPattern> = Lazy::new(|| TagPattern::new("title"));
static GUID: Lazy<TagPattern> = Lazy::new(|| TagPattern::new("guid"));
static LINK: Lazy<TagPattern> = Lazy::new(|| TagPattern::new("link"));
static COMMENTS: Lazy<TagPattern> = Lazy::new(|| TagPattern::new("comments"));
static PUB_DATE: Lazy<TagPattern> = Lazy::new(|| TagPattern::new("pubDate"));
static DESCRIPTION: Lazy<TagPattern> = Lazy::new(|| TagPattern::new("description"));

/// Text content of a simple element, in either `<tag><![CDATA[x]]></tag>`
/// or `<tag>x</tag>` form. The CDATA form wins when both are present.
struct TagPattern {
    cdata: Regex,
    plain: Regex,
}

impl TagPattern {
    fn new(tag: &str) -> Self {
        Self {
            cdata: Regex::new(&format!(
                r"(?is)<{tag}(?:\s[^>/]*)?>\s*<!\[CDATA\[(.*?)\]\]>\s*</{tag}>"
            ))
            .unwrap(),
            plain: Regex::new(&format!(r"(?is)<{tag}(?:\s[^>/]*)?>(.*?)</{tag}>")).unwrap(),
        }
    }

    fn extract(&self, block: &str) -> Option<String> {
        first_capture(&self.cdata, block).or_else(|| {
            first_capture(&self.plain, block)
                .map(|text| strip_cdata(&text).to_string())
                .filter(|text| !text.is_empty())
        })
    }
}

/// A `<error code=".." description=".."/>` document returned instead of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorznabError {
    pub code: Option<String>,
    pub description: String,
}

/// Detect a Torznab error document.
///
/// Only a root-level `<error>` element counts; an `<error>` string inside an
/// item description does not.
pub fn extract_error(xml: &str) -> Option<TorznabError> {
    let caps = ROOT_ERROR.captures(xml)?;
    let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    Some(TorznabError {
        code: first_capture(&CODE_ATTR, attrs),
        description: first_capture(&DESCRIPTION_ATTR, attrs)
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}

/// Extract the indexer list from a `t=indexers` response.
pub fn extract_indexers(xml: &str) -> Vec<Indexer> {
    INDEXER_BLOCK
        .captures_iter(xml)
        .filter_map(|caps| {
            let id = caps.get(1)?.as_str().trim();
            if id.is_empty() {
                return None;
            }
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            Some(Indexer {
                id: id.to_string(),
                name: TITLE.extract(inner).unwrap_or_else(|| id.to_string()),
                description: DESCRIPTION.extract(inner).unwrap_or_default(),
            })
        })
        .collect()
}

/// Extract every titled `<item>` of a search feed.
pub fn extract_items(xml: &str) -> Vec<RawItem> {
    ITEM_BLOCK
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .filter_map(|block| parse_item(block.as_str()))
        .collect()
}

/// Integer count, also accepting numeric forms like `3.0`.
fn parse_count(value: &str) -> Option<u32> {
    let value = value.trim();
    value.parse::<u32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n.min(u32::MAX as f64) as u32)
    })
}

/// Parse one item block. Returns `None` when the item has no title.
fn parse_item(block: &str) -> Option<RawItem> {
    let title = TITLE.extract(block)?;

    let attr_pairs = torznab_attr_pairs(block);
    let category_attr: Vec<String> = attr_pairs
        .iter()
        .filter(|(name, value)| name.eq_ignore_ascii_case("category") && !value.is_empty())
        .map(|(_, value)| value.clone())
        .collect();
    let attrs: BTreeMap<String, String> = attr_pairs.into_iter().collect();

    let link = LINK.extract(block);
    let enclosure = parse_enclosure(block);

    let size = first_capture(&SIZE_TAG, block)
        .and_then(|s| s.parse::<u64>().ok())
        .or_else(|| attrs.get("size").and_then(|s| s.trim().parse::<u64>().ok()));
    let seeders = attrs.get("seeders").and_then(|s| parse_count(s));
    let peers = attrs.get("peers").and_then(|s| parse_count(s));

    let magnet = link
        .as_deref()
        .filter(|l| is_magnet(l))
        .or_else(|| attrs.get("magneturl").map(String::as_str).filter(|m| is_magnet(m)))
        .map(str::to_string);

    // A magnet makes the plain link irrelevant as a download source.
    let has_magnet = magnet.is_some();
    let torrent_url = enclosure
        .as_ref()
        .and_then(|e| e.url.clone())
        .or_else(|| {
            if has_magnet {
                None
            } else {
                link.clone().filter(|l| is_http(l))
            }
        });

    let categories = CATEGORY
        .captures_iter(block)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    Some(RawItem {
        title: Some(title),
        guid: GUID.extract(block),
        link,
        comments: COMMENTS.extract(block),
        pub_date: PUB_DATE.extract(block),
        description: DESCRIPTION.extract(block),
        magnet,
        enclosure,
        torrent_url,
        size,
        seeders,
        peers,
        torznab: TorznabAttrs { attrs },
        categories,
        category_attr,
    })
}

/// All `torznab:attr` name/value pairs in document order.
fn torznab_attr_pairs(block: &str) -> Vec<(String, String)> {
    TORZNAB_ATTR
        .captures_iter(block)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            let name = NAME_ATTR.captures(attrs)?.get(1)?.as_str().trim().to_string();
            let value = VALUE_ATTR.captures(attrs)?.get(1)?.as_str().to_string();
            if name.is_empty() {
                return None;
            }
            Some((name, value))
        })
        .collect()
}

fn parse_enclosure(block: &str) -> Option<Enclosure> {
    let attrs = ENCLOSURE.captures(block)?.get(1)?.as_str();
    let url = first_capture(&URL_ATTR, attrs)?;
    Some(Enclosure {
        url: Some(url),
        mime_type: first_capture(&TYPE_ATTR, attrs),
    })
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn strip_cdata(text: &str) -> &str {
    text.strip_prefix("<![CDATA[")
        .and_then(|t| t.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(text)
}

fn is_magnet(s: &str) -> bool {
    s.get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("magnet:?"))
}

fn is_http(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
