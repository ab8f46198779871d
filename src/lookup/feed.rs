//! RSS 2.0 / Atom feed parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::compile_regex_unsafe;

/// One entry of a syndication feed, with markup and entities already decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published: Option<String>,
}

/// Turns a feed document into its entries.
///
/// Parsing is lenient: a document that is not a feed yields no entries.
pub trait FeedParser: Send + Sync {
    fn parse(&self, document: &str) -> Vec<FeedEntry>;
}

// Patterns for the feed subset parsed below
const ITEM_PATTERN: &str = r"(?is)<(item|entry)\b[^>]*>(.*?)</(?:item|entry)\s*>";
const CDATA_PATTERN: &str = r"(?s)<!\[CDATA\[(.*?)\]\]>";
const TAG_PATTERN: &str = r"(?s)<[^>]*>";
const ATOM_LINK_PATTERN: &str = r"(?is)<link\b([^>]*?)/?>";
const HREF_PATTERN: &str = r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#;
const REL_PATTERN: &str = r#"(?i)\brel\s*=\s*["']([^"']*)["']"#;
const ENTITY_PATTERN: &str = r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);";

static ITEM: LazyLock<Regex> = LazyLock::new(|| compile_regex_unsafe(ITEM_PATTERN, "ITEM"));
static CDATA: LazyLock<Regex> = LazyLock::new(|| compile_regex_unsafe(CDATA_PATTERN, "CDATA"));
static TAG: LazyLock<Regex> = LazyLock::new(|| compile_regex_unsafe(TAG_PATTERN, "TAG"));
static ATOM_LINK: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(ATOM_LINK_PATTERN, "ATOM_LINK"));
static HREF: LazyLock<Regex> = LazyLock::new(|| compile_regex_unsafe(HREF_PATTERN, "HREF"));
static REL: LazyLock<Regex> = LazyLock::new(|| compile_regex_unsafe(REL_PATTERN, "REL"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| compile_regex_unsafe(ENTITY_PATTERN, "ENTITY"));

// Elements read from an entry body, in order of preference
const TITLE_TAGS: &[&str] = &["title"];
const SUMMARY_TAGS: &[&str] = &["description", "summary", "content:encoded", "content"];
const PUBLISHED_TAGS: &[&str] = &["pubDate", "published", "updated", "dc:date"];
const LINK_TAGS: &[&str] = &["link"];

static TITLE: LazyLock<Vec<Regex>> = LazyLock::new(|| element_patterns(TITLE_TAGS));
static SUMMARY: LazyLock<Vec<Regex>> = LazyLock::new(|| element_patterns(SUMMARY_TAGS));
static PUBLISHED: LazyLock<Vec<Regex>> = LazyLock::new(|| element_patterns(PUBLISHED_TAGS));
static LINK: LazyLock<Vec<Regex>> = LazyLock::new(|| element_patterns(LINK_TAGS));

fn element_patterns(tags: &[&str]) -> Vec<Regex> {
    tags.iter()
        .map(|tag| {
            let pattern = format!(r"(?is)<{0}\b[^>]*>(.*?)</{0}\s*>", regex::escape(tag));
            compile_regex_unsafe(&pattern, tag)
        })
        .collect()
}

/// Regex-driven [`FeedParser`] covering the subset of RSS and Atom that news
/// sites actually publish: `<item>`/`<entry>` blocks with title, link,
/// description/summary/content and a publication date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFeedParser;

impl FeedParser for SimpleFeedParser {
    fn parse(&self, document: &str) -> Vec<FeedEntry> {
        ITEM.captures_iter(document)
            .map(|caps| {
                let body = caps.get(2).map_or("", |m| m.as_str());
                FeedEntry {
                    title: first_text(body, &TITLE).unwrap_or_default(),
                    summary: first_text(body, &SUMMARY).unwrap_or_default(),
                    link: entry_link(body).unwrap_or_default(),
                    published: first_text(body, &PUBLISHED),
                }
            })
            .collect()
    }
}

/// Text content of the first non-empty element matched by `elements`.
fn first_text(body: &str, elements: &[Regex]) -> Option<String> {
    elements.iter().find_map(|re| {
        let raw = re.captures(body)?.get(1)?.as_str();
        let text = clean_text(raw);
        (!text.is_empty()).then_some(text)
    })
}

/// RSS carries the link as element text, Atom as an `href` attribute.
fn entry_link(body: &str) -> Option<String> {
    if let Some(text) = first_text(body, &LINK) {
        return Some(text);
    }
    let mut fallback = None;
    for caps in ATOM_LINK.captures_iter(body) {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let Some(href) = HREF.captures(attrs).and_then(|c| c.get(1)) else {
            continue;
        };
        let href = decode_entities(href.as_str().trim());
        let rel = REL.captures(attrs).and_then(|c| c.get(1)).map(|m| m.as_str());
        match rel {
            None | Some("alternate") => return Some(href),
            Some(_) if fallback.is_none() => fallback = Some(href),
            Some(_) => {}
        }
    }
    fallback
}

/// Unwraps CDATA, drops markup, decodes entities and collapses whitespace.
fn clean_text(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    // Escaped HTML inside descriptions decodes to markup, so strip twice.
    let stripped = TAG.replace_all(&unwrapped, " ");
    let decoded = decode_entities(&stripped);
    let stripped = TAG.replace_all(&decoded, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
