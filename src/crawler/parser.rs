//! Page decoder for the basic mobile site
//!
//! This module turns one fetched page into structured data:
//! - Post metadata from the page's structured-data script block
//! - Comment and reply batches from the page's comment containers
//! - "See more" pagination links for comments and replies
//! - Story links from the listing page
//!
//! The comment container class is regenerated by the site on every render, so
//! it is rediscovered on each call from the page's inline stylesheet. That
//! heuristic is confined to [`container_class`].

use crate::post::{Author, Comment, PostMetadata, Reply};
use crate::state::ThreadKind;
use crate::url::{collect_story_urls, resolve_link, MBASIC_URL, W3_BASE_URL};
use crate::ScrapeError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Strips leftover tags and HTML entities from author names
static CLEANR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<.*?>|&([a-z0-9]+|#[0-9]{1,6}|#x[0-9a-f]{1,6});")
        .expect("hardcoded regex pattern is valid")
});

static CSS_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("hardcoded regex pattern is valid"));

static CSS_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").expect("hardcoded regex pattern is valid"));

/// Declaration block (whitespace removed) marking the comment container rule
const CONTAINER_DECLARATION: &str = "padding:4px";

/// Errors produced while decoding a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The post's structured-data block is missing or unusable
    #[error("{0}")]
    BadPost(String),

    /// The markup no longer has the structure the decoder expects
    #[error("{0}")]
    Source(String),
}

impl DecodeError {
    /// Attaches the page URL, producing the crate-level error
    pub fn at(self, url: &Url) -> ScrapeError {
        match self {
            Self::BadPost(reason) => ScrapeError::BadPost {
                url: url.to_string(),
                reason,
            },
            Self::Source(reason) => ScrapeError::Source(format!("{} at {}", reason, url)),
        }
    }
}

/// Extracts structured data from fetched page content
///
/// Implementations must be pure functions of their input: decoding the same
/// content twice yields the same result.
pub trait PageDecoder: Send + Sync {
    /// Decodes the post's own metadata
    fn decode_post_metadata(&self, html: &str) -> Result<PostMetadata, DecodeError>;

    /// Decodes the comments rendered on a post page
    fn decode_comment_batch(&self, html: &str, post_id: &str) -> Result<Vec<Comment>, DecodeError>;

    /// Decodes the replies rendered on a comment's replies page
    fn decode_reply_batch(&self, html: &str) -> Result<Vec<Reply>, DecodeError>;

    /// Finds the link to the next page of children for an anchor
    ///
    /// `anchor_id` is the post id for comments and the comment identifier for
    /// replies. None means the anchor has no further pages.
    fn decode_next_link(&self, html: &str, anchor_id: &str, kind: ThreadKind) -> Option<Url>;

    /// Collects unique post URLs from a page listing
    fn decode_story_links(&self, html: &str) -> Vec<Url>;
}

/// Decoder for the basic mobile site's markup
#[derive(Debug, Clone, Copy, Default)]
pub struct MbasicDecoder;

impl MbasicDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl PageDecoder for MbasicDecoder {
    fn decode_post_metadata(&self, html: &str) -> Result<PostMetadata, DecodeError> {
        let document = Html::parse_document(html);
        let block = structured_data_block(&document)?;
        parse_post_metadata(&block)
    }

    fn decode_comment_batch(&self, html: &str, post_id: &str) -> Result<Vec<Comment>, DecodeError> {
        let document = Html::parse_document(html);
        let class = container_class(&document)?;
        filter_containers(&document, &class)?
            .into_iter()
            .map(|container| parse_comment(container, post_id))
            .collect()
    }

    fn decode_reply_batch(&self, html: &str) -> Result<Vec<Reply>, DecodeError> {
        let document = Html::parse_document(html);
        let class = container_class(&document)?;
        filter_containers(&document, &class)?
            .into_iter()
            .map(parse_reply)
            .collect()
    }

    fn decode_next_link(&self, html: &str, anchor_id: &str, kind: ThreadKind) -> Option<Url> {
        let document = Html::parse_document(html);
        let id = match kind {
            ThreadKind::Comments => format!("see_next_{}", anchor_id),
            ThreadKind::Replies => format!("comment_replies_more_1:{}", anchor_id),
        };
        let root = document.root_element();
        let element = find_div_by_id(root, &id)?;
        let href = first_descendant(element, "a")?.value().attr("href")?;
        resolve_link(MBASIC_URL, href)
    }

    fn decode_story_links(&self, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        collect_story_urls(
            document
                .select(&anchor)
                .filter_map(|element| element.value().attr("href")),
        )
    }
}

/// Returns the JSON text of the page's structured-data block
///
/// The `application/ld+json` script is preferred; otherwise the first script
/// on the page is used. Everything before the first `{` is stripped.
fn structured_data_block(document: &Html) -> Result<String, DecodeError> {
    let mut script = None;
    if let Ok(ld_json) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        script = document.select(&ld_json).next();
    }
    if script.is_none() {
        let any = selector("script")?;
        script = document.select(&any).next();
    }

    let script = script.ok_or_else(|| {
        DecodeError::BadPost("page source doesn't contain a <script> element".to_string())
    })?;
    let text: String = script.text().collect();
    let start = text.find('{').ok_or_else(|| {
        DecodeError::BadPost("structured-data block holds no JSON object".to_string())
    })?;
    Ok(text[start..].to_string())
}

/// Parses the structured-data JSON into post metadata
fn parse_post_metadata(block: &str) -> Result<PostMetadata, DecodeError> {
    // Anything after the object (closing markup, trailing statements) is ignored
    let metadata: Value = serde_json::Deserializer::from_str(block)
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| DecodeError::BadPost("structured-data block is empty".to_string()))?
        .map_err(|e| DecodeError::BadPost(format!("structured-data block is not JSON: {}", e)))?;

    let identifier = string_field(&metadata, "identifier")
        .ok_or_else(|| DecodeError::BadPost("metadata has no identifier".to_string()))?;
    let comment_count = metadata
        .get("commentCount")
        .and_then(as_count)
        .ok_or_else(|| DecodeError::BadPost("metadata has no commentCount".to_string()))?;

    let statistics = metadata
        .get("interactionStatistic")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let like_count = interaction_count(statistics, "LikeAction", 1)
        .ok_or_else(|| DecodeError::BadPost("metadata has no like count".to_string()))?;
    let share_count = interaction_count(statistics, "ShareAction", 2)
        .ok_or_else(|| DecodeError::BadPost("metadata has no share count".to_string()))?;

    let parsed = PostMetadata {
        identifier,
        created_time: string_field(&metadata, "dateCreated").unwrap_or_default(),
        text: string_field(&metadata, "articleBody").unwrap_or_default(),
        url: string_field(&metadata, "url").unwrap_or_default(),
        like_count,
        share_count,
        comment_count,
        author: metadata.get("author").map(parse_author).unwrap_or_default(),
    };

    if parsed.post_id().is_none() {
        return Err(DecodeError::BadPost(format!(
            "identifier '{}' has no post id segment",
            parsed.identifier
        )));
    }

    Ok(parsed)
}

/// Finds an interaction count by type, falling back to its usual position
fn interaction_count(statistics: &[Value], action: &str, position: usize) -> Option<u64> {
    let typed = statistics.iter().find(|stat| {
        stat.get("interactionType")
            .map(|kind| kind.to_string().contains(action))
            .unwrap_or(false)
    });

    typed
        .or_else(|| statistics.get(position))
        .and_then(|stat| stat.get("userInteractionCount"))
        .and_then(as_count)
}

fn parse_author(value: &Value) -> Author {
    let value = match value {
        Value::Array(items) => items.first().unwrap_or(value),
        _ => value,
    };
    Author {
        name: string_field(value, "name").unwrap_or_default(),
        url: string_field(value, "url").unwrap_or_default(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Derives the class currently naming comment/reply containers
///
/// Scans the document's first `<style>` element for rules whose declaration
/// block is exactly a 4px padding; the last such selector wins and its last
/// two characters are the class name. Later style elements are ignored. No
/// such rule means the markup changed, which is reported as a source error
/// rather than an empty page.
pub fn container_class(document: &Html) -> Result<String, DecodeError> {
    let style = selector("style")?;
    let mut last_selector = None;

    if let Some(element) = document.select(&style).next() {
        let css: String = element.text().collect();
        let css = CSS_COMMENT.replace_all(&css, "");
        for rule in CSS_RULE.captures_iter(&css) {
            let declaration: String = rule[2]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .trim_end_matches(';')
                .to_ascii_lowercase();
            if declaration == CONTAINER_DECLARATION {
                last_selector = Some(rule[1].trim().to_string());
            }
        }
    }

    let selector_text = last_selector.ok_or_else(|| {
        DecodeError::Source("no stylesheet rule with a 4px padding declaration".to_string())
    })?;

    let chars: Vec<char> = selector_text.chars().collect();
    if chars.len() < 2 {
        return Err(DecodeError::Source(format!(
            "container selector '{}' is too short to name a class",
            selector_text
        )));
    }
    let class: String = chars[chars.len() - 2..].iter().collect();
    if !class
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DecodeError::Source(format!(
            "container selector '{}' does not end in a class name",
            selector_text
        )));
    }

    Ok(class)
}

/// Returns the divs carrying exactly one class, equal to `class`
///
/// Elements with additional classes share the name but are decorative.
pub fn filter_containers<'a>(
    document: &'a Html,
    class: &str,
) -> Result<Vec<ElementRef<'a>>, DecodeError> {
    let div = selector("div")?;
    Ok(document
        .select(&div)
        .filter(|element| {
            let mut classes = element.value().classes();
            classes.next() == Some(class) && classes.next().is_none()
        })
        .collect())
}

fn parse_comment(container: ElementRef<'_>, post_id: &str) -> Result<Comment, DecodeError> {
    let element_id = container.value().attr("id").ok_or_else(|| {
        DecodeError::Source("comment container has no id attribute".to_string())
    })?;
    let identifier = format!("{}_{}", post_id, element_id);
    let (author, text) = parse_author_and_text(container)?;
    let replies_link = replies_link(container, &identifier).map(String::from);

    Ok(Comment {
        identifier,
        author,
        text,
        replies_link,
        replies: Vec::new(),
    })
}

fn parse_reply(container: ElementRef<'_>) -> Result<Reply, DecodeError> {
    let (author, text) = parse_author_and_text(container)?;
    Ok(Reply { author, text })
}

/// Reads the author heading and body text shared by comments and replies
fn parse_author_and_text(container: ElementRef<'_>) -> Result<(Author, String), DecodeError> {
    let inner = first_descendant(container, "div")
        .ok_or_else(|| DecodeError::Source("comment container has no inner div".to_string()))?;
    let heading = first_descendant(inner, "h3")
        .ok_or_else(|| DecodeError::Source("comment has no author heading".to_string()))?;
    let href = first_descendant(heading, "a")
        .and_then(|link| link.value().attr("href"))
        .ok_or_else(|| DecodeError::Source("comment author has no profile link".to_string()))?;
    let url = resolve_link(W3_BASE_URL, href).ok_or_else(|| {
        DecodeError::Source(format!("comment author link '{}' is not resolvable", href))
    })?;

    let raw_name: String = heading.text().collect();
    let author = Author {
        name: CLEANR.replace_all(&raw_name, "").into_owned(),
        url: url.to_string(),
    };
    let text = first_descendant(inner, "div")
        .map(|body| body.text().collect())
        .ok_or_else(|| DecodeError::Source("comment has no body".to_string()))?;

    Ok((author, text))
}

/// Link to the first replies page of a comment, if it has replies
fn replies_link(container: ElementRef<'_>, identifier: &str) -> Option<Url> {
    let id = format!("comment_replies_more_1:{}", identifier);
    let element = find_div_by_id(container, &id)?;
    let inner = first_descendant(element, "div")?;
    let href = first_descendant(inner, "a")?.value().attr("href")?;
    resolve_link(MBASIC_URL, href)
}

/// Finds a descendant div by id without going through a CSS selector
///
/// Ids here contain `:`, which would need escaping in selector syntax.
fn find_div_by_id<'a>(scope: ElementRef<'a>, id: &str) -> Option<ElementRef<'a>> {
    let div = Selector::parse("div").ok()?;
    let found = scope
        .select(&div)
        .find(|element| element.value().attr("id") == Some(id));
    found
}

fn first_descendant<'a>(scope: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let tag_selector = Selector::parse(tag).ok()?;
    let found = scope.select(&tag_selector).next();
    found
}

fn selector(css: &str) -> Result<Selector, DecodeError> {
    Selector::parse(css)
        .map_err(|e| DecodeError::Source(format!("invalid selector '{}': {:?}", css, e)))
}
