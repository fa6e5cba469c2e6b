//! Post ("story") link handling for the listing page
//!
//! The listing page repeats every story link several times (timestamp,
//! comment count, share button...). A story is identified by its
//! `story_fbid` and `id` query parameters, so links are deduplicated on that
//! pair and rewritten onto the basic mobile host.

use crate::url::MBASIC_URL;
use std::collections::HashSet;
use url::Url;

/// Relative path every story link starts with
pub const STORY_PATH_PREFIX: &str = "/story.php?";

/// Extracts the `(story_fbid, id)` pair from a story href
pub fn story_key(href: &str) -> Option<(String, String)> {
    if !href.starts_with(STORY_PATH_PREFIX) {
        return None;
    }

    let url = Url::parse(MBASIC_URL).ok()?.join(href).ok()?;
    let mut story_fbid = None;
    let mut id = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "story_fbid" if story_fbid.is_none() => story_fbid = Some(value.into_owned()),
            "id" if id.is_none() => id = Some(value.into_owned()),
            _ => {}
        }
    }

    Some((story_fbid?, id?))
}

/// Turns raw hrefs into unique basic-mobile post URLs, in first-seen order
pub fn collect_story_urls<'a, I>(hrefs: I) -> Vec<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for href in hrefs {
        let Some(key) = story_key(href) else {
            continue;
        };
        if !seen.insert(key.clone()) {
            continue;
        }

        let Ok(mut url) = Url::parse(MBASIC_URL) else {
            continue;
        };
        url.set_path("/story.php");
        url.query_pairs_mut()
            .append_pair("story_fbid", &key.0)
            .append_pair("id", &key.1);
        urls.push(url);
    }

    urls
}
