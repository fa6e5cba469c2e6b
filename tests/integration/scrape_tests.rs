//! Integration tests for the scraper
//!
//! These tests drive a full `Session` against a scripted in-memory fetcher
//! serving basic-mobile markup, and check what ends up in the dump.

use async_trait::async_trait;
use fbscrape::crawler::{Credentials, PageFetcher, ScrapeOptions, Session};
use fbscrape::output::convert_to_json;
use fbscrape::storage::{read_posts, FramedStore};
use fbscrape::{Post, Result, ScrapeError};
use std::collections::HashMap;
use tempfile::TempDir;
use url::Url;

const POST_URL: &str = "https://mbasic.facebook.com/story.php?story_fbid=555&id=111";
const STYLE: &str = ".x1{color:#000} .ab .zq{padding:4px}";

/// Serves pages from a map and records every navigation
#[derive(Default)]
struct ScriptedFetcher {
    pages: HashMap<String, String>,
    visits: Vec<String>,
    current: String,
    reject_login: bool,
}

impl ScriptedFetcher {
    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn login(&mut self, _credentials: &Credentials) -> Result<()> {
        if self.reject_login {
            return Err(ScrapeError::Login("login form shown again".to_string()));
        }
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<String> {
        self.visits.push(url.to_string());
        let html = self
            .pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ScrapeError::Browser(format!("net::ERR_FAILED at {}", url)))?;
        self.current = html.clone();
        Ok(html)
    }

    async fn scroll(&mut self, _times: u32) -> Result<()> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }
}

fn metadata_script(identifier: &str, comment_count: u64) -> String {
    format!(
        r#"<script type="application/ld+json">{{"@type":"SocialMediaPosting",
            "dateCreated":"2023-03-14T09:00:00-0700","articleBody":"Library closed Friday",
            "url":"https://www.facebook.com/townlibrary/posts/555",
            "author":{{"name":"Town Library","url":"https://www.facebook.com/townlibrary"}},
            "commentCount":{},"identifier":"{}",
            "interactionStatistic":[
                {{"interactionType":"http://schema.org/CommentAction","userInteractionCount":{}}},
                {{"interactionType":"http://schema.org/LikeAction","userInteractionCount":120}},
                {{"interactionType":"http://schema.org/ShareAction","userInteractionCount":4}}]}}</script>"#,
        comment_count, identifier, comment_count
    )
}

fn replies_href(comment: &str) -> String {
    format!("/comment/replies/?ctoken=555_{}", comment)
}

fn replies_url(comment: &str) -> String {
    format!("https://mbasic.facebook.com{}", replies_href(comment))
}

fn comment(id: &str, name: &str, text: &str, with_replies: bool) -> String {
    let replies = if with_replies {
        format!(
            r#"<div id="comment_replies_more_1:555_{}"><div><a href="{}">View replies</a></div></div>"#,
            id,
            replies_href(id)
        )
    } else {
        String::new()
    };
    format!(
        r#"<div class="zq" id="{id}"><div><h3><a href="/profile.php?id={id}">{name}</a></h3><div>{text}</div>{replies}</div></div>"#
    )
}

fn reply(name: &str, text: &str) -> String {
    format!(
        r#"<div class="zq"><div><h3><a href="/{name}">{name}</a></h3><div>{text}</div></div></div>"#
    )
}

fn see_next(page: u32) -> String {
    format!(
        r#"<div id="see_next_555"><a href="/story.php?story_fbid=555&amp;id=111&amp;p={}">See more comments</a></div>"#,
        page
    )
}

fn next_page_url(page: u32) -> String {
    format!("{}&p={}", POST_URL, page)
}

fn post_page(comment_count: u64, body: &str) -> String {
    format!(
        "<html><head>{}<style>{}</style></head><body><div class=\"zq extra\">decor</div>{}</body></html>",
        metadata_script("111;555", comment_count),
        STYLE,
        body
    )
}

fn thread_page(body: &str) -> String {
    format!(
        "<html><head><style>{}</style></head><body>{}</body></html>",
        STYLE, body
    )
}

/// Post with three comments; the second comment's replies page is unreachable
fn three_comment_fetcher() -> ScriptedFetcher {
    let body = [
        comment("c1", "Ann", "When does it reopen?", true),
        comment("c2", "Bo", "Thanks!", true),
        comment("c3", "Cy", "Noted", true),
    ]
    .concat();

    ScriptedFetcher::default()
        .page(POST_URL, post_page(3, &body))
        .page(
            &replies_url("c1"),
            thread_page(&[reply("Town", "Monday"), reply("Ann", "Great")].concat()),
        )
        .page(&replies_url("c3"), thread_page(&reply("Dee", "Same here")))
}

fn with_replies() -> ScrapeOptions {
    ScrapeOptions {
        comment_limit: None,
        fetch_replies: true,
        reply_limit: None,
    }
}

#[tokio::test]
async fn test_reply_failure_is_isolated_to_its_comment() {
    let mut session = Session::new(three_comment_fetcher());
    let mut store: Vec<Post> = Vec::new();

    let post = session
        .scrape_post(POST_URL, &mut store, &with_replies())
        .await
        .unwrap();

    assert_eq!(post.comments.len(), 3);
    let replies: Vec<usize> = post.comments.iter().map(|c| c.replies.len()).collect();
    assert_eq!(replies, vec![2, 0, 1]);
    assert_eq!(post.comments[0].replies[0].text, "Monday");
    assert_eq!(post.comments[2].replies[0].author.name, "Dee");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_scraped_post_is_persisted_and_exported() {
    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("posts.bin");
    let json = dir.path().join("posts.json");

    let mut session = Session::new(three_comment_fetcher());
    let mut store = FramedStore::new(&dump);
    let post = session
        .scrape_post(POST_URL, &mut store, &with_replies())
        .await
        .unwrap();

    assert_eq!(post.identifier, "111;555");
    assert_eq!(post.like_count, 120);
    assert_eq!(post.share_count, 4);
    assert_eq!(post.comment_count, 3);
    assert_eq!(post.author.name, "Town Library");
    assert_eq!(post.comments[0].identifier, "555_c1");
    assert_eq!(post.comments[0].author.url, "https://www.facebook.com/profile.php?id=c1");
    assert_eq!(
        post.comments[0].replies_link.as_deref(),
        Some(replies_url("c1").as_str())
    );

    let stored = read_posts(&dump).unwrap();
    assert_eq!(stored, vec![post.clone()]);

    assert_eq!(convert_to_json(&dump, &json).unwrap(), 1);
    let exported: Vec<Post> =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(exported, vec![post]);
}

#[tokio::test]
async fn test_replies_skipped_unless_requested() {
    let mut session = Session::new(three_comment_fetcher());
    let mut store: Vec<Post> = Vec::new();

    let post = session
        .scrape_post(POST_URL, &mut store, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(post.reply_total(), 0);
    assert_eq!(session.fetcher().visits, vec![POST_URL.to_string(); 2]);
}

#[tokio::test]
async fn test_comment_pages_followed_until_limit() {
    let fetcher = ScriptedFetcher::default()
        .page(
            POST_URL,
            post_page(
                6,
                &[comment("c1", "A", "1", false), comment("c2", "B", "2", false), see_next(1)].concat(),
            ),
        )
        .page(
            &next_page_url(1),
            thread_page(
                &[comment("c3", "C", "3", false), comment("c4", "D", "4", false), see_next(2)].concat(),
            ),
        )
        .page(
            &next_page_url(2),
            thread_page(&[comment("c5", "E", "5", false), comment("c6", "F", "6", false)].concat()),
        );

    let mut session = Session::new(fetcher);
    let mut store: Vec<Post> = Vec::new();
    let options = ScrapeOptions {
        comment_limit: Some(3),
        ..Default::default()
    };

    let post = session.scrape_post(POST_URL, &mut store, &options).await.unwrap();

    let texts: Vec<&str> = post.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["1", "2", "3"]);
    assert!(!session.fetcher().visits.contains(&next_page_url(2)));
}

#[tokio::test]
async fn test_comment_limit_capped_by_reported_count() {
    let fetcher = ScriptedFetcher::default().page(
        POST_URL,
        post_page(
            1,
            &[comment("c1", "A", "1", false), comment("c2", "B", "2", false), see_next(1)].concat(),
        ),
    );

    let mut session = Session::new(fetcher);
    let mut store: Vec<Post> = Vec::new();
    let post = session
        .scrape_post(POST_URL, &mut store, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(post.comments.len(), 1);
}

#[tokio::test]
async fn test_interrupted_comment_pagination_keeps_first_page() {
    // the "see more" page is never served
    let fetcher = ScriptedFetcher::default().page(
        POST_URL,
        post_page(10, &[comment("c1", "A", "1", false), see_next(1)].concat()),
    );

    let mut session = Session::new(fetcher);
    let mut store: Vec<Post> = Vec::new();
    let post = session
        .scrape_post(POST_URL, &mut store, &ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(post.comments.len(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_post_kept_when_comment_markup_unrecognized() {
    let page = format!(
        "<html><head>{}<style>.x1{{color:#000}}</style></head><body>{}</body></html>",
        metadata_script("111;555", 4),
        comment("c1", "A", "1", false)
    );
    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("posts.bin");
    let mut store = FramedStore::new(&dump);
    let mut session = Session::new(ScriptedFetcher::default().page(POST_URL, page));

    let post = session
        .scrape_post(POST_URL, &mut store, &with_replies())
        .await
        .unwrap();

    assert_eq!(post.identifier, "111;555");
    assert_eq!(post.comment_count, 4);
    assert!(post.comments.is_empty());
    assert_eq!(read_posts(&dump).unwrap(), vec![post]);
}

#[tokio::test]
async fn test_invalid_url_rejected_before_navigation() {
    let mut session = Session::new(ScriptedFetcher::default());
    let mut store: Vec<Post> = Vec::new();

    let result = session
        .scrape_post(
            "https://www.facebook.com/story.php?story_fbid=555&id=111",
            &mut store,
            &ScrapeOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(ScrapeError::InvalidUrl { .. })));
    assert!(session.fetcher().visits.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_page_without_metadata_is_bad_post() {
    let fetcher = ScriptedFetcher::default().page(POST_URL, thread_page(""));
    let mut session = Session::new(fetcher);
    let mut store: Vec<Post> = Vec::new();

    let result = session
        .scrape_post(POST_URL, &mut store, &ScrapeOptions::default())
        .await;

    match result {
        Err(ScrapeError::BadPost { url, .. }) => assert_eq!(url, POST_URL),
        other => panic!("expected BadPost, got {:?}", other),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_batch_continues_past_failed_posts() {
    let broken = "https://mbasic.facebook.com/story.php?story_fbid=999&id=111";
    let fetcher = three_comment_fetcher().page(broken, thread_page(""));

    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("posts.bin");
    let mut store = FramedStore::new(&dump);
    let mut session = Session::new(fetcher);

    let urls = [
        broken.to_string(),
        "https://example.com/not-a-post".to_string(),
        POST_URL.to_string(),
    ];
    let report = session.scrape_all(&urls, &mut store, &with_replies()).await;

    assert_eq!(report.scraped, 1);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].url, broken);
    assert_eq!(report.comments, 3);
    assert_eq!(report.replies, 3);
    assert_eq!(read_posts(&dump).unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_post_urls_deduplicates_stories() {
    let listing = r#"<html><body>
        <a href="/story.php?story_fbid=1&amp;id=111&amp;refid=17">Post</a>
        <a href="/story.php?story_fbid=1&amp;id=111&amp;refid=17&amp;_ft_=x">Comments</a>
        <a href="/townlibrary/photos">Photos</a>
        <a href="/story.php?story_fbid=2&amp;id=111">Post</a>
    </body></html>"#;
    let fetcher =
        ScriptedFetcher::default().page("https://mobile.facebook.com/townlibrary", listing.to_string());

    let mut session = Session::new(fetcher);
    let urls = session.list_post_urls("townlibrary", 5).await.unwrap();

    let urls: Vec<String> = urls.into_iter().map(String::from).collect();
    assert_eq!(
        urls,
        vec![
            "https://mbasic.facebook.com/story.php?story_fbid=1&id=111",
            "https://mbasic.facebook.com/story.php?story_fbid=2&id=111",
        ]
    );
}

#[tokio::test]
async fn test_rejected_login_is_reported() {
    let fetcher = ScriptedFetcher {
        reject_login: true,
        ..Default::default()
    };
    let mut session = Session::new(fetcher);

    let result = session
        .login(&Credentials::new("me@example.com", "wrong"))
        .await;

    assert!(matches!(result, Err(ScrapeError::Login(_))));
}
