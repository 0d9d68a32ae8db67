//! Reshape raw Reddit JSON into [`Post`] and [`Comment`] values
//!
//! Upstream payloads are parsed into explicit serde shapes first, so a
//! missing or mistyped field becomes a [`RedditMcpError::Parse`] instead of
//! a silently defaulted value.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{RedditMcpError, Result};
use crate::types::{Comment, Post, PostWithComments, REDDIT_WEB_ORIGIN};

/// Kind tag Reddit uses for "load more comments" placeholders
const MORE_KIND: &str = "more";

/// Listing wrapper: `{ "kind": "Listing", "data": { "children": [...] } }`
#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<T>,
}

/// One element of a listing: `{ "kind": "t3", "data": {...} }`
#[derive(Debug, Deserialize)]
pub struct Child<T> {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: T,
}

/// Fields read from a `t3` (link) child
#[derive(Debug, Deserialize)]
pub struct RawPost {
    pub title: String,
    pub permalink: String,
    pub author: String,
    pub subreddit: String,
    pub score: i64,
    pub num_comments: i64,
}

/// Fields read from a `t1` (comment) child
#[derive(Debug, Deserialize)]
pub struct RawComment {
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
}

/// Convert a typed post child into the output shape
pub fn to_post(child: Child<RawPost>) -> Post {
    let data = child.data;
    Post {
        title: data.title,
        url: format!("{}{}", REDDIT_WEB_ORIGIN, data.permalink),
        author: data.author,
        subreddit: data.subreddit,
        score: data.score,
        num_comments: data.num_comments,
    }
}

/// Convert comment children, preserving upstream order.
///
/// `more` placeholders carry no author or body and are skipped.
pub fn to_comment_list(children: Vec<Child<Value>>) -> Result<Vec<Comment>> {
    children
        .into_iter()
        .filter(|child| child.kind.as_deref() != Some(MORE_KIND))
        .map(|child| {
            let raw: RawComment = decode(child.data, "comment")?;
            Ok(Comment {
                author: raw.author,
                body: raw.body,
                score: raw.score,
                created_utc: raw.created_utc,
            })
        })
        .collect()
}

/// Parse a post listing (search, hot, new)
pub fn parse_listing(value: Value) -> Result<Vec<Post>> {
    let listing: Listing<Child<RawPost>> = decode(value, "post listing")?;
    Ok(listing.data.children.into_iter().map(to_post).collect())
}

/// Parse the `[post listing, comment listing]` pair returned by the comments endpoint
pub fn parse_comments(value: Value) -> Result<PostWithComments> {
    let (post_listing, comment_listing): (Listing<Child<RawPost>>, Listing<Child<Value>>) =
        decode(value, "comments response")?;

    let post = post_listing
        .data
        .children
        .into_iter()
        .next()
        .map(to_post)
        .ok_or_else(|| RedditMcpError::Parse("post listing has no children".to_string()))?;

    let comments = to_comment_list(comment_listing.data.children)?;

    Ok(PostWithComments { post, comments })
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| RedditMcpError::Parse(format!("{}: {}", what, e)))
}
