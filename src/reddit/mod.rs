//! Reddit JSON API access
//!
//! The client fetches raw JSON, the transformer reshapes it into stable
//! output types, and the service ties the two together per operation.

pub mod client;
pub mod service;
#[doc(hidden)]
pub mod stub;
pub mod transform;

pub use client::{RedditApi, RedditClient};
pub use service::{validate_path_segment, RedditService};
#[doc(hidden)]
pub use stub::{RecordedCall, StubRedditApi};
pub use transform::{parse_comments, parse_listing, to_comment_list, to_post};
