//! Security news articles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    /// Natural identity of the article.
    pub link: String,
    /// Publication date as given by the feed, or the fetch time.
    pub timestamp: String,
}
