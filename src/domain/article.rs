//! Blog article entity.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::WORDS_PER_MINUTE;
use crate::errors::{AppError, AppResult};

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Blog article backed by a markdown file
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    /// Markdown body without front matter
    pub content: String,
    pub published: bool,
    pub featured: bool,
}

impl Article {
    /// Estimated reading time in minutes, never below one
    pub fn reading_time(&self) -> usize {
        let words = self.content.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    /// Explicit excerpt, or the first paragraph of the body
    pub fn summary(&self) -> String {
        if let Some(excerpt) = &self.excerpt {
            return excerpt.clone();
        }
        self.content
            .split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty() && !p.starts_with('#'))
            .unwrap_or_default()
            .to_string()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
    }

    /// Case-insensitive search over title, excerpt and body
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .excerpt
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle))
            || self.content.to_lowercase().contains(&needle)
    }
}

/// Validate a URL slug (`lowercase-words-and-digits`).
pub fn validate_slug(slug: &str) -> AppResult<()> {
    if SLUG_PATTERN.is_match(slug) {
        Ok(())
    } else {
        Err(AppError::field(
            "slug",
            "Slug may contain only lowercase letters, digits and single hyphens",
        ))
    }
}

/// Derive a slug from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Article summary returned by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleSummary {
    pub slug: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub reading_time: usize,
    pub featured: bool,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            slug: article.slug.clone(),
            title: article.title.clone(),
            author: article.author.clone(),
            published_at: article.published_at,
            category: article.category.clone(),
            tags: article.tags.clone(),
            excerpt: article.summary(),
            reading_time: article.reading_time(),
            featured: article.featured,
        }
    }
}

/// Full article with rendered HTML
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub summary: ArticleSummary,
    pub content_html: String,
}
