//! Blog service over markdown articles.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;
use utoipa::ToSchema;

use super::authorization::authorize;
use crate::domain::article::slugify;
use crate::domain::{Article, ArticleDetail, ArticleSummary, Permission, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::ArticleRepository;
use crate::types::{Paginated, PaginationParams};

/// Input for a new article
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub published: bool,
    pub featured: bool,
}

/// Name with the number of published articles using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TermCount {
    pub name: String,
    pub count: usize,
}

/// Article listing selector
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ArticleQuery {
    #[default]
    All,
    Category(String),
    Tag(String),
    Search(String),
}

impl ArticleQuery {
    fn accepts(&self, article: &Article) -> bool {
        match self {
            ArticleQuery::All => true,
            ArticleQuery::Category(c) => article.in_category(c),
            ArticleQuery::Tag(t) => article.has_tag(t),
            ArticleQuery::Search(q) => article.matches(q),
        }
    }
}

#[async_trait]
pub trait BlogService: Send + Sync {
    /// Published articles matching the query, newest first
    async fn list(&self, query: ArticleQuery, page: PaginationParams) -> AppResult<Paginated<ArticleSummary>>;

    /// Published article with rendered HTML
    async fn article(&self, slug: &str) -> AppResult<ArticleDetail>;

    async fn categories(&self) -> AppResult<Vec<TermCount>>;

    async fn tags(&self) -> AppResult<Vec<TermCount>>;

    /// `blog.create`
    async fn create(&self, actor: &User, input: NewArticle) -> AppResult<ArticleDetail>;
}

pub struct BlogManager {
    articles: Arc<dyn ArticleRepository>,
}

impl BlogManager {
    pub fn new(articles: Arc<dyn ArticleRepository>) -> Self {
        Self { articles }
    }

    async fn published(&self) -> AppResult<Vec<Article>> {
        let mut articles: Vec<Article> = self
            .articles
            .all()
            .await?
            .into_iter()
            .filter(|a| a.published)
            .collect();
        // Undated articles sort last; ties break on slug for a stable order.
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(articles)
    }
}

/// CommonMark with tables, footnotes, strikethrough and task lists.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn detail(article: &Article) -> ArticleDetail {
    ArticleDetail {
        summary: ArticleSummary::from(article),
        content_html: render_markdown(&article.content),
    }
}

fn count_terms<'a>(terms: impl Iterator<Item = &'a str>) -> Vec<TermCount> {
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for term in terms {
        let entry = counts
            .entry(term.to_lowercase())
            .or_insert_with(|| (term.to_string(), 0));
        entry.1 += 1;
    }
    let mut out: Vec<TermCount> = counts
        .into_values()
        .map(|(name, count)| TermCount { name, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}

#[async_trait]
impl BlogService for BlogManager {
    async fn list(&self, query: ArticleQuery, page: PaginationParams) -> AppResult<Paginated<ArticleSummary>> {
        let matching: Vec<ArticleSummary> = self
            .published()
            .await?
            .iter()
            .filter(|a| query.accepts(a))
            .map(ArticleSummary::from)
            .collect();
        let total = matching.len() as u64;
        Ok(Paginated::new(page.apply(&matching), &page, total))
    }

    async fn article(&self, slug: &str) -> AppResult<ArticleDetail> {
        let article = self
            .articles
            .find_by_slug(slug)
            .await?
            .filter(|a| a.published)
            .ok_or_not_found("Article")?;
        Ok(detail(&article))
    }

    async fn categories(&self) -> AppResult<Vec<TermCount>> {
        let articles = self.published().await?;
        Ok(count_terms(articles.iter().filter_map(|a| a.category.as_deref())))
    }

    async fn tags(&self) -> AppResult<Vec<TermCount>> {
        let articles = self.published().await?;
        Ok(count_terms(
            articles.iter().flat_map(|a| a.tags.iter().map(String::as_str)),
        ))
    }

    async fn create(&self, actor: &User, input: NewArticle) -> AppResult<ArticleDetail> {
        authorize(actor, Permission::BlogCreate)?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::field("title", "Title is required"));
        }
        if input.content.trim().is_empty() {
            return Err(AppError::field("content", "Content is required"));
        }
        let slug = input
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&title));

        let article = Article {
            slug,
            title,
            author: Some(actor.name.clone()),
            published_at: Some(Utc::now()),
            category: input.category.filter(|c| !c.trim().is_empty()),
            tags: input
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            excerpt: input.excerpt.filter(|e| !e.trim().is_empty()),
            content: input.content,
            published: input.published,
            featured: input.featured,
        };

        let article = self.articles.create(article).await?;
        tracing::info!(slug = %article.slug, author = %actor.id, "Blog article published");
        Ok(detail(&article))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::infra::MockArticleRepository;
    use chrono::TimeZone;

    fn article(slug: &str, day: u32, category: &str, tags: &[&str], published: bool) -> Article {
        Article {
            slug: slug.into(),
            title: slug.replace('-', " "),
            author: None,
            published_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
            category: Some(category.into()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            excerpt: None,
            content: format!("# {}\n\nBody of {}", slug, slug),
            published,
            featured: false,
        }
    }

    fn blog() -> BlogManager {
        let mut repo = MockArticleRepository::new();
        let articles = vec![
            article("first-post", 1, "News", &["rust", "intro"], true),
            article("second-post", 5, "Guides", &["Rust"], true),
            article("draft", 9, "News", &["rust"], false),
        ];
        let lookup = articles.clone();
        repo.expect_all().returning(move || Ok(articles.clone()));
        repo.expect_find_by_slug()
            .returning(move |slug| Ok(lookup.iter().find(|a| a.slug == slug).cloned()));
        BlogManager::new(Arc::new(repo))
    }

    fn editor() -> User {
        User::new("e@x.cz".into(), "h".into(), "Eddie".into(), UserRole::Editor)
    }

    #[tokio::test]
    async fn test_list_is_published_newest_first() {
        let page = blog()
            .list(ArticleQuery::All, PaginationParams::default())
            .await
            .unwrap();
        let slugs: Vec<_> = page.data.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second-post", "first-post"]);
        assert_eq!(page.meta.total, 2);
    }

    #[tokio::test]
    async fn test_filters() {
        let blog = blog();
        let by_tag = blog
            .list(ArticleQuery::Tag("RUST".into()), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(by_tag.meta.total, 2);

        let by_category = blog
            .list(ArticleQuery::Category("news".into()), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(by_category.data[0].slug, "first-post");
        assert_eq!(by_category.meta.total, 1);

        let search = blog
            .list(ArticleQuery::Search("body of second".into()), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(search.data.len(), 1);
    }

    #[tokio::test]
    async fn test_drafts_are_not_found() {
        let err = blog().article("draft").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let detail = blog().article("first-post").await.unwrap();
        assert!(detail.content_html.contains("<h1>first-post</h1>"));
    }

    #[tokio::test]
    async fn test_term_counts_merge_case() {
        let tags = blog().tags().await.unwrap();
        assert!(tags[0].name.eq_ignore_ascii_case("rust"));
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[1].name, "intro");

        let categories = blog().categories().await.unwrap();
        assert_eq!(categories.len(), 2);
    }

    #[tokio::test]
    async fn test_create_requires_permission() {
        let user = User::new("u@x.cz".into(), "h".into(), "Ursula".into(), UserRole::User);
        let err = blog()
            .create(&user, NewArticle { title: "Hi".into(), content: "x".into(), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_author() {
        let mut repo = MockArticleRepository::new();
        repo.expect_create()
            .withf(|a| a.slug == "hello-world" && a.author.as_deref() == Some("Eddie"))
            .returning(|a| Ok(a));
        let blog = BlogManager::new(Arc::new(repo));

        let created = blog
            .create(
                &editor(),
                NewArticle {
                    title: "Hello, World!".into(),
                    content: "Some *text*".into(),
                    published: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.summary.slug, "hello-world");
        assert!(created.content_html.contains("<em>text</em>"));
    }

    #[test]
    fn test_render_markdown_tables() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }
}
