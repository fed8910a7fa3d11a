//! File-backed content: blog articles and documentation pages.
//!
//! Articles are markdown files with a YAML front matter block. Documentation
//! pages are plain markdown files in a directory tree.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gray_matter::{engine::YAML, Matter};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::domain::article::validate_slug;
use crate::domain::Article;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const MARKDOWN_EXTENSION: &str = "md";

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Every parseable article, published or not, in no particular order
    async fn all(&self) -> AppResult<Vec<Article>>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Article>>;

    /// Write a new article; an existing slug is a conflict
    async fn create(&self, article: Article) -> AppResult<Article>;
}

/// Front matter block as written in article files
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
    published: Option<bool>,
    featured: bool,
}

impl From<&Article> for FrontMatter {
    fn from(article: &Article) -> Self {
        Self {
            title: Some(article.title.clone()),
            slug: Some(article.slug.clone()),
            author: article.author.clone(),
            published_at: article.published_at.map(|d| d.to_rfc3339()),
            category: article.category.clone(),
            tags: article.tags.clone(),
            excerpt: article.excerpt.clone(),
            published: Some(article.published),
            featured: article.featured,
        }
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and bare dates.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

/// Parse an article file; the slug defaults to the file stem.
pub fn parse_article(raw: &str, file_stem: &str) -> Result<Article, String> {
    let parsed = Matter::<YAML>::new().parse(raw);

    let front: FrontMatter = match parsed.data {
        Some(data) => serde_json::from_value(data.into()).map_err(|e| e.to_string())?,
        None => FrontMatter::default(),
    };

    let slug = front.slug.unwrap_or_else(|| file_stem.to_string());
    let published_at = match front.published_at.as_deref() {
        Some(value) => Some(parse_date(value).ok_or_else(|| format!("invalid published_at '{}'", value))?),
        None => None,
    };

    Ok(Article {
        title: front.title.unwrap_or_else(|| slug.clone()),
        slug,
        author: front.author,
        published_at,
        category: front.category,
        tags: front.tags,
        excerpt: front.excerpt,
        content: parsed.content.trim().to_string(),
        published: front.published.unwrap_or(true),
        featured: front.featured,
    })
}

/// Render an article back into its file representation.
pub fn serialize_article(article: &Article) -> AppResult<String> {
    let yaml = serde_yaml::to_string(&FrontMatter::from(article))
        .map_err(|e| AppError::internal(format!("front matter serialization failed: {}", e)))?;
    Ok(format!("---\n{}---\n\n{}\n", yaml, article.content.trim_end()))
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
}

/// Articles stored as `<dir>/<slug>.md`
pub struct MarkdownArticleStore {
    dir: PathBuf,
}

impl MarkdownArticleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArticleRepository for MarkdownArticleStore {
    async fn all(&self) -> AppResult<Vec<Article>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut articles = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_markdown(&path) {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    tracing::warn!("Skipping article {}: not valid UTF-8", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match parse_article(&raw, &stem) {
                Ok(article) => articles.push(article),
                Err(e) => tracing::warn!("Skipping article {}: {}", path.display(), e),
            }
        }

        Ok(articles)
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Article>> {
        Ok(self.all().await?.into_iter().find(|a| a.slug == slug))
    }

    async fn create(&self, article: Article) -> AppResult<Article> {
        validate_slug(&article.slug)?;
        if self.find_by_slug(&article.slug).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Article '{}' already exists",
                article.slug
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.{}", article.slug, MARKDOWN_EXTENSION));
        let body = serialize_article(&article)?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::conflict(format!(
                    "Article '{}' already exists",
                    article.slug
                )))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(slug = %article.slug, "Article created");
        Ok(article)
    }
}

/// A documentation page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Path relative to the docs root, `/`-separated, without extension
    pub path: String,
    pub title: String,
    pub content: String,
}

/// Index entry for a documentation page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub path: String,
    pub title: String,
}

/// Markdown documentation tree. Filesystem access is blocking; async callers
/// go through `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// All pages sorted by path. Each file is read only up to its first heading.
    pub fn list(&self) -> AppResult<Vec<DocumentSummary>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
        {
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let path = relative
                .with_extension("")
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect::<Vec<_>>()
                .join("/");
            let heading = match first_heading(entry.path()) {
                Ok(heading) => heading,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    tracing::warn!("Skipping document {}: not valid UTF-8", entry.path().display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            docs.push(DocumentSummary {
                title: heading.unwrap_or_else(|| title_from_path(&path)),
                path,
            });
        }
        Ok(docs)
    }

    /// Load one page; traversal outside the root yields `None`.
    pub fn read(&self, path: &str) -> AppResult<Option<Document>> {
        let Some(relative) = sanitize_doc_path(path) else {
            return Ok(None);
        };
        let path = relative.trim_end_matches(".md").to_string();
        let file = self.root.join(format!("{}.{}", path, MARKDOWN_EXTENSION));

        match std::fs::read_to_string(&file) {
            Ok(content) => {
                Ok(Some(Document {
                    title: document_title(&content, &path),
                    path,
                    content,
                }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                tracing::warn!("Document {} is not valid UTF-8", file.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Relative, normal-components-only path, or `None` for anything suspicious.
fn sanitize_doc_path(path: &str) -> Option<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed.contains('\\') {
        return None;
    }
    let candidate = Path::new(trimmed);
    if !candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(trimmed.to_string())
}

fn document_title(content: &str, path: &str) -> String {
    content
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| title_from_path(path))
}

fn title_from_path(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).replace(['-', '_'], " ")
}

/// First `# ` heading, reading line by line and stopping as soon as it is found.
fn first_heading(file: &Path) -> std::io::Result<Option<String>> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        if let Some(title) = line?.strip_prefix("# ") {
            return Ok(Some(title.trim().to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\ntitle: Hello World\nauthor: Jane\npublished_at: 2024-03-01\ncategory: News\ntags: [rust, axum]\n---\n\n# Hello\n\nBody text.\n";

    #[test]
    fn test_parse_article() {
        let article = parse_article(SAMPLE, "hello-world").unwrap();
        assert_eq!(article.slug, "hello-world");
        assert_eq!(article.title, "Hello World");
        assert_eq!(article.tags, vec!["rust", "axum"]);
        assert!(article.published);
        assert_eq!(
            article.published_at.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(article.content.starts_with("# Hello"));
    }

    #[test]
    fn test_parse_without_front_matter() {
        let article = parse_article("Just text", "plain").unwrap();
        assert_eq!(article.title, "plain");
        assert!(article.tags.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let raw = "---\ntitle: X\npublished_at: yesterday\n---\nBody";
        assert!(parse_article(raw, "x").is_err());
    }

    #[test]
    fn test_serialized_article_parses_back() {
        let article = parse_article(SAMPLE, "hello-world").unwrap();
        let raw = serialize_article(&article).unwrap();
        assert_eq!(parse_article(&raw, "ignored").unwrap(), article);
    }

    #[tokio::test]
    async fn test_store_create_and_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkdownArticleStore::new(dir.path().join("articles"));
        assert!(store.all().await.unwrap().is_empty());

        let article = parse_article(SAMPLE, "hello-world").unwrap();
        store.create(article.clone()).await.unwrap();
        assert_eq!(store.find_by_slug("hello-world").await.unwrap(), Some(article.clone()));

        let err = store.create(article).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_store_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.md"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("bad.md"), "---\npublished_at: nope\n---\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = MarkdownArticleStore::new(dir.path());
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].slug, "ok");
    }

    #[tokio::test]
    async fn test_store_skips_non_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.md"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("latin1.md"), [0x2d, 0x2d, 0x2d, 0x0a, 0xff, 0xfe, 0x0a]).unwrap();

        let store = MarkdownArticleStore::new(dir.path());
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].slug, "ok");
    }

    #[test]
    fn test_document_list_stops_at_heading() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = b"intro\n# Title\n".to_vec();
        body.extend_from_slice(&[0xff, 0xfe, 0x0a]);
        std::fs::write(dir.path().join("partial.md"), body).unwrap();
        std::fs::write(dir.path().join("broken.md"), [0xff, 0xfe]).unwrap();

        let docs = DocumentStore::new(dir.path()).list().unwrap();
        assert_eq!(
            docs,
            vec![DocumentSummary { path: "partial".into(), title: "Title".into() }]
        );
        assert!(DocumentStore::new(dir.path()).read("broken").unwrap().is_none());
    }

    #[test]
    fn test_document_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("guide")).unwrap();
        std::fs::write(dir.path().join("index.md"), "# Welcome\n\nHi").unwrap();
        std::fs::write(dir.path().join("guide/install_steps.md"), "No heading").unwrap();

        let store = DocumentStore::new(dir.path());
        let docs = store.list().unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["guide/install_steps", "index"]);
        assert_eq!(docs[0].title, "install steps");

        assert_eq!(store.read("index").unwrap().unwrap().title, "Welcome");
        assert!(store.read("missing").unwrap().is_none());
        assert!(store.read("../secret").unwrap().is_none());
        assert!(store.read("guide/../../etc/passwd").unwrap().is_none());
    }

    #[test]
    fn test_sanitize_doc_path() {
        assert_eq!(sanitize_doc_path("/guide/intro/"), Some("guide/intro".into()));
        assert_eq!(sanitize_doc_path("./x"), None);
        assert_eq!(sanitize_doc_path(".."), None);
        assert_eq!(sanitize_doc_path(""), None);
    }
}
