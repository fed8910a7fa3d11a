//! Documentation pages rendered from markdown.

use serde::Serialize;

use super::blog_service::render_markdown;
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::DocumentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocEntry {
    pub path: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocPage {
    pub path: String,
    pub title: String,
    pub content_html: String,
}

pub struct DocsService {
    store: DocumentStore,
}

impl DocsService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn index(&self) -> AppResult<Vec<DocEntry>> {
        let store = self.store.clone();
        let docs = blocking(move || store.list()).await?;
        Ok(docs
            .into_iter()
            .map(|d| DocEntry {
                path: d.path,
                title: d.title,
            })
            .collect())
    }

    /// Rendered page; unknown or unsafe paths are 404.
    pub async fn page(&self, path: &str) -> AppResult<DocPage> {
        let store = self.store.clone();
        let path = path.to_string();
        let doc = blocking(move || store.read(&path))
            .await?
            .ok_or_not_found("Document")?;
        Ok(DocPage {
            content_html: render_markdown(&doc.content),
            path: doc.path,
            title: doc.title,
        })
    }
}

async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal(format!("Docs task failed: {}", e)))?
}
