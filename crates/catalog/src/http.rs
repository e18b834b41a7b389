//! REST client for a hosted catalog service.
//!
//! Expects `GET {base}/courses/{id}` and `GET {base}/courses/{id}/graph`,
//! each answering 404 when the course (or its authored graph) does not exist.

use async_trait::async_trait;
use reqwest::StatusCode;

use coursepath_core::catalog::{AuthoredGraph, CatalogProvider, CourseDefinition};
use coursepath_core::error::CoreError;

use crate::error::CatalogError;

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    /// * `base_url` - e.g. `https://catalog.internal/api`. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn course_url(&self, course_id: &str) -> String {
        format!("{}/courses/{course_id}", self.base_url)
    }

    pub fn graph_url(&self, course_id: &str) -> String {
        format!("{}/courses/{course_id}/graph", self.base_url)
    }

    pub async fn fetch_course(
        &self,
        course_id: &str,
    ) -> Result<Option<CourseDefinition>, CatalogError> {
        self.fetch_optional(&self.course_url(course_id)).await
    }

    pub async fn fetch_graph(&self, course_id: &str) -> Result<Option<AuthoredGraph>, CatalogError> {
        self.fetch_optional(&self.graph_url(course_id)).await
    }

    // ---- private helpers ----

    /// GET a JSON resource, mapping 404 to `None`.
    async fn fetch_optional<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, CatalogError> {
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(response).await?;
        Ok(Some(response.json::<T>().await?))
    }

    /// Return the response unchanged on a 2xx status, otherwise an
    /// [`CatalogError::ApiError`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalog {
    async fn get_course(&self, course_id: &str) -> Result<Option<CourseDefinition>, CoreError> {
        let course = self.fetch_course(course_id).await.map_err(|e| {
            tracing::error!(course_id, error = %e, "Catalog course lookup failed");
            CoreError::from(e)
        })?;
        if let Some(course) = &course {
            course.validate()?;
        }
        Ok(course)
    }

    async fn authored_graph(&self, course_id: &str) -> Result<Option<AuthoredGraph>, CoreError> {
        self.fetch_graph(course_id).await.map_err(|e| {
            tracing::error!(course_id, error = %e, "Catalog graph lookup failed");
            CoreError::from(e)
        })
    }
}
