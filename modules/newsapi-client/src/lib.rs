pub mod error;
pub mod types;

pub use error::{NewsApiError, Result};
pub use types::{Article, ArticleSource, SearchResponse};

use chrono::NaiveDate;
use types::ApiErrorBody;

const BASE_URL: &str = "https://newsapi.org/v2";

pub struct NewsApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Full-text search over `/v2/everything`. Returns up to `page_size`
    /// articles matching `query` published inside [from, to].
    pub async fn everything(
        &self,
        query: &str,
        from: NaiveDate,
        to: NaiveDate,
        page_size: u32,
    ) -> Result<Vec<Article>> {
        let url = format!("{}/everything", self.base_url);

        tracing::debug!(query, page_size, "NewsAPI search");

        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("from", &from.format("%Y-%m-%d").to_string()),
                ("to", &to.format("%Y-%m-%d").to_string()),
                ("pageSize", &page_size.to_string()),
                ("sortBy", "publishedAt"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(NewsApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let search: SearchResponse = resp.json().await?;
        if search.status != "ok" {
            return Err(NewsApiError::Api {
                status: status.as_u16(),
                message: format!("provider status {}", search.status),
            });
        }

        Ok(search.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_response() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": "reuters", "name": "Reuters"},
                "author": "Staff",
                "title": "Floods close major shipping lane",
                "description": "Severe flooding has closed the river to barges.",
                "url": "https://example.com/floods",
                "publishedAt": "2025-06-01T08:30:00Z",
                "content": "Severe flooding..."
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "ok");
        assert_eq!(parsed.total_results, 1);
        assert_eq!(parsed.articles.len(), 1);
        assert_eq!(
            parsed.articles[0].source.name.as_deref(),
            Some("Reuters")
        );
        assert_eq!(
            parsed.articles[0].url.as_deref(),
            Some("https://example.com/floods")
        );
    }

    #[test]
    fn parses_error_body() {
        let body = r#"{"status":"error","code":"rateLimited","message":"Too many requests."}"#;
        let parsed: types::ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, "error");
        assert_eq!(parsed.message.as_deref(), Some("Too many requests."));
    }

    #[test]
    fn tolerates_null_fields() {
        let body = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": null},
                "author": null,
                "title": null,
                "description": null,
                "url": null,
                "publishedAt": null,
                "content": null
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.articles[0].url.is_none());
    }
}
