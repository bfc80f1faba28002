//! Book Store reference API client.
//!
//! Read-only client used to cross-validate the rendered book table against
//! the API's catalogue.

use crate::config::HarnessConfig;
use crate::result::{HarnessError, HarnessResult};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Catalogue endpoint, relative to the API base URL
pub const ENDPOINT_BOOKS: &str = "/Books";
/// Single-book endpoint, relative to the API base URL
pub const ENDPOINT_BOOK: &str = "/Book";

/// Book record as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    /// ISBN
    pub isbn: String,
    /// Title
    pub title: String,
    /// Subtitle
    #[serde(rename = "subTitle")]
    pub sub_title: String,
    /// Author
    pub author: String,
    /// Publication timestamp
    pub publish_date: String,
    /// Publisher
    pub publisher: String,
    /// Page count
    pub pages: u32,
    /// Description
    pub description: String,
    /// Website
    pub website: String,
}

impl Book {
    /// Field value by its API name, for table-driven comparisons
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name.trim() {
            "isbn" => self.isbn.clone(),
            "title" => self.title.clone(),
            "subTitle" | "subtitle" => self.sub_title.clone(),
            "author" => self.author.clone(),
            "publish_date" => self.publish_date.clone(),
            "publisher" => self.publisher.clone(),
            "pages" => self.pages.to_string(),
            "description" => self.description.clone(),
            "website" => self.website.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// `{ "books": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooksPayload {
    /// Catalogue
    #[serde(default)]
    pub books: Vec<Book>,
}

/// Successful response with its status code
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Requested URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Parsed body
    pub body: T,
}

/// Client for the Book Store API
#[derive(Debug, Clone)]
pub struct BookStoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl BookStoreClient {
    /// Create a client for `base_url` with a request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> HarnessResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(target: "demoqa_harness::api", base_url = %base_url, "API client initialized");
        Ok(Self { base_url, client })
    }

    /// Client configured from `API_BASE_URL` and `EXPLICIT_WAIT`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        Self::new(config.api_base_url.clone(), config.explicit_wait)
    }

    /// Base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint
    ///
    /// Endpoints that already carry the base path (`/BookStore/v1/Books`) are
    /// resolved against the origin; absolute URLs are used as is.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.contains("://") {
            return endpoint.to_string();
        }
        let endpoint = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{endpoint}")
        };
        let (origin, base_path) = split_origin(&self.base_url);
        if !base_path.is_empty() && endpoint.starts_with(base_path) {
            format!("{origin}{endpoint}")
        } else {
            format!("{}{endpoint}", self.base_url)
        }
    }

    /// Fetch the whole catalogue
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or malformed body.
    pub async fn get_books(&self) -> HarnessResult<ApiResponse<BooksPayload>> {
        self.get_books_at(ENDPOINT_BOOKS).await
    }

    /// Fetch the catalogue from an explicit endpoint
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or malformed body.
    pub async fn get_books_at(&self, endpoint: &str) -> HarnessResult<ApiResponse<BooksPayload>> {
        let response: ApiResponse<BooksPayload> = self.get_json(endpoint, &[]).await?;
        info!(
            target: "demoqa_harness::api",
            count = response.body.books.len(),
            "Fetched books"
        );
        Ok(response)
    }

    /// Fetch one book by ISBN
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or malformed body.
    pub async fn get_book(&self, isbn: &str) -> HarnessResult<ApiResponse<Book>> {
        let response: ApiResponse<Book> = self.get_json(ENDPOINT_BOOK, &[("ISBN", isbn)]).await?;
        info!(target: "demoqa_harness::api", title = %response.body.title, "Fetched book");
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> HarnessResult<ApiResponse<T>> {
        let url = self.endpoint_url(endpoint);
        debug!(target: "demoqa_harness::api", url = %url, "GET");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!(target: "demoqa_harness::api", url = %url, error = %e, "Request failed");
                HarnessError::Api {
                    url: url.clone(),
                    message: e.to_string(),
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                target: "demoqa_harness::api",
                url = %url,
                status = status.as_u16(),
                "HTTP error"
            );
            return Err(HarnessError::Api {
                url,
                message: format!("status {}: {body}", status.as_u16()),
            });
        }

        let body = resp.json::<T>().await.map_err(|e| HarnessError::Api {
            url: url.clone(),
            message: format!("malformed response body: {e}"),
        })?;
        Ok(ApiResponse {
            url,
            status: status.as_u16(),
            body,
        })
    }

    /// Release the client
    pub fn close(self) {
        debug!(target: "demoqa_harness::api", "API client closed");
    }
}

fn split_origin(url: &str) -> (&str, &str) {
    let scheme_end = url.find("://").map_or(0, |i| i + 3);
    match url[scheme_end..].find('/') {
        Some(i) => url.split_at(scheme_end + i),
        None => (url, ""),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn client() -> BookStoreClient {
        BookStoreClient::new("https://demoqa.com/BookStore/v1/", Duration::from_secs(1)).unwrap()
    }

    mod urls {
        use super::*;

        #[test]
        fn test_base_url_trimmed() {
            assert_eq!(client().base_url(), "https://demoqa.com/BookStore/v1");
        }

        #[test]
        fn test_relative_endpoint() {
            assert_eq!(
                client().endpoint_url("/Books"),
                "https://demoqa.com/BookStore/v1/Books"
            );
            assert_eq!(
                client().endpoint_url("Books"),
                "https://demoqa.com/BookStore/v1/Books"
            );
        }

        #[test]
        fn test_endpoint_with_base_path() {
            assert_eq!(
                client().endpoint_url("/BookStore/v1/Books"),
                "https://demoqa.com/BookStore/v1/Books"
            );
        }

        #[test]
        fn test_absolute_endpoint() {
            assert_eq!(
                client().endpoint_url("http://127.0.0.1:9/Books"),
                "http://127.0.0.1:9/Books"
            );
        }

        #[test]
        fn test_split_origin() {
            assert_eq!(
                split_origin("http://127.0.0.1:8080/BookStore/v1"),
                ("http://127.0.0.1:8080", "/BookStore/v1")
            );
            assert_eq!(split_origin("http://host"), ("http://host", ""));
        }
    }

    mod books {
        use super::*;

        #[test]
        fn test_deserialize_camel_case() {
            let json = r#"{"books":[{"isbn":"9781449325862","title":"Git Pocket Guide",
                "subTitle":"A Working Introduction","author":"Richard E. Silverman",
                "publisher":"O'Reilly Media","pages":234}]}"#;
            let payload: BooksPayload = serde_json::from_str(json).unwrap();
            let book = &payload.books[0];
            assert_eq!(book.sub_title, "A Working Introduction");
            assert_eq!(book.pages, 234);
            assert!(book.website.is_empty());
        }

        #[test]
        fn test_field_lookup() {
            let book = Book {
                title: "Git Pocket Guide".into(),
                author: "Richard E. Silverman".into(),
                pages: 234,
                ..Book::default()
            };
            assert_eq!(book.field("author").as_deref(), Some("Richard E. Silverman"));
            assert_eq!(book.field(" pages ").as_deref(), Some("234"));
            assert_eq!(book.field("image"), None);
        }
    }
}
