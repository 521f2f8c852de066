use crate::client::{ApiClient, RequestOptions};
use crate::error::{Error, Result};
use crate::types::{Book, Verse};

/// Verse lookup endpoints.
#[derive(Clone, Debug)]
pub struct VerseApi {
    client: ApiClient,
}

impl VerseApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Look up a verse by its display reference, e.g. `John 3:16`.
    pub async fn by_reference(&self, reference: &str) -> Result<Verse> {
        let reference = reference.trim();
        if reference.is_empty() || reference.contains('/') {
            return Err(Error::validation(
                format!("invalid verse reference {reference:?}"),
                Some("reference".to_string()),
            ));
        }
        self.client
            .get(&format!("/verses/{reference}"), RequestOptions::new())
            .await
    }

    pub async fn by_book(&self, code: &str, chapter: u32, verse: u32) -> Result<Verse> {
        self.client
            .get(
                &format!("/verses/book/{code}/{chapter}/{verse}"),
                RequestOptions::new(),
            )
            .await
    }

    pub async fn books(&self) -> Result<Vec<Book>> {
        self.client
            .get("/verses/books/list", RequestOptions::new())
            .await
    }
}
