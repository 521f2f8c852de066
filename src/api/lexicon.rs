use serde_json::Value;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Result;
use crate::types::{LexiconEntry, LexiconSearchResult};

/// Strong's lexicon endpoints.
#[derive(Clone, Debug)]
pub struct LexiconApi {
    client: ApiClient,
}

impl LexiconApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Look up an entry by Strong's number, e.g. `G26`.
    pub async fn by_strongs(&self, number: &str) -> Result<LexiconEntry> {
        self.client
            .get(&format!("/lexicon/strongs/{number}"), RequestOptions::new())
            .await
    }

    pub async fn by_greek(&self, word: &str) -> Result<LexiconEntry> {
        self.client
            .get(&format!("/lexicon/greek/{word}"), RequestOptions::new())
            .await
    }

    pub async fn by_transliteration(&self, transliteration: &str) -> Result<LexiconEntry> {
        self.client
            .get(
                &format!("/lexicon/transliteration/{transliteration}"),
                RequestOptions::new(),
            )
            .await
    }

    pub async fn search(&self, query: &str) -> Result<LexiconSearchResult> {
        self.client
            .get(
                "/lexicon/search",
                RequestOptions::new().with_query("q", query),
            )
            .await
    }

    /// Service-defined statistics about the lexicon.
    pub async fn stats(&self) -> Result<Value> {
        self.client
            .get("/lexicon/stats", RequestOptions::new())
            .await
    }

    /// Look up `term` as a Strong's number when it looks like one, else as a
    /// Greek word.
    pub async fn lookup(&self, term: &str) -> Result<LexiconEntry> {
        if is_strongs_number(term) {
            self.by_strongs(term).await
        } else {
            self.by_greek(term).await
        }
    }
}

/// Returns true for `G` followed by digits, e.g. `G3056`.
pub fn is_strongs_number(term: &str) -> bool {
    let mut chars = term.chars();
    matches!(chars.next(), Some('G' | 'g'))
        && term.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}
