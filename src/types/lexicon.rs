use serde::{Deserialize, Serialize};

/// A Strong's lexicon entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Strong's number, e.g. `G26`.
    pub strongs_number: String,
    pub greek: String,
    pub transliteration: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_occurrences: Option<u32>,
    /// Thayer's definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thayers: Option<String>,
    /// Moulton-Milligan notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moulton_milligan: Option<String>,
    /// Related Strong's numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub see_also: Option<Vec<String>>,
}

/// Result page of a lexicon search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconSearchResult {
    pub entries: Vec<LexiconEntry>,
    pub total: u64,
}
