use serde::{Deserialize, Serialize};

/// One word of a verse with its analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseWord {
    pub greek: String,
    pub transliteration: String,
    pub strongs_number: String,
    pub morphology: String,
    pub english: String,
}

/// A verse of the Greek New Testament with its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    /// Display reference, e.g. `John 3:16`.
    pub reference: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub greek_text: String,
    pub english_text: String,
    /// Word-level analysis, when the service provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<VerseWord>>,
}

/// A book of the New Testament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Short code used in verse paths, e.g. `JHN`.
    pub code: String,
    pub name: String,
    pub chapters: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verse_with_words() {
        let verse: Verse = serde_json::from_value(json!({
            "reference": "John 1:1",
            "book": "John",
            "chapter": 1,
            "verse": 1,
            "greek_text": "Ἐν ἀρχῇ ἦν ὁ λόγος",
            "english_text": "In the beginning was the Word",
            "words": [{
                "greek": "λόγος",
                "transliteration": "logos",
                "strongs_number": "G3056",
                "morphology": "N-NSM",
                "english": "Word"
            }]
        }))
        .unwrap();
        assert_eq!(verse.chapter, 1);
        assert_eq!(verse.words.as_ref().map(Vec::len), Some(1));
        assert_eq!(verse.words.unwrap()[0].strongs_number, "G3056");
    }

    #[test]
    fn verse_without_words() {
        let verse: Verse = serde_json::from_value(json!({
            "reference": "Mark 1:1",
            "book": "Mark",
            "chapter": 1,
            "verse": 1,
            "greek_text": "Ἀρχὴ τοῦ εὐαγγελίου",
            "english_text": "The beginning of the gospel"
        }))
        .unwrap();
        assert!(verse.words.is_none());
        let value = serde_json::to_value(&verse).unwrap();
        assert!(value.get("words").is_none());
    }
}
