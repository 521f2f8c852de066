//! Output rendering for the chat application.
//!
//! Streamed replies, Greek text and lexicon entries are styled with ANSI
//! escape codes unless color is disabled.

use std::io::{self, Stdout, Write};

use crate::types::{ConversationListItem, LexiconEntry, Verse};

/// ANSI escape code for dim text (used for metadata).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for Greek headwords).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for Greek text).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print a chunk of the assistant's reply as it streams in.
    fn print_chunk(&mut self, text: &str);

    /// Called when a reply is complete.
    fn finish_response(&mut self);

    /// Print a verse with its translation.
    fn print_verse(&mut self, verse: &Verse);

    /// Print a lexicon entry.
    fn print_lexicon_entry(&mut self, entry: &LexiconEntry);

    /// Print one row of the conversation list.
    fn print_conversation(&mut self, item: &ConversationListItem, current: bool);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    in_response: bool,
}

impl PlainTextRenderer {
    /// Creates a renderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a renderer on stdout with the given color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            in_response: false,
        }
    }

    /// Consumes the renderer and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    // Output errors are not actionable for a terminal client.
    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn end_response(&mut self) {
        if self.in_response {
            self.in_response = false;
            self.emit("\n");
        }
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_chunk(&mut self, text: &str) {
        self.in_response = true;
        self.emit(text);
    }

    fn finish_response(&mut self) {
        self.end_response();
    }

    fn print_verse(&mut self, verse: &Verse) {
        self.end_response();
        let header = self.styled(ANSI_BOLD, &verse.reference);
        let greek = self.styled(ANSI_CYAN, &verse.greek_text);
        self.emit(&format!("{header}\n  {greek}\n  {}\n", verse.english_text));
        if let Some(words) = verse.words.as_deref() {
            for word in words {
                let meta = self.styled(
                    ANSI_DIM,
                    &format!("{} {} {}", word.transliteration, word.strongs_number, word.morphology),
                );
                self.emit(&format!("    {} ({meta}) {}\n", word.greek, word.english));
            }
        }
    }

    fn print_lexicon_entry(&mut self, entry: &LexiconEntry) {
        self.end_response();
        let headword = self.styled(ANSI_BOLD, &entry.greek);
        let meta = self.styled(
            ANSI_DIM,
            &format!("{} {}", entry.strongs_number, entry.transliteration),
        );
        self.emit(&format!("{headword} ({meta})\n  {}\n", entry.definition));
        if !entry.usage.is_empty() {
            self.emit(&format!("  Usage: {}\n", entry.usage));
        }
        if let Some(count) = entry.total_occurrences {
            self.emit(&format!("  Occurrences: {count}\n"));
        }
    }

    fn print_conversation(&mut self, item: &ConversationListItem, current: bool) {
        self.end_response();
        let marker = if current { "*" } else { " " };
        let title = item.title.as_deref().unwrap_or(crate::types::DEFAULT_TITLE);
        let meta = self.styled(
            ANSI_DIM,
            &format!("{} messages, updated {}", item.message_count, item.updated_at),
        );
        self.emit(&format!("  {marker} [{}] {title} ({meta})\n", item.id));
    }

    fn print_error(&mut self, error: &str) {
        self.end_response();
        let line = self.styled(ANSI_RED, &format!("Error: {error}"));
        self.emit(&format!("{line}\n"));
    }

    fn print_info(&mut self, info: &str) {
        self.end_response();
        self.emit(&format!("{info}\n"));
    }
}
