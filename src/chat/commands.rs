//! Slash command parsing for the chat application.
//!
//! Input that starts with `/` controls the session or looks something up;
//! everything else is sent to the assistant as a question.

use crate::types::ConversationId;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new conversation.
    New,

    /// List saved conversations.
    History,

    /// Load a saved conversation.
    Load(ConversationId),

    /// Delete a saved conversation.
    Delete(ConversationId),

    /// Show a verse and use it as chat context.
    Verse(String),

    /// Stop sending verse context.
    NoVerse,

    /// Look up a Strong's number or Greek word.
    Lexicon(String),

    /// Log in and keep the token for this process.
    Login {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },

    /// Forget the credential.
    Logout,

    /// Show connection, conversation and account state.
    Status,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a question.
///
/// # Examples
///
/// ```
/// # use koine::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/verse John 3:16").is_some());
/// assert!(parse_command("What does ἀγάπη mean?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" | "clear" => ChatCommand::New,
        "history" | "list" => ChatCommand::History,
        "load" => parse_id(argument, ChatCommand::Load, "/load"),
        "delete" | "rm" => parse_id(argument, ChatCommand::Delete, "/delete"),
        "verse" => match argument {
            Some(reference) => ChatCommand::Verse(reference.to_string()),
            None => ChatCommand::Invalid("/verse requires a reference, e.g. /verse John 3:16".to_string()),
        },
        "noverse" => ChatCommand::NoVerse,
        "lexicon" | "lex" => match argument {
            Some(term) => ChatCommand::Lexicon(term.to_string()),
            None => ChatCommand::Invalid(
                "/lexicon requires a Strong's number or Greek word".to_string(),
            ),
        },
        "login" => parse_login(argument),
        "logout" => ChatCommand::Logout,
        "status" | "stats" => ChatCommand::Status,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_id<F>(argument: Option<&str>, constructor: F, name: &str) -> ChatCommand
where
    F: Fn(ConversationId) -> ChatCommand,
{
    match argument {
        Some(arg) => match arg.parse::<ConversationId>() {
            Ok(id) if id > 0 => constructor(id),
            _ => ChatCommand::Invalid(format!("{} expects a conversation id", name)),
        },
        None => ChatCommand::Invalid(format!("{} requires a conversation id", name)),
    }
}

fn parse_login(argument: Option<&str>) -> ChatCommand {
    let mut parts = argument.unwrap_or_default().split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(email), Some(password), None) => ChatCommand::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        _ => ChatCommand::Invalid("/login expects <email> <password>".to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new conversation
  /history               List saved conversations
  /load <id>             Load a saved conversation
  /delete <id>           Delete a saved conversation
  /verse <ref>           Show a verse and discuss it (e.g., /verse John 3:16)
  /noverse               Stop attaching verse context
  /lexicon <term>        Look up a Strong's number (G26) or Greek word
  /login <email> <pw>    Log in to save conversations
  /logout                Forget the stored credential
  /status                Show connection and conversation state
  /help                  Show this help message
  /quit                  Exit the chat"#
}
