//! Interactive chat for studying the Greek New Testament.
//!
//! Questions stream back over the chat channel; conversations are saved to
//! the study service once the reply has settled.
//!
//! # Usage
//!
//! ```bash
//! # Local service on http://localhost:8000
//! koine-chat
//!
//! # Discuss a verse on a remote service
//! koine-chat --api-url https://study.example.com --verse "John 3:16"
//!
//! # Reuse a token from an earlier login
//! KOINE_TOKEN=... koine-chat --no-color
//! ```
//!
//! Type `/help` at the prompt for the list of slash commands.

use std::sync::Arc;
use std::sync::mpsc as std_mpsc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use koine::api::{AuthApi, ConversationApi, LexiconApi, VerseApi};
use koine::channel::stream_url;
use koine::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, NOT_CONNECTED_MESSAGE, PlainTextRenderer,
    Renderer, Wakeup, help_text, parse_command,
};
use koine::{ApiClient, ChannelSignal, SessionContext, StreamEvent, UnauthorizedHandler};

/// One line (or the lack of one) from the prompt thread.
enum Input {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Tells the user how to recover when the service rejects the credential.
struct LoginHint;

impl UnauthorizedHandler for LoginHint {
    fn on_unauthorized(&self) {
        eprintln!("Your session has expired. Use /login <email> <password> to sign in again.");
    }
}

/// REST surfaces used by the slash commands.
struct Services {
    context: SessionContext,
    auth: AuthApi,
    verses: VerseApi,
    lexicon: LexiconApi,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("koine=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Runs the prompt on its own thread.  A line is read only after the main
/// loop hands the prompt back through `ready`.
fn spawn_prompt(
    lines: mpsc::UnboundedSender<Input>,
    ready: std_mpsc::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;
    std::thread::spawn(move || {
        while ready.recv().is_ok() {
            let input = match rl.readline("You: ") {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.trim());
                    Input::Line(line)
                }
                Err(ReadlineError::Interrupted) => Input::Interrupted,
                Err(ReadlineError::Eof) => Input::Eof,
                Err(err) => Input::Failed(err.to_string()),
            };
            if lines.send(input).is_err() {
                break;
            }
        }
    });
    Ok(())
}

/// Main entry point for the koine-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (args, _) = ChatArgs::from_command_line_relaxed("koine-chat [OPTIONS]");
    let config = ChatConfig::try_from(args)?;

    let context = match config.token.as_deref() {
        Some(token) => SessionContext::with_token(token),
        None => SessionContext::new(),
    };
    let client = ApiClient::new(&config.client, context.clone())?
        .with_unauthorized_handler(Arc::new(LoginHint));
    let services = Services {
        context,
        auth: AuthApi::new(client.clone()),
        verses: VerseApi::new(client.clone()),
        lexicon: LexiconApi::new(client.clone()),
    };
    let store = Arc::new(ConversationApi::new(client));

    let mut session =
        ChatSession::open(stream_url(&config.client)?, store, config.session).await?;
    session.set_verse_reference(config.verse_reference.clone());
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    println!("Koine Greek study chat ({})", config.client.api_url);
    if let Some(verse) = session.verse_reference() {
        println!("Discussing {verse}");
    }
    println!("Type /help for commands, /quit to exit\n");

    if services.context.is_authenticated() {
        if let Err(err) = session.refresh_conversations().await {
            renderer.print_error(&err.user_message());
        }
    }

    let (lines_tx, mut lines) = mpsc::unbounded_channel();
    let (ready, ready_rx) = std_mpsc::channel();
    spawn_prompt(lines_tx, ready_rx)?;
    let _ = ready.send(());
    let mut prompting = true;

    loop {
        tokio::select! {
            wakeup = session.wait() => {
                show_wakeup(&wakeup, &mut renderer);
                let save_due = wakeup == Wakeup::SaveDue;
                if session.apply(wakeup).await {
                    renderer.print_info("Chat connection closed.");
                }
                if save_due {
                    if let Some(err) = session.persistence_error() {
                        renderer.print_error(err);
                    }
                }
            }
            input = lines.recv() => {
                prompting = false;
                let line = match input {
                    Some(Input::Line(line)) => line,
                    Some(Input::Interrupted) => String::new(),
                    Some(Input::Eof) | None => {
                        println!("\nGoodbye!");
                        break;
                    }
                    Some(Input::Failed(err)) => {
                        renderer.print_error(&format!("Input error: {err}"));
                        break;
                    }
                };
                let line = line.trim();
                if let Some(cmd) = parse_command(line) {
                    if cmd == ChatCommand::Quit {
                        println!("Goodbye!");
                        break;
                    }
                    run_command(cmd, &mut session, &services, &mut renderer).await;
                } else if !line.is_empty() && !session.submit(line).await {
                    renderer.print_error(NOT_CONNECTED_MESSAGE);
                }
            }
        }

        if !prompting && !session.is_awaiting_response() {
            prompting = ready.send(()).is_ok();
        }
    }

    if let Err(err) = session.flush().await {
        renderer.print_error(&err.user_message());
    }
    session.close().await;
    Ok(())
}

fn show_wakeup(wakeup: &Wakeup, renderer: &mut impl Renderer) {
    match wakeup {
        Wakeup::Signal(ChannelSignal::Event(event)) => match event {
            StreamEvent::Connected => {}
            StreamEvent::Chunk(text) => renderer.print_chunk(text),
            StreamEvent::Done => renderer.finish_response(),
            StreamEvent::Error(message) => renderer.print_error(message),
        },
        Wakeup::Signal(ChannelSignal::ConnectionLost(reason)) => {
            let reason = reason.as_deref().unwrap_or("connection closed");
            renderer.print_error(&format!("Lost the chat connection: {reason}"));
        }
        Wakeup::SaveDue | Wakeup::Closed => {}
    }
}

async fn run_command(
    cmd: ChatCommand,
    session: &mut ChatSession,
    services: &Services,
    renderer: &mut impl Renderer,
) {
    match cmd {
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::New => match session.start_new_conversation().await {
            Ok(()) => renderer.print_info("Started a new conversation."),
            Err(err) => renderer.print_error(&err.user_message()),
        },
        ChatCommand::History => {
            if !services.context.is_authenticated() {
                renderer.print_info("Log in to see saved conversations.");
                return;
            }
            if let Err(err) = session.refresh_conversations().await {
                renderer.print_error(&err.user_message());
                return;
            }
            if session.conversations().is_empty() {
                renderer.print_info("No saved conversations.");
            }
            let current = session.current_conversation().map(|c| c.id);
            for item in session.conversations() {
                renderer.print_conversation(item, Some(item.id) == current);
            }
        }
        ChatCommand::Load(id) => match session.load_conversation(id).await {
            Ok(()) => {
                for message in session.messages() {
                    renderer.print_info(&format!("{}: {}", message.role, message.content));
                }
            }
            Err(err) => renderer.print_error(&err.user_message()),
        },
        ChatCommand::Delete(id) => match session.delete_conversation(id).await {
            Ok(()) => renderer.print_info(&format!("Deleted conversation {id}.")),
            Err(err) => renderer.print_error(&err.user_message()),
        },
        ChatCommand::Verse(reference) => match services.verses.by_reference(&reference).await {
            Ok(verse) => {
                renderer.print_verse(&verse);
                session.set_verse_reference(Some(verse.reference));
            }
            Err(err) => renderer.print_error(&err.user_message()),
        },
        ChatCommand::NoVerse => {
            session.set_verse_reference(None);
            renderer.print_info("Verse context cleared.");
        }
        ChatCommand::Lexicon(term) => match services.lexicon.lookup(&term).await {
            Ok(entry) => renderer.print_lexicon_entry(&entry),
            Err(err) => renderer.print_error(&err.user_message()),
        },
        ChatCommand::Login { email, password } => {
            if let Err(err) = services.auth.login(&email, &password).await {
                renderer.print_error(&err.user_message());
                return;
            }
            match services.auth.current_user().await {
                Ok(user) => renderer.print_info(&format!(
                    "Logged in as {}.",
                    user.full_name.as_deref().unwrap_or(&user.email)
                )),
                Err(err) => renderer.print_error(&err.user_message()),
            }
            if let Err(err) = session.refresh_conversations().await {
                renderer.print_error(&err.user_message());
            }
        }
        ChatCommand::Logout => {
            services.auth.logout();
            renderer.print_info("Logged out.");
        }
        ChatCommand::Status => print_status(session, services),
        ChatCommand::Quit => {}
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
}

fn print_status(session: &ChatSession, services: &Services) {
    println!("    Session Status:");
    println!(
        "      Connection: {}",
        if session.is_connected() {
            "open"
        } else {
            "closed"
        }
    );
    println!("      Messages: {}", session.message_count());
    match session.verse_reference() {
        Some(verse) => println!("      Verse: {}", verse),
        None => println!("      Verse: (none)"),
    }
    match session.current_conversation() {
        Some(conversation) => println!(
            "      Conversation: {} ({})",
            conversation.id,
            conversation
                .title
                .as_deref()
                .unwrap_or(koine::DEFAULT_TITLE)
        ),
        None => println!("      Conversation: (unsaved)"),
    }
    println!(
        "      Account: {}",
        if services.context.is_authenticated() {
            "logged in"
        } else {
            "anonymous"
        }
    );
    println!(
        "      Save pending: {}",
        if session.save_pending() { "yes" } else { "no" }
    );
    if let Some(err) = session.error() {
        println!("      Last error: {}", err);
    }
    if let Some(err) = session.persistence_error() {
        println!("      Last save error: {}", err);
    }
}
