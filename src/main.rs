//! Chatline - terminal chat client
//!
//! Loads the configured thread's history, then sends each stdin line as a
//! turn and streams the reply as it arrives.

use chatline::store::{ConversationStore, Message, MessageType, Sender, UuidIds};
use chatline::{
    ClientConfig, CredentialStore, Feedback, FileCredentialStore, HttpTransport, SessionClient, StoreHandle,
    AUTH_TOKEN_KEY,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Client = SessionClient<HttpTransport>;

#[allow(unused_assignments)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout is reserved for the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "chatline=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    let credentials = Arc::new(FileCredentialStore::new(&config.credentials_path));

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        if command != "login" {
            return Err(format!("unknown command: {command} (expected: login <token>)").into());
        }
        let token = args.next().ok_or("usage: chatline login <token>")?;
        credentials.set(AUTH_TOKEN_KEY, &token)?;
        println!("Token stored in {}", credentials.path().display());
        return Ok(());
    }

    if credentials.get(AUTH_TOKEN_KEY).is_none() {
        tracing::warn!(path = %credentials.path().display(), "No auth token stored; run `chatline login <token>`");
    }

    tracing::info!(
        base_url = %config.base_url,
        user = %config.route.user_id,
        thread = %config.route.thread_id,
        "Starting chat session"
    );

    let transport = Arc::new(HttpTransport::new(config.base_url.clone(), config.connect_timeout)?);
    let store = StoreHandle::new(ConversationStore::new(Box::new(UuidIds)));
    let shared: Arc<dyn CredentialStore> = credentials;
    let mut client = SessionClient::new(transport, shared, config.route.clone(), store);

    let mut printed = 0;
    client.load_history();
    follow(&mut client, &mut printed).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" => break,
            "/good" => rate(&client, Feedback::Positive).await,
            "/bad" => rate(&client, Feedback::Negative).await,
            "/reset" => {
                client.close_connection();
                client.store().update(ConversationStore::reset);
                printed = 0;
            }
            text => {
                client.set_input(text);
                match client.submit_input() {
                    Ok(()) => {
                        // The user's own line is already on screen
                        printed = client.store().read(|store| store.messages().len());
                        follow(&mut client, &mut printed).await;
                    }
                    Err(e) => println!("! {e}"),
                }
            }
        }
    }

    client.close_connection();
    Ok(())
}

/// Stream the reply buffer until the connection task ends, then print the
/// entries it left in the log
async fn follow(client: &mut Client, printed: &mut usize) {
    let mut rx = client.store().subscribe();
    let mut shown = String::new();
    loop {
        tokio::select! {
            () = client.wait() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = rx.borrow_and_update().assistant_text().to_string();
                print_delta(&mut shown, &text);
            }
        }
    }

    client.store().read(|store| {
        for message in store.messages().get(*printed..).unwrap_or_default() {
            let streamed = (message.sender == Sender::Assistant && message.message_type == MessageType::Message)
                .then(|| message.content.as_text())
                .flatten()
                .and_then(|text| text.strip_prefix(shown.as_str()))
                .filter(|_| !shown.is_empty());
            match streamed {
                Some(rest) => println!("{rest}"),
                None => {
                    if !shown.is_empty() {
                        println!();
                        shown.clear();
                    }
                    println!("{}", render(message));
                }
            }
        }
        *printed = store.messages().len();
    });
}

fn print_delta(shown: &mut String, text: &str) {
    if text.is_empty() || text == shown.as_str() {
        return;
    }
    match text.strip_prefix(shown.as_str()) {
        Some(rest) => {
            if shown.is_empty() {
                print!("assistant: ");
            }
            print!("{rest}");
        }
        None => print!("\nassistant: {text}"),
    }
    std::io::stdout().flush().ok();
    *shown = text.to_string();
}

fn render(message: &Message) -> String {
    match message.message_type {
        MessageType::Loading => {
            let mut out = format!("~ {}", message.content.to_display());
            if let Some(snapshot) = &message.reasoning_snapshot {
                for event in &snapshot.timeline {
                    out.push_str("\n    ");
                    out.push_str(&event.describe());
                }
            }
            out
        }
        MessageType::Error => format!("! {}", message.content.to_display()),
        MessageType::Ui => format!("[ui] {}", message.content.to_display()),
        MessageType::Message | MessageType::ToolCall | MessageType::ToolResult => {
            let who = match message.sender {
                Sender::User => "you",
                Sender::Assistant => "assistant",
                Sender::System => "system",
            };
            format!("{who}: {}", message.content.to_display())
        }
    }
}

async fn rate(client: &Client, feedback: Feedback) {
    match client.store().read(|store| store.last_trace_id().map(str::to_string)) {
        Some(trace_id) => {
            client.submit_feedback(&trace_id, feedback).await;
            println!("Thanks for the feedback");
        }
        None => println!("! no reply to rate yet"),
    }
}
