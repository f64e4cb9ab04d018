//! Terminal rendering utilities.
//!
//! Human-readable listings of conversations, messages and search hits, plus
//! the `--json` output mode.

use chatvault_core::{Conversation, Message, Role};
use chatvault_history::MessageHit;
use console::{style, Emoji};
use serde::Serialize;

static CHECK: Emoji = Emoji("✓", "+");
static USER: Emoji = Emoji("👤", ">");
static ASSISTANT: Emoji = Emoji("🤖", "<");

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
}

impl Output {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Output::Json
        } else {
            Output::Human
        }
    }

    pub fn is_json(self) -> bool {
        self == Output::Json
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a dollar amount with four decimals.
pub fn format_cost(cost: f64) -> String {
    format!("${:.4}", cost)
}

/// Cut text to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let head: String = single_line.chars().take(max).collect();
    format!("{}...", head)
}

fn role_icon(role: Role) -> &'static Emoji<'static, 'static> {
    match role {
        Role::User => &USER,
        _ => &ASSISTANT,
    }
}

/// One line per conversation.
pub fn render_conversation_row(conversation: &Conversation) {
    println!(
        "{:>5}  {}  {}  {}  {} tokens  {}",
        style(conversation.id).bold(),
        style(truncate(conversation.display_title(), 48)).cyan(),
        style(conversation.platform.display_name()).dim(),
        style(&conversation.model).dim(),
        conversation.total_tokens,
        format_cost(conversation.total_cost),
    );
}

/// Conversation header followed by its messages.
pub fn render_transcript(conversation: &Conversation, messages: &[Message]) {
    println!("{}", style(conversation.display_title()).bold());
    println!(
        "{}",
        style(format!(
            "{} / {} / {} tokens / {} / created {}",
            conversation.platform.display_name(),
            conversation.model,
            conversation.total_tokens,
            format_cost(conversation.total_cost),
            conversation.created_at.format("%Y-%m-%d %H:%M"),
        ))
        .dim()
    );

    for message in messages {
        println!();
        render_message(message);
    }
}

/// A single message with its role marker.
pub fn render_message(message: &Message) {
    let mut header = format!("{} {}", role_icon(message.role), style(message.role.title()).bold());
    if let Some(tokens) = message.tokens {
        header.push_str(&format!("  {}", style(format!("{} tokens", tokens)).dim()));
    }
    println!("{}", header);
    println!("{}", message.content);
}

/// One search hit: score (when semantic), location and snippet.
pub fn render_hit(hit: &MessageHit) {
    let score = hit
        .score
        .map(|s| format!("{:.3}  ", s))
        .unwrap_or_default();
    println!(
        "{}{} {}  {}",
        style(score).green(),
        style(format!("msg-{}", hit.message_id)).bold(),
        style(format!(
            "conversation {} ({})",
            hit.conversation_id,
            hit.conversation_title.as_deref().unwrap_or("Untitled Conversation")
        ))
        .dim(),
        style(hit.role.title()).dim(),
    );
    println!("    {}", truncate(&hit.snippet, 120));
}

/// Confirmation line for a completed mutation.
pub fn render_success(message: &str) {
    println!("{} {}", style(CHECK).green(), message);
}
