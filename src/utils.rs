use uuid::Uuid;

use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

pub fn parse_id(input: &str) -> Result<Uuid> {
  input
    .trim()
    .parse()
    .map_err(|_| Error::InvalidArgs(format!("Not a valid id: {input}")))
}

/// Escapes text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
  text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Maximum message length for Telegram Bot API (4096 characters).
/// We use a slightly smaller limit to account for potential HTML entity expansion.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4000;

/// Splits a long message into chunks that fit within Telegram's message limit.
/// Attempts to split at newline boundaries to preserve formatting.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
  let max_len =
    if max_len == 0 { TELEGRAM_MAX_MESSAGE_LENGTH } else { max_len };

  if text.len() <= max_len {
    return vec![text.to_string()];
  }

  let mut chunks = Vec::new();
  let mut current = String::new();

  for line in text.lines() {
    if !current.is_empty() && current.len() + line.len() + 1 > max_len {
      chunks.push(std::mem::take(&mut current));
    }

    if line.chars().count() > max_len {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let chars: Vec<char> = line.chars().collect();
      let mut pieces = chars.chunks(max_len).peekable();
      while let Some(piece) = pieces.next() {
        let piece: String = piece.iter().collect();
        if pieces.peek().is_some() {
          chunks.push(piece);
        } else {
          current = piece;
        }
      }
    } else {
      if !current.is_empty() {
        current.push('\n');
      }
      current.push_str(line);
    }
  }

  if !current.is_empty() {
    chunks.push(current);
  }

  chunks
}
