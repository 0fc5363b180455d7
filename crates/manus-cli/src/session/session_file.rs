use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use manus::models::message::Message;

/// Write the conversation as JSON lines, replacing any previous contents
pub fn persist_messages(session_file: &Path, messages: &[Message]) -> Result<()> {
    if let Some(parent) = session_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(session_file)
        .with_context(|| format!("Failed to create transcript {}", session_file.display()))?;
    persist_messages_internal(file, messages)
}

fn persist_messages_internal(session_file: File, messages: &[Message]) -> Result<()> {
    let mut writer = std::io::BufWriter::new(session_file);

    for message in messages {
        serde_json::to_writer(&mut writer, &message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a conversation written by [`persist_messages`]. Blank lines are skipped.
pub fn read_messages(session_file: &Path) -> Result<Vec<Message>> {
    let file = File::open(session_file)
        .with_context(|| format!("Failed to open transcript {}", session_file.display()))?;

    let mut messages = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = serde_json::from_str(&line)
            .with_context(|| format!("Invalid message on line {}", index + 1))?;
        messages.push(message);
    }
    Ok(messages)
}
