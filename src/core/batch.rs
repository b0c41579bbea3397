//! Batch envelope codec
//!
//! Groups several HL7 messages inside `FHS`/`BHS` ... `BTS`/`FTS` wrapper
//! segments, and splits files or streams holding several messages back into
//! individual message texts.

const FILE_HEADER: &str = "FHS|^~\\&\r";
const BATCH_HEADER: &str = "BHS|^~\\&\r";

/// Wrap CR-terminated messages in a file/batch envelope
///
/// # Example
///
/// ```
/// use hl7bridge::core::batch::wrap;
///
/// let batch = wrap(&["MSH|^~\\&|A\r"]);
/// assert_eq!(batch, "FHS|^~\\&\rBHS|^~\\&\rMSH|^~\\&|A\rBTS|1\rFTS|1\r");
/// ```
pub fn wrap<S: AsRef<str>>(messages: &[S]) -> String {
    let body_len: usize = messages.iter().map(|m| m.as_ref().len()).sum();
    let mut out = String::with_capacity(body_len + 64);
    out.push_str(FILE_HEADER);
    out.push_str(BATCH_HEADER);
    for message in messages {
        out.push_str(message.as_ref());
    }
    out.push_str(&format!("BTS|{}\rFTS|1\r", messages.len()));
    out
}

/// Split an enveloped batch into its messages
///
/// A message starts at each `MSH|` line and ends at the next `MSH|` line or
/// at a `BTS|`/`FTS|` trailer. Lines before the first `MSH|` are dropped.
/// Every returned message is CR-terminated.
pub fn unwrap(batch: &str) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in batch.split('\r') {
        if line.starts_with("MSH|") {
            flush(&mut current, &mut messages);
            current.push(line);
        } else if line.starts_with("BTS|") || line.starts_with("FTS|") {
            flush(&mut current, &mut messages);
        } else if !current.is_empty() {
            current.push(line);
        }
    }
    flush(&mut current, &mut messages);
    messages
}

/// Split text holding one or more messages, enveloped or bare
///
/// Line endings (`\r\n`, `\n`, `\r`) are normalized to `\r` first. Text that
/// opens with `FHS|` or `BHS|` goes through [`unwrap`]; anything else is split
/// on `MSH|` boundaries directly. Lines ahead of the first `MSH|` come back as
/// a leading chunk of their own.
pub fn split_messages(text: &str) -> Vec<String> {
    let normalized = normalize_line_endings(text);
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed.starts_with("FHS|") || trimmed.starts_with("BHS|") {
        return unwrap(trimmed);
    }

    let mut messages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in trimmed.split('\r') {
        if line.starts_with("MSH|") && !current.is_empty() {
            flush(&mut current, &mut messages);
        }
        current.push(line);
    }
    flush(&mut current, &mut messages);
    messages
}

/// Collapse `\r\n` and `\n` to `\r`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\r").replace('\n', "\r")
}

fn flush(current: &mut Vec<&str>, messages: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let mut message = current.join("\r");
    message.push('\r');
    messages.push(message);
    current.clear();
}
