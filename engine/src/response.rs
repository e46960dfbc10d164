//! Best-effort extraction of the `"message"` field from server responses.
//!
//! Error bodies from the upload endpoint are usually small JSON objects like
//! `{"success":false,"message":"disk full"}`, but nothing guarantees they are
//! well formed. The scanner below only looks for the key, a colon and a
//! quoted string, so truncated or otherwise malformed bodies still yield a
//! message when one is visibly present and `None` otherwise.

const MESSAGE_KEY: &str = "\"message\"";

/// Find the first `"message": "<text>"` pair in `body` and return `<text>`.
///
/// Backslash escapes inside the string are honoured: `\"`, `\\` and `\/`
/// map to the escaped character, `\n`, `\t` and `\r` to their control
/// characters, and any other escaped character is kept as-is. An
/// unterminated string yields `None`.
pub fn extract_message(body: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find(MESSAGE_KEY) {
        let after_key = search_from + offset + MESSAGE_KEY.len();
        if let Some(message) = value_after_key(&body[after_key..]) {
            return Some(message);
        }
        search_from = after_key;
    }
    None
}

/// Parse `: "<text>"` at the start of `rest`, tolerating whitespace.
fn value_after_key(rest: &str) -> Option<String> {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(':')?;
    let rest = rest.trim_start();
    let mut chars = rest.strip_prefix('"')?.chars();

    let mut message = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(message),
            '\\' => match chars.next()? {
                'n' => message.push('\n'),
                't' => message.push('\t'),
                'r' => message.push('\r'),
                other => message.push(other),
            },
            other => message.push(other),
        }
    }
    None
}
