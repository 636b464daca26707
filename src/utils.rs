// Telegram MarkdownV2 escaping helpers.

/// Escapes every character MarkdownV2 treats as special, for text placed
/// outside code entities.
pub fn escape_markdown_v2(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for ch in text.chars() {
        if special_chars.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }

    result
}

/// Inside a ``` code fence only backslash and backtick are special.
pub fn escape_code_fence(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\\' || ch == '`' {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}
