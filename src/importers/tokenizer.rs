//! Delimited-text tokenizer shared by the CSV dialects
//!
//! Splits one line on commas while honoring `"` quoting and `""` escapes.
//! Every field is trimmed. An unterminated quote swallows the rest of the line
//! into the open field. Empty input still yields one (empty) field so row
//! widths stay predictable for offset arithmetic.

/// Split a single line into trimmed fields
pub fn tokenize(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Tokenize every line of a document
pub fn tokenize_document(text: &str) -> Vec<Vec<String>> {
    text.lines().map(tokenize).collect()
}

/// ---------------------------------------------------------------------------
/// Cell helpers
/// ---------------------------------------------------------------------------

/// Cell at `index`, or "" when the row is too short
pub fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map(String::as_str).unwrap_or("")
}

/// Digits of the segment before the first `-` ("6-8" -> 6, "10/side" -> 10)
pub fn leading_count(raw: &str) -> Option<u32> {
    let head = raw.split('-').next().unwrap_or("");
    let digits: String = head.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.to_lowercase().starts_with(&prefix.to_lowercase())
}
