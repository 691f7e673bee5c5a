use inlinable_string::{InlinableString, StringExt};

pub fn char_to_string(c: char) -> InlinableString {
    let mut s = InlinableString::new();
    s.push(c);
    s
}

// Strip leading and trailing derivative marks, returning the remaining text and how many were removed
pub fn strip_primes(input: &str) -> (&str, usize) {
    let trimmed = input.trim();
    let body = trimmed.trim_matches('\'');
    let order = trimmed.chars().count() - body.chars().count();
    (body.trim(), order)
}
