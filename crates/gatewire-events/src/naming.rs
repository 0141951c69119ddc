//! Naming rule mapping declared variant names to wire discriminator tags.

/// Convert a PascalCase variant name to its UPPER_SNAKE_CASE wire tag.
///
/// A separator goes before every uppercase letter that follows a lowercase
/// letter or digit, and before the last capital of an acronym run when that
/// capital starts a lowercase word (`HTTPRequest` → `HTTP_REQUEST`). A capital
/// run at the end of the name stays joined (`SessionID` → `SESSION_ID`).
pub fn tag_of(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut tag = String::with_capacity(name.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                tag.push('_');
            }
        }
        tag.extend(c.to_uppercase());
    }
    tag
}
