//! Text normalization
//!
//! Title and ingredients are folded into one lower-case string containing only
//! word characters separated by single spaces. Keyword matching runs on this
//! form, so keywords in the rule table must already be normalized.

/// Word character: Unicode alphanumeric or underscore
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Combine title and ingredients into normalized text
///
/// Missing fields count as empty. Every character that is neither a word
/// character nor whitespace becomes a space, whitespace runs collapse to one
/// space, and the result is trimmed. Never fails; may return an empty string.
///
/// ```
/// use recipe_tagger::normalize::normalize;
///
/// let text = normalize(Some("Mac & Cheese!"), Some("['elbow pasta', 'cheddar']"));
/// assert_eq!(text, "mac cheese elbow pasta cheddar");
/// assert_eq!(normalize(None, None), "");
/// ```
pub fn normalize(title: Option<&str>, ingredients: Option<&str>) -> String {
    let title = title.unwrap_or_default();
    let ingredients = ingredients.unwrap_or_default();

    let mut out = String::with_capacity(title.len() + ingredients.len() + 1);
    let mut pending_space = false;

    for c in title.chars().chain(std::iter::once(' ')).chain(ingredients.chars()) {
        for lower in c.to_lowercase() {
            if is_word_char(lower) {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(lower);
            } else {
                pending_space = true;
            }
        }
    }

    out
}
