/// Longest question name the bank accepts before it gets shortened.
pub const QUESTION_NAME_LENGTH: usize = 80;

/// Prepares a raw cell for storage: trims it, escapes HTML markup characters and
/// backslash-escapes quotes. Stems, answers and category names all go through here.
pub fn sanitize(text: &str) -> String {
    add_slashes(&escape_html(text.trim()))
}

/// Escapes `&`, `<` and `>`. Quotes are left for [`add_slashes`].
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn add_slashes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\0' => escaped.push_str("\\0"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Builds the name a question is listed under from its text: tags dropped,
/// whitespace collapsed, cut to [`QUESTION_NAME_LENGTH`] characters.
pub fn default_question_name(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => plain.push(c),
            _ => {}
        }
    }
    let plain = plain.split_whitespace().collect::<Vec<&str>>().join(" ");

    if plain.chars().count() <= QUESTION_NAME_LENGTH {
        return plain;
    }
    let mut shortened: String = plain.chars().take(QUESTION_NAME_LENGTH - 3).collect();
    shortened.truncate(shortened.trim_end().len());
    shortened.push_str("...");
    shortened
}
