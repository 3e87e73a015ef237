use regex::{Regex, RegexBuilder};

/// Case-insensitive literal matcher for the active search term.
pub fn build_highlight_regex(term: &str) -> Option<Regex> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(trimmed))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Splits `text` into `(is_match, fragment)` runs in order.
pub fn segments<'t>(text: &'t str, regex: Option<&Regex>) -> Vec<(bool, &'t str)> {
    let Some(regex) = regex else {
        return vec![(false, text)];
    };
    let mut out = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        if found.start() > last {
            out.push((false, &text[last..found.start()]));
        }
        out.push((true, found.as_str()));
        last = found.end();
    }
    if last < text.len() || out.is_empty() {
        out.push((false, &text[last..]));
    }
    out
}
