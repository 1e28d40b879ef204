use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, PartialEq)]
pub struct ParsedTask {
    pub title: String,
    pub deadline: Option<NaiveDate>,
    pub category: Option<String>,
}

fn deadline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\d{4}-\d{2}-\d{2})\b").expect("valid deadline pattern"))
}

fn category_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"#(?:"([^"]+)"|([\w-]+))"#).expect("valid category pattern"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Formats a category so `parse_task_input` reads it back unchanged.
/// Categories that are not a single word are quoted: `#"Side project"`.
pub fn category_token(category: &str) -> String {
    let simple = !category.is_empty()
        && category
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if simple {
        format!("#{}", category)
    } else {
        // Quotes cannot be nested inside the token
        format!("#\"{}\"", category.replace('"', "'"))
    }
}

/// Pulls `@YYYY-MM-DD` and `#category` (or `#"multi word"`) tokens out of a
/// title line.
pub fn parse_task_input(input: &str) -> ParsedTask {
    let mut deadline = None;
    let mut title = input.to_string();

    // Deadline; impossible dates stay in the title
    for caps in deadline_re().captures_iter(input) {
        if let Some(date_match) = caps.get(1) {
            if let Ok(date) = NaiveDate::parse_from_str(date_match.as_str(), "%Y-%m-%d") {
                if deadline.is_none() {
                    deadline = Some(date);
                }
                title = title.replacen(&caps[0], "", 1);
            }
        }
    }

    // Category
    let category = category_re()
        .captures(&title)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty());
    let title = category_re().replace_all(&title, "").to_string();

    let title = whitespace_re()
        .replace_all(&title, " ")
        .trim()
        .to_string();

    ParsedTask {
        title,
        deadline,
        category,
    }
}
