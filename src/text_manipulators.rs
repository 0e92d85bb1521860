use regex::Regex;
use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Pulls the number captured by the first group of `pattern` out of `text`.
pub fn extract_minutes(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}
