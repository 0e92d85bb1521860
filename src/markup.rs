//! A small view over parsed HTML that the field extractors are written against.
//!
//! The extractors only need to look things up by tag and marker class, read an
//! attribute and read text, so that is all this trait exposes. The `scraper`
//! implementation below is the one used at runtime.

use scraper::{ElementRef, Selector};

use crate::text_manipulators::extract_text;

pub trait MarkupFragment: Sized {
    /// First descendant element named `tag`, optionally carrying the marker `class`.
    fn first_match(&self, tag: &str, class: Option<&str>) -> Option<Self>;

    /// Every descendant element named `tag` (and carrying `class`, if given), in document order.
    fn all_matches(&self, tag: &str, class: Option<&str>) -> Vec<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    fn text_content(&self) -> String;

    fn trimmed_text(&self) -> String {
        self.text_content().trim().to_string()
    }
}

fn selector_for(tag: &str, class: Option<&str>) -> Option<Selector> {
    let css = match class {
        Some(class) => format!("{tag}.{class}"),
        None => tag.to_string(),
    };
    Selector::parse(&css).ok()
}

impl<'a> MarkupFragment for ElementRef<'a> {
    fn first_match(&self, tag: &str, class: Option<&str>) -> Option<Self> {
        let selector = selector_for(tag, class)?;
        self.select(&selector).next()
    }

    fn all_matches(&self, tag: &str, class: Option<&str>) -> Vec<Self> {
        match selector_for(tag, class) {
            Some(selector) => self.select(&selector).collect(),
            None => vec![],
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn text_content(&self) -> String {
        extract_text(*self)
    }
}
