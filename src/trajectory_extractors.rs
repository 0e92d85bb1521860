//! Field extractors for a single `div.user-trajectory` block.
//!
//! The trajectories page belongs to a third party, so every extractor stands on
//! its own: a missing piece of markup costs one field, never the whole record.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::markup::MarkupFragment;
use crate::text_manipulators::extract_minutes;

const TRAJECTORY_ID_MARKER: &str = "traject-";

static TRAVEL_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) min\.").expect("travel time pattern is valid"));

static DELAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) min\. vertraging").expect("delay pattern is valid"));

/// Id taken from the link inside `div.details`, e.g. `/account/traject-123` gives `123`.
pub fn extract_trajectory_id<F: MarkupFragment>(fragment: &F) -> Option<String> {
    let details = fragment.first_match("div", Some("details"))?;
    let href = details.first_match("a", None)?.attribute("href")?;
    let (_, id) = href.rsplit_once(TRAJECTORY_ID_MARKER)?;
    Some(id.to_string())
}

pub fn extract_title<F: MarkupFragment>(fragment: &F) -> Option<String> {
    fragment.first_match("h3", None).map(|h3| h3.trimmed_text())
}

pub fn extract_description<F: MarkupFragment>(fragment: &F) -> Option<String> {
    fragment
        .first_match("div", Some("points"))
        .map(|points| points.trimmed_text())
}

/// Current travel time in minutes, read from `<N> min.`.
pub fn extract_actual_travel_time<F: MarkupFragment>(fragment: &F) -> Option<u32> {
    let element = fragment.first_match("span", Some("actual-travel-time"))?;
    let text = element.text_content();
    let minutes = extract_minutes(&TRAVEL_TIME_RE, &text);
    if minutes.is_none() {
        debug!("Travel time element without a minute count: {:?}", text.trim());
    }
    minutes
}

/// Delay in minutes, read from `<N> min. vertraging`. No delay element means no delay;
/// callers turn `None` into 0.
pub fn extract_delay<F: MarkupFragment>(fragment: &F) -> Option<u32> {
    let element = fragment.first_match("span", Some("text-danger"))?;
    extract_minutes(&DELAY_RE, &element.text_content())
}
