//! Tracker XML response parsing.
//!
//! Story searches return `<stories><story>...</story></stories>`; iteration
//! endpoints return `<iterations><iteration>` elements, each carrying a
//! `<finish>` date and its own nested `<stories>`.

use crate::models::{Iteration, Story, StoryState};
use crate::tracker::TrackerError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use roxmltree::{Document, Node};
use tracing::debug;

/// Parse every story in a story search response, in document order.
pub fn parse_stories(xml: &str) -> Result<Vec<Story>, TrackerError> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("story"))
        .map(story_from_node)
        .collect())
}

/// Count the story elements in a response without building stories.
pub fn count_stories(xml: &str) -> Result<usize, TrackerError> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("story"))
        .count())
}

/// Parse an iterations response. Each story is stamped with its own
/// iteration's finish date.
pub fn parse_iterations(xml: &str) -> Result<Vec<Iteration>, TrackerError> {
    let doc = Document::parse(xml)?;
    let iterations = doc
        .descendants()
        .filter(|n| n.has_tag_name("iteration"))
        .map(|node| {
            let finish = child_text(node, "finish").and_then(parse_date);
            let stories = node
                .descendants()
                .filter(|n| n.has_tag_name("story"))
                .map(|s| Story {
                    estimated_date: finish,
                    ..story_from_node(s)
                })
                .collect();
            Iteration { finish, stories }
        })
        .collect();
    Ok(iterations)
}

/// Flatten iterations into their stories, in iteration order.
pub fn stories_from_iterations(xml: &str) -> Result<Vec<Story>, TrackerError> {
    Ok(parse_iterations(xml)?
        .into_iter()
        .flat_map(|i| {
            debug!("Iteration finishing {:?}: {} stories", i.finish, i.stories.len());
            i.stories
        })
        .collect())
}

fn story_from_node(node: Node<'_, '_>) -> Story {
    let text = |name: &str| child_text(node, name).unwrap_or_default().to_string();

    Story {
        id: text("id"),
        story_type: text("story_type"),
        title: child_text(node, "name")
            .or_else(|| child_text(node, "title"))
            .unwrap_or_default()
            .to_string(),
        description: text("description"),
        url: text("url"),
        estimate: parse_estimate(child_text(node, "estimate").unwrap_or_default()),
        owned_by: text("owned_by"),
        current_state: StoryState::from(child_text(node, "current_state").unwrap_or_default()),
        accepted_at: child_text(node, "accepted_at").and_then(parse_timestamp),
        labels: Story::split_labels(child_text(node, "labels").unwrap_or_default()),
        estimated_date: None,
    }
}

/// Text of the first direct child element with the given name.
fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
        .map(str::trim)
}

/// Leading numeric prefix of the field, truncated to whole points.
/// Missing, unparseable, and negative values (the tracker's "unestimated"
/// marker is -1) all count as zero.
fn parse_estimate(raw: &str) -> u32 {
    let raw = raw.trim();
    let end = raw
        .char_indices()
        .find(|(i, c)| {
            !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        })
        .map(|(i, _)| i)
        .unwrap_or(raw.len());

    match raw[..end].parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u32,
        _ => 0,
    }
}

/// Tracker timestamps look like `2010/05/12 09:35:24 UTC`; RFC 3339 is
/// accepted as well.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let naive = raw.trim_end_matches("UTC").trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y/%m/%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    debug!("Ignoring unparseable timestamp: {}", raw);
    None
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split(['T', ' ']).next()?.trim();
    NaiveDate::parse_from_str(day, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORIES: &str = include_str!("../../fixtures/stories.xml");
    const ITERATIONS: &str = include_str!("../../fixtures/iterations.xml");

    #[test]
    fn test_parse_stories_fields() {
        let stories = parse_stories(STORIES).unwrap();
        assert_eq!(stories.len(), 3);

        let first = &stories[0];
        assert_eq!(first.id, "1001");
        assert_eq!(first.story_type, "feature");
        assert_eq!(first.title, "Export invoices as CSV");
        assert_eq!(first.estimate, 3);
        assert_eq!(first.owned_by, "Ada Lovelace");
        assert_eq!(first.current_state, StoryState::Accepted);
        assert_eq!(first.labels, vec!["billing", "export"]);
        assert_eq!(
            first.accepted_at.map(|t| t.to_rfc3339()),
            Some("2024-01-10T16:20:00+00:00".to_string())
        );
        assert_eq!(first.estimated_date, None);
    }

    #[test]
    fn test_parse_stories_defaults() {
        let stories = parse_stories(STORIES).unwrap();

        // Unestimated chore with no owner, labels, or acceptance.
        let chore = &stories[2];
        assert_eq!(chore.estimate, 0);
        assert!(chore.owned_by.is_empty());
        assert!(chore.labels.is_empty());
        assert!(!chore.is_accepted());
        assert_eq!(chore.current_state, StoryState::Unstarted);
    }

    #[test]
    fn test_count_stories() {
        assert_eq!(count_stories(STORIES).unwrap(), 3);
        assert_eq!(count_stories("<stories type=\"array\"/>").unwrap(), 0);
    }

    #[test]
    fn test_parse_iterations_scopes_stories() {
        let iterations = parse_iterations(ITERATIONS).unwrap();
        assert_eq!(iterations.len(), 2);

        assert_eq!(iterations[0].finish, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(iterations[0].stories.len(), 2);
        assert_eq!(iterations[1].stories.len(), 1);

        for story in &iterations[1].stories {
            assert_eq!(story.estimated_date, NaiveDate::from_ymd_opt(2024, 1, 22));
        }
    }

    #[test]
    fn test_stories_from_iterations_flattens() {
        let stories = stories_from_iterations(ITERATIONS).unwrap();
        let ids: Vec<_> = stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2001", "2002", "2003"]);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(matches!(
            parse_stories("<stories><story>"),
            Err(TrackerError::Xml(_))
        ));
    }

    #[test]
    fn test_parse_estimate() {
        assert_eq!(parse_estimate("5"), 5);
        assert_eq!(parse_estimate(" 2.7 "), 2);
        assert_eq!(parse_estimate("3pts"), 3);
        assert_eq!(parse_estimate("+3"), 3);
        assert_eq!(parse_estimate("+"), 0);
        assert_eq!(parse_estimate("-1"), 0);
        assert_eq!(parse_estimate(""), 0);
        assert_eq!(parse_estimate("n/a"), 0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let tracker = parse_timestamp("2024/01/10 16:20:00 UTC").unwrap();
        let rfc = parse_timestamp("2024-01-10T16:20:00Z").unwrap();
        assert_eq!(tracker, rfc);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 22);
        assert_eq!(parse_date("2024/01/22 00:00:00 UTC"), expected);
        assert_eq!(parse_date("2024-01-22T00:00:00Z"), expected);
        assert_eq!(parse_date("soon"), None);
    }
}
