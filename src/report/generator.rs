//! HTML report generation.
//!
//! This module renders the three report models as standalone HTML pages
//! (`index`, `features`, `status`) and as JSON.

use crate::models::{
    degraded_sections, AcceptedReport, FeaturesReport, SectionOutcome, SectionReport,
    StatusReport, Story,
};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Icon path for a story type.
pub fn type_to_img(story_type: &str) -> String {
    format!("/{}.png", story_type)
}

/// Story title linking to the tracker, with the description as tooltip.
pub fn friendly_title(story: &Story) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" title=\"{}\">{}</a>",
        escape_html(&story.url),
        escape_html(&story.description),
        escape_html(&story.title)
    )
}

/// Heading for the recently completed table.
pub fn done_stories_table_header(done_stories: &[Story], done_points: u64) -> String {
    format!(
        "Recently Completed: {} stories, {} points",
        done_stories.len(),
        done_points
    )
}

fn owner_name(owner: &str) -> &str {
    if owner.is_empty() {
        "Unassigned"
    } else {
        owner
    }
}

/// Render the accepted stories report (`index` view).
pub fn generate_index_page(report: &AcceptedReport) -> String {
    let mut body = String::new();

    let since = report
        .start_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    body.push_str(&format!(
        "<p class=\"summary\">{} stories accepted, {} points, since {} ({} days)</p>\n",
        report.stories.len(),
        report.story_points,
        since,
        report.days_ago
    ));

    // Owners
    body.push_str("<h2>Top Owners</h2>\n");
    if report.top_owners.is_empty() {
        body.push_str("<p class=\"empty\">No accepted work.</p>\n");
    } else {
        body.push_str("<table class=\"owners\">\n<tr><th>Owner</th><th>Points</th><th>Stories</th></tr>\n");
        for owner in &report.top_owners {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(owner_name(&owner.owner)),
                owner.points_count,
                owner.story_count
            ));
        }
        body.push_str("</table>\n");
    }

    // Labels
    body.push_str("<h2>Top Labels</h2>\n");
    if report.top_labels.is_empty() {
        body.push_str("<p class=\"empty\">No labeled work.</p>\n");
    } else {
        body.push_str("<table class=\"labels\">\n<tr><th>Label</th><th>Weight</th></tr>\n");
        for (label, weight) in &report.top_labels {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{:.1}</td></tr>\n",
                escape_html(label),
                weight
            ));
        }
        body.push_str("</table>\n");
    }

    // Accepted stories, most recent first
    let mut accepted: Vec<&Story> = report.stories.values().collect();
    accepted.sort_by(|a, b| b.accepted_at.cmp(&a.accepted_at).then_with(|| a.id.cmp(&b.id)));
    body.push_str("<h2>Accepted Stories</h2>\n");
    body.push_str(&generate_story_list(accepted));

    // Upcoming
    body.push_str("<h2>Upcoming This Iteration</h2>\n");
    if !report.upcoming_story_counts.is_empty() {
        body.push_str("<ul class=\"state-counts\">\n");
        for (state, count) in &report.upcoming_story_counts {
            body.push_str(&format!("<li>{}: {}</li>\n", state, count));
        }
        body.push_str("</ul>\n");
    }
    body.push_str(&generate_story_list(&report.upcoming_stories));

    generate_layout(&report.title, &report.sections, &body)
}

/// Render the features report (`features` view).
pub fn generate_features_page(report: &FeaturesReport) -> String {
    let mut body = String::new();

    if report.labels.is_empty() {
        body.push_str("<p class=\"empty\">No labels in use.</p>\n");
    }

    for label in &report.labels {
        body.push_str(&format!("<h2>{}</h2>\n", escape_html(label)));
        let stories = report
            .label_stories
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or_default();
        body.push_str(&generate_story_list(stories));
    }

    generate_layout(&report.title, &report.sections, &body)
}

/// Render the status report (`status` view).
pub fn generate_status_page(report: &StatusReport) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<h2>{}</h2>\n",
        done_stories_table_header(&report.done_stories, report.done_points)
    ));
    body.push_str(&generate_story_list(&report.done_stories));

    body.push_str("<h2>Recently Delivered</h2>\n");
    body.push_str(&generate_owner_groups(&report.recently_delivered_by_owner));

    body.push_str(&format!(
        "<h2>Current: {} stories, {} points</h2>\n",
        report.current_stories.len(),
        report.current_points
    ));
    body.push_str(&generate_story_list(&report.current_stories));

    body.push_str(&format!(
        "<h2>Next Up: {} stories, {} points</h2>\n",
        report.next_up_stories.len(),
        report.next_points
    ));
    body.push_str(&generate_story_list(&report.next_up_stories));

    body.push_str("<h2>Recently Logged</h2>\n");
    body.push_str(&generate_story_list(&report.recently_logged_stories));

    body.push_str("<h2>Backlog</h2>\n");
    body.push_str(&generate_story_list(&report.backlog_stories));

    body.push_str("<h2>Icebox</h2>\n");
    body.push_str(&generate_story_list(&report.icebox));

    generate_layout(&report.title, &report.sections, &body)
}

/// Generate a list of stories.
fn generate_story_list<'a, I>(stories: I) -> String
where
    I: IntoIterator<Item = &'a Story>,
{
    let items: Vec<String> = stories.into_iter().map(generate_story_item).collect();
    if items.is_empty() {
        return "<p class=\"empty\">None.</p>\n".to_string();
    }

    let mut list = String::from("<ul class=\"stories\">\n");
    for item in items {
        list.push_str(&item);
    }
    list.push_str("</ul>\n");
    list
}

/// Generate one story line: icon, linked title, owner, points, labels.
fn generate_story_item(story: &Story) -> String {
    let mut item = String::from("<li class=\"story\">");

    if !story.story_type.is_empty() {
        item.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\"/> ",
            escape_html(&type_to_img(&story.story_type)),
            escape_html(&story.story_type)
        ));
    }
    item.push_str(&friendly_title(story));
    item.push_str(&format!(
        " <span class=\"owner\">{}</span> <span class=\"points\">{} pts</span>",
        escape_html(owner_name(&story.owned_by)),
        story.estimate
    ));
    if let Some(date) = story.estimated_date {
        item.push_str(&format!(
            " <span class=\"due\">{}</span>",
            date.format("%b %-d")
        ));
    }
    for label in &story.labels {
        item.push_str(&format!(" <span class=\"label\">{}</span>", escape_html(label)));
    }

    item.push_str("</li>\n");
    item
}

/// Generate stories grouped under owner headings.
fn generate_owner_groups(groups: &BTreeMap<String, Vec<Story>>) -> String {
    if groups.is_empty() {
        return "<p class=\"empty\">None.</p>\n".to_string();
    }

    let mut section = String::new();
    for (owner, stories) in groups {
        section.push_str(&format!("<h3>{}</h3>\n", escape_html(owner_name(owner))));
        section.push_str(&generate_story_list(stories));
    }
    section
}

/// Notice listing sections whose data could not be fetched.
fn generate_degraded_notice(sections: &[SectionReport]) -> String {
    let degraded = degraded_sections(sections);
    if degraded.is_empty() {
        return String::new();
    }

    let mut notice = String::from(
        "<div class=\"degraded\">\n<p>Some data could not be loaded and is missing from this report:</p>\n<ul>\n",
    );
    for report in degraded {
        if let SectionOutcome::Empty { ref reason } = report.outcome {
            notice.push_str(&format!(
                "<li>{} (project {}): {}</li>\n",
                report.section,
                escape_html(&report.project),
                escape_html(reason)
            ));
        }
    }
    notice.push_str("</ul>\n</div>\n");
    notice
}

/// Wrap a page body in the shared layout.
fn generate_layout(title: &str, sections: &[SectionReport], body: &str) -> String {
    let mut page = String::new();

    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n");
    page.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    page.push_str("<link rel=\"stylesheet\" href=\"/style.css\"/>\n</head>\n<body>\n");
    page.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
    page.push_str(&generate_degraded_notice(sections));
    page.push_str(body);
    page.push_str("</body>\n</html>\n");

    page
}

/// Generate a JSON report.
pub fn generate_json_report<R: Serialize>(report: &R) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OwnerWork, Section, StoryState};
    use chrono::NaiveDate;

    fn story(id: &str, title: &str, estimate: u32) -> Story {
        Story {
            id: id.to_string(),
            story_type: "feature".to_string(),
            title: title.to_string(),
            description: "Details".to_string(),
            url: format!("https://tracker.example/story/{}", id),
            estimate,
            owned_by: "Ada".to_string(),
            current_state: StoryState::Accepted,
            ..Default::default()
        }
    }

    #[test]
    fn test_done_stories_table_header() {
        let stories: Vec<Story> = (0..5).map(|i| story(&i.to_string(), "s", 1)).collect();
        assert_eq!(
            done_stories_table_header(&stories, 13),
            "Recently Completed: 5 stories, 13 points"
        );
    }

    #[test]
    fn test_friendly_title_escapes() {
        let mut s = story("7", "Fix <script> & \"quotes\"", 1);
        s.description = "O'Brien".to_string();

        let html = friendly_title(&s);
        assert!(html.starts_with("<a href=\"https://tracker.example/story/7\" target=\"_blank\""));
        assert!(html.contains("title=\"O&#39;Brien\""));
        assert!(html.contains("Fix &lt;script&gt; &amp; &quot;quotes&quot;"));
    }

    #[test]
    fn test_type_to_img() {
        assert_eq!(type_to_img("bug"), "/bug.png");
    }

    #[test]
    fn test_generate_index_page() {
        let mut report = AcceptedReport {
            title: "Accepted Stories Report".to_string(),
            days_ago: 7,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 8),
            story_points: 3,
            top_labels: vec![("billing".to_string(), 1.5)],
            top_owners: vec![OwnerWork {
                owner: "Ada".to_string(),
                points_count: 3,
                story_count: 1,
            }],
            ..Default::default()
        };
        report
            .stories
            .insert("1".to_string(), story("1", "Export CSV", 3));

        let html = generate_index_page(&report);
        assert!(html.contains("<title>Accepted Stories Report</title>"));
        assert!(html.contains("1 stories accepted, 3 points, since 2024-01-08 (7 days)"));
        assert!(html.contains("<td>Ada</td><td>3</td><td>1</td>"));
        assert!(html.contains("<td>billing</td><td>1.5</td>"));
        assert!(html.contains("Export CSV"));
        assert!(html.contains("/feature.png"));
        assert!(!html.contains("class=\"degraded\""));
    }

    #[test]
    fn test_generate_status_page_sections() {
        let mut delivered = story("2", "Delivered thing", 2);
        delivered.owned_by = String::new();

        let report = StatusReport {
            title: "Status Report".to_string(),
            done_stories: vec![story("1", "Done thing", 3)],
            done_points: 3,
            recently_delivered_by_owner: [(String::new(), vec![delivered])].into_iter().collect(),
            sections: vec![SectionReport::empty(Section::Icebox, "42", "tracker returned HTTP 500")],
            ..Default::default()
        };

        let html = generate_status_page(&report);
        assert!(html.contains("<h2>Recently Completed: 1 stories, 3 points</h2>"));
        assert!(html.contains("<h3>Unassigned</h3>"));
        assert!(html.contains("Current: 0 stories, 0 points"));
        assert!(html.contains("class=\"degraded\""));
        assert!(html.contains("<li>Icebox (project 42): tracker returned HTTP 500</li>"));
    }

    #[test]
    fn test_generate_features_page() {
        let report = FeaturesReport {
            title: "All Features".to_string(),
            labels: vec!["search".to_string(), "ui".to_string()],
            label_stories: [("search".to_string(), vec![story("1", "Fuzzy search", 2)])]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let html = generate_features_page(&report);
        assert!(html.contains("<h2>search</h2>"));
        assert!(html.contains("Fuzzy search"));
        assert!(html.contains("<h2>ui</h2>\n<p class=\"empty\">None.</p>"));
    }

    #[test]
    fn test_story_item_shows_estimated_date() {
        let mut s = story("3", "Backlog item", 1);
        s.estimated_date = NaiveDate::from_ymd_opt(2024, 1, 22);
        assert!(generate_story_item(&s).contains("<span class=\"due\">Jan 22</span>"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = StatusReport {
            title: "Status Report".to_string(),
            ..Default::default()
        };
        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"title\": \"Status Report\""));
        assert!(json.contains("\"icebox\""));
    }
}
