//! Data models for the tracker reports.
//!
//! This module contains the core data structures shared by the fetch
//! adapter, the aggregator and the views: stories, per-owner tallies,
//! section outcomes, and the three report models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Lifecycle state of a story.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StoryState {
    Unscheduled,
    Unstarted,
    Started,
    Finished,
    Delivered,
    Rejected,
    Accepted,
    /// Any state string the tracker sends that we don't model.
    #[default]
    Unknown,
}

impl fmt::Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryState::Unscheduled => write!(f, "unscheduled"),
            StoryState::Unstarted => write!(f, "unstarted"),
            StoryState::Started => write!(f, "started"),
            StoryState::Finished => write!(f, "finished"),
            StoryState::Delivered => write!(f, "delivered"),
            StoryState::Rejected => write!(f, "rejected"),
            StoryState::Accepted => write!(f, "accepted"),
            StoryState::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for StoryState {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "unscheduled" => StoryState::Unscheduled,
            "unstarted" => StoryState::Unstarted,
            "started" => StoryState::Started,
            "finished" => StoryState::Finished,
            "delivered" => StoryState::Delivered,
            "rejected" => StoryState::Rejected,
            "accepted" => StoryState::Accepted,
            _ => StoryState::Unknown,
        }
    }
}

/// A single tracked work item, built from one `<story>` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Tracker identifier, unique within a report run.
    pub id: String,
    /// feature, bug, chore or release.
    pub story_type: String,
    pub title: String,
    pub description: String,
    pub url: String,
    /// Points; never negative.
    pub estimate: u32,
    /// Owner display name; empty when unassigned.
    pub owned_by: String,
    pub current_state: StoryState,
    /// `None` means the story has not been accepted yet.
    pub accepted_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    /// Set only for stories read out of an iteration (its finish date).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_date: Option<NaiveDate>,
}

impl Story {
    /// Returns true once the tracker has recorded an acceptance time.
    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }

    /// Splits a raw label list ("a, b,c") into trimmed, non-empty labels.
    pub fn split_labels(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Running totals for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerWork {
    pub owner: String,
    pub points_count: u64,
    pub story_count: usize,
}

impl OwnerWork {
    /// Creates an empty tally for an owner.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            points_count: 0,
            story_count: 0,
        }
    }

    /// Adds one story's estimate to this owner's totals.
    pub fn increment(&mut self, estimate: u32) {
        self.points_count += u64::from(estimate);
        self.story_count += 1;
    }
}

/// One iteration as returned by the tracker, with its nested stories.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub finish: Option<NaiveDate>,
    pub stories: Vec<Story>,
}

/// Which part of a report a fetch contributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    AcceptedStories,
    CreatedCount,
    Upcoming,
    AllStories,
    LabelStories,
    Done,
    ThisWeek,
    RecentlyLogged,
    Backlog,
    Icebox,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::AcceptedStories => write!(f, "Accepted stories"),
            Section::CreatedCount => write!(f, "Created stories count"),
            Section::Upcoming => write!(f, "Upcoming stories"),
            Section::AllStories => write!(f, "All stories"),
            Section::LabelStories => write!(f, "Label stories"),
            Section::Done => write!(f, "Recently completed"),
            Section::ThisWeek => write!(f, "This week"),
            Section::RecentlyLogged => write!(f, "Recently logged"),
            Section::Backlog => write!(f, "Backlog"),
            Section::Icebox => write!(f, "Icebox"),
        }
    }
}

/// Result of one section fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    /// The fetch succeeded and contributed `count` stories.
    Loaded { count: usize },
    /// The fetch failed; the section contributed nothing.
    Empty { reason: String },
}

/// Outcome of one section for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReport {
    pub section: Section,
    pub project: String,
    pub outcome: SectionOutcome,
}

impl SectionReport {
    pub fn loaded(section: Section, project: &str, count: usize) -> Self {
        Self {
            section,
            project: project.to_string(),
            outcome: SectionOutcome::Loaded { count },
        }
    }

    pub fn empty(section: Section, project: &str, reason: impl Into<String>) -> Self {
        Self {
            section,
            project: project.to_string(),
            outcome: SectionOutcome::Empty {
                reason: reason.into(),
            },
        }
    }

    /// Returns true when the section's fetch failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, SectionOutcome::Empty { .. })
    }
}

/// Accepted stories report (`index` view).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptedReport {
    pub title: String,
    pub days_ago: i64,
    pub start_date: Option<NaiveDate>,
    /// Accepted stories keyed by id; the last project wins on duplicates.
    pub stories: HashMap<String, Story>,
    pub story_points: u64,
    pub created_stories: usize,
    /// `None` until a created-since count has been fetched successfully.
    pub improved: Option<bool>,
    pub upcoming_stories: Vec<Story>,
    pub upcoming_story_counts: BTreeMap<StoryState, usize>,
    pub top_labels: Vec<(String, f64)>,
    pub top_owners: Vec<OwnerWork>,
    pub sections: Vec<SectionReport>,
}

/// Features/labels report (`features` view).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesReport {
    pub title: String,
    /// Distinct labels in first-seen order.
    pub labels: Vec<String>,
    pub label_stories: BTreeMap<String, Vec<Story>>,
    pub sections: Vec<SectionReport>,
}

/// Current status report (`status` view).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub title: String,
    pub done_stories: Vec<Story>,
    pub done_points: u64,
    pub current_stories: Vec<Story>,
    pub current_points: u64,
    pub next_up_stories: Vec<Story>,
    pub next_points: u64,
    pub recently_delivered_by_owner: BTreeMap<String, Vec<Story>>,
    pub recently_logged_stories: Vec<Story>,
    pub backlog_stories: Vec<Story>,
    pub icebox: Vec<Story>,
    pub sections: Vec<SectionReport>,
}

/// Returns the sections that failed, for the degraded-data notice.
pub fn degraded_sections(sections: &[SectionReport]) -> Vec<&SectionReport> {
    sections.iter().filter(|s| s.is_degraded()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_state_from_str() {
        assert_eq!(StoryState::from("accepted"), StoryState::Accepted);
        assert_eq!(StoryState::from("Unstarted"), StoryState::Unstarted);
        assert_eq!(StoryState::from(" delivered "), StoryState::Delivered);
        assert_eq!(StoryState::from("planned"), StoryState::Unknown);
    }

    #[test]
    fn test_story_state_display_round_trips() {
        for state in [
            StoryState::Unscheduled,
            StoryState::Unstarted,
            StoryState::Started,
            StoryState::Finished,
            StoryState::Delivered,
            StoryState::Accepted,
        ] {
            assert_eq!(StoryState::from(state.to_string().as_str()), state);
        }
    }

    #[test]
    fn test_split_labels() {
        assert_eq!(
            Story::split_labels("billing, search ,,ui"),
            vec!["billing", "search", "ui"]
        );
        assert!(Story::split_labels("").is_empty());
        assert!(Story::split_labels(" , ").is_empty());
    }

    #[test]
    fn test_owner_work_increment() {
        let mut work = OwnerWork::new("Ada");
        work.increment(3);
        work.increment(0);
        work.increment(5);
        assert_eq!(work.points_count, 8);
        assert_eq!(work.story_count, 3);
    }

    #[test]
    fn test_owner_work_increment_order_independent() {
        let estimates = [1, 2, 3, 5, 8];

        let mut forward = OwnerWork::new("Ada");
        estimates.iter().for_each(|e| forward.increment(*e));

        let mut backward = OwnerWork::new("Ada");
        estimates.iter().rev().for_each(|e| backward.increment(*e));

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_section_report_degraded() {
        let ok = SectionReport::loaded(Section::Icebox, "42", 3);
        let failed = SectionReport::empty(Section::Icebox, "42", "connection refused");
        assert!(!ok.is_degraded());
        assert!(failed.is_degraded());

        let sections = vec![ok, failed];
        let degraded = degraded_sections(&sections);
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].project, "42");
    }

    #[test]
    fn test_section_outcome_serializes_tagged() {
        let report = SectionReport::empty(Section::CreatedCount, "7", "timeout");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"section\":\"created_count\""));
        assert!(json.contains("\"status\":\"empty\""));
        assert!(json.contains("\"reason\":\"timeout\""));
    }
}
