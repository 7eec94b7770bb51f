//! Report assembly.
//!
//! Each builder walks the requested projects in order, issuing one tracker
//! call at a time. A failed call never aborts the report: the section it
//! feeds is recorded as empty with a reason and the walk continues.

use crate::analysis::{
    count_by_state, distinct_labels, group_by_owner, rank_owners, tally_owners, top_labels,
    total_points,
};
use crate::models::{
    AcceptedReport, FeaturesReport, Section, SectionReport, StatusReport, Story, StoryState,
};
use crate::report::ReportRequest;
use crate::tracker::xml::{count_stories, parse_stories, stories_from_iterations};
use crate::tracker::{StoryFilter, TrackerApi, TrackerError};
use tracing::{debug, info, warn};

pub const ACCEPTED_TITLE: &str = "Accepted Stories Report";
pub const FEATURES_TITLE: &str = "All Features";
pub const STATUS_TITLE: &str = "Status Report";

/// Collects per-section outcomes while a report is being built.
#[derive(Debug, Default)]
struct SectionLog {
    sections: Vec<SectionReport>,
}

impl SectionLog {
    /// Record a story fetch, yielding its stories or nothing on failure.
    fn stories(
        &mut self,
        section: Section,
        project: &str,
        result: Result<Vec<Story>, TrackerError>,
    ) -> Vec<Story> {
        match result {
            Ok(stories) => {
                self.sections
                    .push(SectionReport::loaded(section, project, stories.len()));
                stories
            }
            Err(e) => {
                self.fail(section, project, &e, e.reason());
                Vec::new()
            }
        }
    }

    fn count(
        &mut self,
        section: Section,
        project: &str,
        result: Result<usize, TrackerError>,
    ) -> Option<usize> {
        match result {
            Ok(count) => {
                self.sections
                    .push(SectionReport::loaded(section, project, count));
                Some(count)
            }
            Err(e) => {
                self.fail(section, project, &e, e.reason());
                None
            }
        }
    }

    fn fail(&mut self, section: Section, project: &str, error: &TrackerError, reason: String) {
        warn!("{} for project {} unavailable: {}", section, project, error);
        self.sections
            .push(SectionReport::empty(section, project, reason));
    }

    fn into_sections(self) -> Vec<SectionReport> {
        self.sections
    }
}

async fn fetch_stories<T>(
    tracker: &T,
    project: &str,
    api_key: &str,
    filter: &StoryFilter,
) -> Result<Vec<Story>, TrackerError>
where
    T: TrackerApi + ?Sized,
{
    let body = tracker.stories(project, api_key, filter).await?;
    parse_stories(&body)
}

/// Stories accepted within the window, who delivered them, which labels
/// they carried, and what is still expected this iteration.
pub async fn build_accepted_report<T>(tracker: &T, request: &ReportRequest) -> AcceptedReport
where
    T: TrackerApi + ?Sized,
{
    let api_key = request.api_key.as_str();
    let mut log = SectionLog::default();
    let mut report = AcceptedReport {
        title: ACCEPTED_TITLE.to_string(),
        days_ago: request.days_ago,
        start_date: Some(request.start_date),
        ..Default::default()
    };
    // Every accepted story returned, duplicates included, feeds the totals.
    let mut accepted_all: Vec<Story> = Vec::new();

    let accepted_filter = StoryFilter::new()
        .state("accepted")
        .include_done(true)
        .modified_since(request.start_date);

    for project in &request.projects {
        let accepted = fetch_stories(tracker, project, api_key, &accepted_filter).await;
        for story in log.stories(Section::AcceptedStories, project, accepted) {
            report.stories.insert(story.id.clone(), story.clone());
            accepted_all.push(story);
        }

        // Informational only: compares a created count against the
        // accepted count so far.
        let created = tracker
            .created_since(project, api_key, request.start_date, &StoryFilter::new())
            .await
            .and_then(|body| count_stories(&body));
        if let Some(count) = log.count(Section::CreatedCount, project, created) {
            report.created_stories += count;
            report.improved = Some(report.created_stories < report.stories.len());
        }

        let this_week = tracker
            .this_week(project, api_key)
            .await
            .and_then(|body| stories_from_iterations(&body));
        for story in log.stories(Section::Upcoming, project, this_week) {
            if !story.is_accepted() {
                report.upcoming_stories.push(story);
            }
        }
    }

    report.story_points = total_points(&accepted_all);
    report.upcoming_story_counts = count_by_state(&report.upcoming_stories);
    report.top_labels = top_labels(report.stories.values());
    report.top_owners = rank_owners(tally_owners(&accepted_all).into_values());
    report.sections = log.into_sections();

    info!(
        "Accepted report: {} stories, {} points, {} owners across {} projects",
        report.stories.len(),
        report.story_points,
        report.top_owners.len(),
        request.projects.len()
    );

    report
}

/// Recent stories grouped under every label in use across the projects.
pub async fn build_features_report<T>(tracker: &T, request: &ReportRequest) -> FeaturesReport
where
    T: TrackerApi + ?Sized,
{
    let api_key = request.api_key.as_str();
    let mut log = SectionLog::default();
    let mut report = FeaturesReport {
        title: FEATURES_TITLE.to_string(),
        ..Default::default()
    };

    let mut all_stories = Vec::new();
    for project in &request.projects {
        let result = fetch_stories(tracker, project, api_key, &StoryFilter::new()).await;
        all_stories.extend(log.stories(Section::AllStories, project, result));
    }

    // One label set for the whole request, so each label is fetched once
    // per project.
    report.labels = distinct_labels(&all_stories);
    debug!("Features report: {} distinct labels", report.labels.len());

    for label in &report.labels {
        let filter = StoryFilter::new()
            .label(label)
            .modified_since(request.start_date);
        let bucket = report.label_stories.entry(label.clone()).or_default();

        for project in &request.projects {
            match fetch_stories(tracker, project, api_key, &filter).await {
                Ok(stories) => {
                    log.sections.push(SectionReport::loaded(
                        Section::LabelStories,
                        project,
                        stories.len(),
                    ));
                    bucket.extend(stories);
                }
                Err(e) => {
                    let reason = format!("{} (label {})", e.reason(), label);
                    log.fail(Section::LabelStories, project, &e, reason);
                }
            }
        }
    }

    report.sections = log.into_sections();
    report
}

/// What finished recently, what's in flight, and what's queued behind it.
pub async fn build_status_report<T>(tracker: &T, request: &ReportRequest) -> StatusReport
where
    T: TrackerApi + ?Sized,
{
    let api_key = request.api_key.as_str();
    let mut log = SectionLog::default();
    let mut report = StatusReport {
        title: STATUS_TITLE.to_string(),
        ..Default::default()
    };
    let unscheduled = StoryFilter::new().state("unscheduled");

    for project in &request.projects {
        if request.include_done {
            let done = tracker
                .done(project, api_key, request.done_iterations, 0)
                .await
                .and_then(|body| stories_from_iterations(&body));
            let (accepted, delivered): (Vec<Story>, Vec<Story>) = log
                .stories(Section::Done, project, done)
                .into_iter()
                .partition(Story::is_accepted);
            report.done_stories.extend(accepted);
            for (owner, stories) in group_by_owner(delivered) {
                report
                    .recently_delivered_by_owner
                    .entry(owner)
                    .or_default()
                    .extend(stories);
            }
        }

        let this_week = tracker
            .this_week(project, api_key)
            .await
            .and_then(|body| stories_from_iterations(&body));
        for story in log.stories(Section::ThisWeek, project, this_week) {
            if story.current_state == StoryState::Unstarted {
                report.next_up_stories.push(story);
            } else {
                report.current_stories.push(story);
            }
        }

        let logged = tracker
            .created_since(project, api_key, request.start_date, &unscheduled)
            .await
            .and_then(|body| parse_stories(&body));
        report
            .recently_logged_stories
            .extend(log.stories(Section::RecentlyLogged, project, logged));

        if request.include_backlog {
            let backlog = tracker
                .backlog(
                    project,
                    api_key,
                    request.backlog_iterations,
                    request.backlog_skip,
                )
                .await
                .and_then(|body| stories_from_iterations(&body));
            report
                .backlog_stories
                .extend(log.stories(Section::Backlog, project, backlog));
        }

        if request.include_icebox {
            let room = request.icebox_limit.saturating_sub(report.icebox.len());
            if room == 0 {
                debug!("Icebox full, skipping project {}", project);
            } else {
                let icebox = tracker
                    .icebox(project, api_key)
                    .await
                    .and_then(|body| parse_stories(&body));
                let stories = log.stories(Section::Icebox, project, icebox);
                report.icebox.extend(stories.into_iter().take(room));
            }
        }
    }

    report.done_points = total_points(&report.done_stories);
    report.current_points = total_points(&report.current_stories);
    report.next_points = total_points(&report.next_up_stories);
    report.sections = log.into_sections();

    info!(
        "Status report: {} done, {} current, {} next up, {} icebox across {} projects",
        report.done_stories.len(),
        report.current_stories.len(),
        report.next_up_stories.len(),
        report.icebox.len(),
        request.projects.len()
    );

    report
}
