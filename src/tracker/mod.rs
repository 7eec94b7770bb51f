//! Remote tracker API access.
//!
//! `TrackerApi` is the seam between the report builders and the network:
//! it returns raw XML bodies, which the builders parse with the helpers in
//! [`xml`]. `HttpTracker` is the reqwest-backed implementation.

pub mod client;
pub mod error;
pub mod filter;
pub mod xml;

pub use client::HttpTracker;
pub use error::TrackerError;
pub use filter::StoryFilter;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;

/// Which iteration list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationScope {
    /// The iteration in progress.
    Current,
    /// The current iteration followed by the backlog iterations.
    CurrentBacklog,
    /// Finished iterations, counted backwards with negative offsets.
    Done,
}

impl IterationScope {
    pub fn path_segment(&self) -> &'static str {
        match self {
            IterationScope::Current => "current",
            IterationScope::CurrentBacklog => "current_backlog",
            IterationScope::Done => "done",
        }
    }
}

impl fmt::Display for IterationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Read access to a tracker project, one blocking call per query.
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// Story search within a project.
    async fn stories(
        &self,
        project: &str,
        api_key: &str,
        filter: &StoryFilter,
    ) -> Result<String, TrackerError>;

    /// Iteration listing within a project.
    async fn iterations(
        &self,
        project: &str,
        api_key: &str,
        scope: IterationScope,
        limit: Option<u32>,
        offset: Option<i32>,
    ) -> Result<String, TrackerError>;

    /// The iteration in progress.
    async fn this_week(&self, project: &str, api_key: &str) -> Result<String, TrackerError> {
        self.iterations(project, api_key, IterationScope::Current, None, None)
            .await
    }

    /// `limit` backlog iterations after skipping `skip` of them.
    async fn backlog(
        &self,
        project: &str,
        api_key: &str,
        limit: u32,
        skip: u32,
    ) -> Result<String, TrackerError> {
        let offset = i32::try_from(skip).unwrap_or(i32::MAX);
        self.iterations(
            project,
            api_key,
            IterationScope::CurrentBacklog,
            Some(limit),
            Some(offset),
        )
        .await
    }

    /// `limit` finished iterations, `skip` counting backwards from the most
    /// recent one.
    async fn done(
        &self,
        project: &str,
        api_key: &str,
        limit: u32,
        skip: u32,
    ) -> Result<String, TrackerError> {
        let offset = -i32::try_from(skip).unwrap_or(i32::MAX - 1) - 1;
        self.iterations(project, api_key, IterationScope::Done, Some(limit), Some(offset))
            .await
    }

    /// Unscheduled stories.
    async fn icebox(&self, project: &str, api_key: &str) -> Result<String, TrackerError> {
        self.stories(project, api_key, &StoryFilter::new().state("unscheduled"))
            .await
    }

    /// Stories created on or after `date`, narrowed by `extra` terms.
    async fn created_since(
        &self,
        project: &str,
        api_key: &str,
        date: NaiveDate,
        extra: &StoryFilter,
    ) -> Result<String, TrackerError> {
        let filter = StoryFilter::new().created_since(date).and(extra);
        self.stories(project, api_key, &filter).await
    }
}
