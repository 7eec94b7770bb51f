//! Per-request report parameters.
//!
//! Everything a report builder needs about one incoming request is
//! resolved here once and passed down explicitly.

use crate::config::ReportConfig;
use chrono::{Days, NaiveDate};

/// Raw query string parameters shared by the report routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportParams {
    pub days_ago: Option<String>,
    pub icebox: Option<String>,
    pub done: Option<String>,
    pub backlog: Option<String>,
    pub format: Option<String>,
}

/// Response encoding requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

impl ReportParams {
    /// Collect the known parameters from decoded query pairs. A repeated
    /// key keeps its last value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "days_ago" => &mut params.days_ago,
                "icebox" => &mut params.icebox,
                "done" => &mut params.done,
                "backlog" => &mut params.backlog,
                "format" => &mut params.format,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Html,
        }
    }
}

/// Resolved parameters for one report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Deduplicated project ids, in request order.
    pub projects: Vec<String>,
    pub api_key: String,
    pub days_ago: i64,
    /// `today - days_ago`; the modified/created-since window start.
    pub start_date: NaiveDate,
    pub include_icebox: bool,
    pub include_done: bool,
    pub include_backlog: bool,
    pub icebox_limit: usize,
    pub backlog_iterations: u32,
    pub backlog_skip: u32,
    pub done_iterations: u32,
}

impl ReportRequest {
    pub fn new(
        projects: &str,
        api_key: &str,
        params: &ReportParams,
        today: NaiveDate,
        defaults: &ReportConfig,
    ) -> Self {
        let days_ago = parse_days_ago(params.days_ago.as_deref(), defaults.default_days_ago);
        let start_date = today
            .checked_sub_days(Days::new(days_ago.unsigned_abs()))
            .unwrap_or(NaiveDate::MIN);

        Self {
            projects: parse_projects(projects),
            api_key: api_key.to_string(),
            days_ago,
            start_date,
            include_icebox: toggle(params.icebox.as_deref()),
            include_done: toggle(params.done.as_deref()),
            include_backlog: toggle(params.backlog.as_deref()),
            icebox_limit: defaults.icebox_limit,
            backlog_iterations: defaults.backlog_iterations,
            backlog_skip: defaults.backlog_skip,
            done_iterations: defaults.done_iterations,
        }
    }
}

/// Split a comma-separated project list, dropping blanks and repeats.
pub fn parse_projects(raw: &str) -> Vec<String> {
    let mut projects: Vec<String> = Vec::new();
    for project in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !projects.iter().any(|p| p == project) {
            projects.push(project.to_string());
        }
    }
    projects
}

/// Leading integer of `raw`; anything missing, unparseable, or below 1
/// falls back to `default`.
pub fn parse_days_ago(raw: Option<&str>, default: i64) -> i64 {
    let Some(raw) = raw else {
        return default;
    };

    let raw = raw.trim_start();
    let end = raw
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());

    match raw[..end].parse::<i64>() {
        Ok(days) if days >= 1 => days,
        _ => default,
    }
}

/// Sections are on unless explicitly switched off with the literal `false`.
pub fn toggle(raw: Option<&str>) -> bool {
    raw != Some("false")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_parse_projects_dedupes_in_order() {
        assert_eq!(parse_projects("42,7,42"), vec!["42", "7"]);
        assert_eq!(parse_projects(" 42 , ,7,"), vec!["42", "7"]);
        assert!(parse_projects("").is_empty());
    }

    #[test]
    fn test_parse_days_ago() {
        assert_eq!(parse_days_ago(None, 7), 7);
        assert_eq!(parse_days_ago(Some("14"), 7), 14);
        assert_eq!(parse_days_ago(Some("3days"), 7), 3);
        assert_eq!(parse_days_ago(Some("0"), 7), 7);
        assert_eq!(parse_days_ago(Some("-5"), 7), 7);
        assert_eq!(parse_days_ago(Some("soon"), 7), 7);
        assert_eq!(parse_days_ago(Some(""), 7), 7);
    }

    #[test]
    fn test_toggle_only_literal_false_disables() {
        assert!(toggle(None));
        assert!(toggle(Some("true")));
        assert!(toggle(Some("no")));
        assert!(toggle(Some("FALSE")));
        assert!(!toggle(Some("false")));
    }

    #[test]
    fn test_request_window() {
        let params = ReportParams {
            days_ago: Some("10".to_string()),
            backlog: Some("false".to_string()),
            ..Default::default()
        };
        let request = ReportRequest::new("42,7", "key", &params, today(), &ReportConfig::default());

        assert_eq!(request.projects, vec!["42", "7"]);
        assert_eq!(request.days_ago, 10);
        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!(request.include_icebox);
        assert!(request.include_done);
        assert!(!request.include_backlog);
        assert_eq!(request.icebox_limit, 20);
    }

    #[test]
    fn test_request_default_window() {
        let request = ReportRequest::new(
            "42",
            "key",
            &ReportParams::default(),
            today(),
            &ReportConfig::default(),
        );
        assert_eq!(request.days_ago, 7);
        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn test_request_huge_window_does_not_panic() {
        let params = ReportParams {
            days_ago: Some("999999999999".to_string()),
            ..Default::default()
        };
        let request = ReportRequest::new("42", "key", &params, today(), &ReportConfig::default());
        assert_eq!(request.start_date, NaiveDate::MIN);
    }

    #[test]
    fn test_params_from_pairs_last_value_wins() {
        let pairs = vec![
            ("days_ago".to_string(), "3".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
            ("icebox".to_string(), "false".to_string()),
            ("days_ago".to_string(), "5".to_string()),
        ];
        let params = ReportParams::from_pairs(pairs);

        assert_eq!(params.days_ago.as_deref(), Some("5"));
        assert_eq!(params.icebox.as_deref(), Some("false"));
        assert_eq!(params.done, None);
        assert_eq!(ReportParams::from_pairs(Vec::new()), ReportParams::default());
    }

    #[test]
    fn test_output_format() {
        let mut params = ReportParams::default();
        assert_eq!(params.output_format(), OutputFormat::Html);
        params.format = Some("JSON".to_string());
        assert_eq!(params.output_format(), OutputFormat::Json);
    }
}
