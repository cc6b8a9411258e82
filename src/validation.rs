//! Request validation.
//!
//! Raw request shapes are converted into validated domain values here. Every
//! violated constraint is collected so callers receive the complete list.

use crate::error::FieldError;
use crate::types::{Priority, SortField, SortOrder, TaskFields, TaskFilter, TaskStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Body of a create or update request, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TaskInput {
    /// Validate into a full field set. Absent priority and status take their
    /// defaults; absent description stays empty.
    pub fn validate(&self) -> Result<TaskFields, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        let title_len = title.chars().count();
        if title_len == 0 || title_len > TITLE_MAX_CHARS {
            errors.push(FieldError::title());
        }

        let description = self.description.as_deref().map(str::trim);
        if let Some(d) = description
            && d.chars().count() > DESCRIPTION_MAX_CHARS
        {
            errors.push(FieldError::description());
        }

        let due_date = self.due_date.as_deref().and_then(parse_due_date);
        if due_date.is_none() {
            errors.push(FieldError::due_date());
        }

        let priority = match self.priority.as_deref() {
            None => Some(Priority::default()),
            Some(p) => Priority::parse(p),
        };
        if priority.is_none() {
            errors.push(FieldError::priority());
        }

        let status = match self.status.as_deref() {
            None => Some(TaskStatus::default()),
            Some(s) => TaskStatus::parse(s),
        };
        if status.is_none() {
            errors.push(FieldError::status());
        }

        match (due_date, priority, status) {
            (Some(due_date), Some(priority), Some(status)) if errors.is_empty() => Ok(TaskFields {
                title: title.to_string(),
                description: description.map(str::to_string),
                due_date,
                priority,
                status,
            }),
            _ => Err(errors),
        }
    }
}

/// Date-time layouts accepted with or without a trailing UTC offset.
const DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Calendar, compact and ISO week dates.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%G-W%V-%u", "%GW%V%u"];

/// Parse an ISO-8601 date or date-time into an absolute instant.
///
/// Date-times without an offset and bare dates are taken as UTC. Reduced
/// precision dates (`YYYY-MM`, `YYYY`) mean the first day of the period. The
/// result is truncated to millisecond precision, which is what the store keeps.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let instant = parse_zoned_datetime(raw)
        .or_else(|| parse_naive_datetime(raw).map(|naive| Utc.from_utc_datetime(&naive)))
        .or_else(|| {
            let date = parse_date(raw)?;
            Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        })?;

    Some(instant.trunc_subsecs(3))
}

fn parse_zoned_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(local) = raw.strip_suffix(['Z', 'z']) {
        return parse_naive_datetime(local).map(|naive| Utc.from_utc_datetime(&naive));
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, &format!("{fmt}%#z")).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    match bytes.len() {
        4 if bytes.iter().all(u8::is_ascii_digit) => {
            NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1)
        }
        7 if bytes[4] == b'-' => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok(),
        8 if bytes[4] == b'-' && bytes[5..].iter().all(u8::is_ascii_digit) => {
            NaiveDate::parse_from_str(raw, "%Y-%j").ok()
        }
        _ => DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok()),
    }
}

/// Query string of a list request, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

impl ListParams {
    pub fn validate(&self) -> Result<TaskFilter, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut filter = TaskFilter::default();

        match self.status.as_deref() {
            None | Some("") | Some("All") => {}
            Some(s) => match TaskStatus::parse(s) {
                Some(status) => filter.status = Some(status),
                None => errors.push(FieldError::status_filter()),
            },
        }

        filter.search = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(s) = self.sort_by.as_deref() {
            match SortField::parse(s) {
                Some(field) => filter.sort_by = field,
                None => errors.push(FieldError::sort_by()),
            }
        }

        if let Some(s) = self.sort_order.as_deref() {
            match SortOrder::parse(s) {
                Some(order) => filter.sort_order = order,
                None => errors.push(FieldError::sort_order()),
            }
        }

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }
}
