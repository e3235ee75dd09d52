use crate::domain::models::{DailyReport, Phase, SessionRecord};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Groups records by local calendar date and totals them, newest day first.
///
/// Only completed records contribute to the study and break time totals;
/// incomplete records count toward `incomplete_count` but add no time, since
/// an abandoned phase never ran for its full duration.
pub fn daily_reports(records: &[SessionRecord], timezone: Tz) -> Vec<DailyReport> {
    let mut days: BTreeMap<NaiveDate, DailyReport> = BTreeMap::new();

    for record in records {
        let date = record.started_at.with_timezone(&timezone).date_naive();
        let report = days.entry(date).or_insert_with(|| DailyReport {
            date,
            total_study_seconds: 0,
            total_break_seconds: 0,
            completed_count: 0,
            incomplete_count: 0,
        });

        if record.completed {
            report.completed_count += 1;
            match record.kind {
                Phase::Study => report.total_study_seconds += u64::from(record.duration_seconds),
                Phase::Break => report.total_break_seconds += u64::from(record.duration_seconds),
            }
        } else {
            report.incomplete_count += 1;
        }
    }

    days.into_values().rev().collect()
}

/// Records whose local start date matches `date`, newest first by id.
pub fn records_for_date(records: &[SessionRecord], date: NaiveDate, timezone: Tz) -> Vec<SessionRecord> {
    let mut matching: Vec<SessionRecord> = records
        .iter()
        .filter(|record| record.started_at.with_timezone(&timezone).date_naive() == date)
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.id.cmp(&a.id));
    matching
}
