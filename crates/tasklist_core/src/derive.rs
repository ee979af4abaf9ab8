use crate::dates::{due_day, format_day};
use crate::model::{Filter, Task};
use std::collections::BTreeMap;
use std::fmt;
use time::{Date, UtcOffset};

pub const NO_DATE_LABEL: &str = "No Date";

/// Bucket key of the grouped view.
///
/// `NoDate` orders before every day, so it comes first in an ascending
/// `BTreeMap` walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateKey {
    NoDate,
    Day(Date),
}

impl DateKey {
    pub fn of(task: &Task, offset: UtcOffset) -> Self {
        task.due_date
            .as_deref()
            .and_then(|raw| due_day(raw, offset))
            .map(Self::Day)
            .unwrap_or(Self::NoDate)
    }

    pub fn label(&self) -> String {
        match self {
            Self::NoDate => NO_DATE_LABEL.to_string(),
            Self::Day(day) => format_day(*day),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

pub fn filter_by_status(tasks: &[Task], filter: Filter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect()
}

pub fn group_by_due_date(tasks: &[Task], offset: UtcOffset) -> BTreeMap<DateKey, Vec<Task>> {
    let mut grouped: BTreeMap<DateKey, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        grouped
            .entry(DateKey::of(task, offset))
            .or_default()
            .push(task.clone());
    }
    grouped
}

/// Distinct due days, latest first. Tasks without a usable due date are left
/// out; their bucket only exists in [`group_by_due_date`].
pub fn sorted_date_keys(tasks: &[Task], offset: UtcOffset) -> Vec<Date> {
    let mut days: Vec<Date> = tasks
        .iter()
        .filter_map(|task| match DateKey::of(task, offset) {
            DateKey::Day(day) => Some(day),
            DateKey::NoDate => None,
        })
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();
    days
}
