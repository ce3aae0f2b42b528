use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use serde::Serialize;

use crate::listing::AppInfo;

/// Apps last used on the same calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub apps: Vec<AppInfo>,
}

/// Days in the order they were first met in the app list.
pub type GroupedApps = Vec<DayGroup>;

/// A term made only of whitespace doesn't filter anything.
pub fn is_blank(term: &str) -> bool {
    term.trim().is_empty()
}

/// Case-insensitive substring match on the app name or the package name. Apps without a name can
/// only be found through their package.
pub fn matches(app: &AppInfo, term: &str) -> bool {
    let term = term.to_lowercase();
    let contains = |value: &str| value.to_lowercase().contains(&term);
    app.name.as_deref().is_some_and(contains) || contains(&app.package_name)
}

pub fn filter_apps<'a>(apps: &'a [AppInfo], term: &'a str) -> impl Iterator<Item = &'a AppInfo> {
    let blank = is_blank(term);
    apps.iter().filter(move |app| blank || matches(app, term))
}

/// Groups apps by the day they were last used. Order inside a day is kept, days are ordered by
/// their first appearance.
pub fn group_by_day(apps: impl IntoIterator<Item = AppInfo>) -> GroupedApps {
    let mut positions = HashMap::<NaiveDate, usize>::new();
    let mut groups: GroupedApps = vec![];

    for app in apps {
        let day = app.last_time_used.date();
        match positions.get(&day) {
            Some(&index) => groups[index].apps.push(app),
            None => {
                positions.insert(day, groups.len());
                groups.push(DayGroup {
                    day,
                    apps: vec![app],
                });
            }
        }
    }

    groups
}

/// Filters a sorted app list with `term` and groups what is left by day.
pub fn present(apps: &[AppInfo], term: &str) -> Arc<GroupedApps> {
    Arc::new(group_by_day(filter_apps(apps, term).cloned()))
}
