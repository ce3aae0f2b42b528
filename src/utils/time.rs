use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

/// The standard way of printing a usage moment in myapps.
pub const MOMENT_FORMAT: &str = "%H:%M:%S %d/%m/%Y";

/// Zone used to turn platform timestamps into wall-clock time. Days of the app list are
/// calendar days of this zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocalZone {
    #[default]
    System,
    Fixed(FixedOffset),
}

impl LocalZone {
    pub fn to_local(&self, moment: DateTime<Utc>) -> NaiveDateTime {
        match self {
            LocalZone::System => moment.with_timezone(&Local).naive_local(),
            LocalZone::Fixed(offset) => moment.with_timezone(offset).naive_local(),
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date()
    }
}

pub fn format_moment(moment: NaiveDateTime) -> String {
    moment.format(MOMENT_FORMAT).to_string()
}

/// Header shown above a day of usage. Relative names are used for the two most recent days.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".into()
    } else if Some(day) == today.pred_opt() {
        "Yesterday".into()
    } else {
        day.format("%d/%m/%Y").to_string()
    }
}
