use std::fmt::Write;

use ansi_term::Style;
use chrono::NaiveDate;

use crate::{
    listing::AppInfo,
    search::grouping::GroupedApps,
    utils::time::{day_label, format_moment},
};

/// Renders the pipeline output the way the terminal shows it. `None` is the loading state.
pub fn render_grouped(groups: Option<&GroupedApps>, today: NaiveDate, styled: bool) -> String {
    let (header, secondary) = if styled {
        (Style::new().bold().underline(), Style::new().italic())
    } else {
        (Style::new(), Style::new())
    };

    let Some(groups) = groups else {
        return "Loading...\n".into();
    };
    if groups.is_empty() {
        return "Empty\n".into();
    }

    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}", header.paint(day_label(group.day, today)));
        for app in &group.apps {
            render_app(&mut out, app, secondary);
        }
        out.push('\n');
    }
    out
}

fn render_app(out: &mut String, app: &AppInfo, secondary: Style) {
    match app.name.as_deref() {
        Some(name) => {
            let _ = writeln!(out, "  {name}");
        }
        None => {
            let _ = writeln!(out, "  {}", secondary.paint("Uninstalled"));
        }
    }
    let _ = writeln!(out, "    {}", app.package_name);
    let _ = writeln!(
        out,
        "    {}",
        secondary.paint(format!(
            "Last time used: {}",
            format_moment(app.last_time_used)
        ))
    );
    let _ = writeln!(
        out,
        "    {}",
        secondary.paint(format!(
            "Last time visible: {}",
            format_moment(app.last_time_visible)
        ))
    );
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::{listing::AppInfo, search::grouping::group_by_day};

    use super::render_grouped;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn loading_and_empty_states_differ() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(render_grouped(None, today, false), "Loading...\n");
        assert_eq!(render_grouped(Some(&vec![]), today, false), "Empty\n");
    }

    #[test]
    fn renders_days_and_apps() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let groups = group_by_day(vec![
            AppInfo {
                package_name: "com.example.mail".into(),
                name: Some("Mail".into()),
                icon: None,
                is_system: false,
                last_time_used: at(2, 10),
                last_time_visible: at(2, 9),
            },
            AppInfo {
                package_name: "com.removed.app".into(),
                name: None,
                icon: None,
                is_system: false,
                last_time_used: at(1, 8),
                last_time_visible: at(1, 8),
            },
        ]);

        let rendered = render_grouped(Some(&groups), today, false);

        assert_eq!(
            rendered,
            "Today\n\
             \x20 Mail\n\
             \x20   com.example.mail\n\
             \x20   Last time used: 10:00:00 02/01/2024\n\
             \x20   Last time visible: 09:00:00 02/01/2024\n\
             \n\
             Yesterday\n\
             \x20 Uninstalled\n\
             \x20   com.removed.app\n\
             \x20   Last time used: 08:00:00 01/01/2024\n\
             \x20   Last time visible: 08:00:00 01/01/2024\n\
             \n"
        );
    }
}
