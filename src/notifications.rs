use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// How far back a message, homework or grade still counts as new.
pub fn recent_window() -> Duration {
    Duration::days(1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u32,
    pub content: String,
    pub link: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Timestamps of the rows that fell inside the recent window, per kind.
#[derive(Debug, Default)]
pub struct RecentActivity {
    pub messages: Vec<DateTime<Utc>>,
    pub homework: Vec<DateTime<Utc>>,
    pub grades: Vec<DateTime<Utc>>,
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn summarize(
    id: u32,
    stamps: &[DateTime<Utc>],
    after: Option<DateTime<Utc>>,
    link: &'static str,
    content: impl FnOnce(usize) -> String,
) -> Option<Notification> {
    let latest = stamps.iter().max().copied()?;
    if after.is_some_and(|after| latest <= after) {
        return None;
    }
    Some(Notification {
        id,
        content: content(stamps.len()),
        link,
        timestamp: latest,
    })
}

/// One notification per kind of activity, only when its newest entry is
/// later than `after`.
pub fn build_notifications(activity: &RecentActivity, after: Option<DateTime<Utc>>) -> Vec<Notification> {
    [
        summarize(1001, &activity.messages, after, "/student/chat", |n| {
            format!("You have {n} new message{}.", plural(n))
        }),
        summarize(1002, &activity.homework, after, "/student/homework", |n| {
            let verb = if n == 1 { "is" } else { "are" };
            format!("There {verb} {n} new homework assignment{}.", plural(n))
        }),
        summarize(1003, &activity.grades, after, "/student/grades", |n| {
            format!("You have {n} new or updated grade{}.", plural(n))
        }),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_recent_means_no_notifications() {
        assert!(build_notifications(&RecentActivity::default(), None).is_empty());
    }

    #[test]
    fn content_is_pluralised_per_kind() {
        let now = Utc::now();
        let activity = RecentActivity {
            messages: vec![now],
            homework: vec![now, now - Duration::hours(2)],
            grades: vec![now, now, now],
        };
        let notes = build_notifications(&activity, None);
        let contents: Vec<_> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "You have 1 new message.",
                "There are 2 new homework assignments.",
                "You have 3 new or updated grades.",
            ]
        );
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1001, 1002, 1003]);
    }

    #[test]
    fn after_filters_kinds_whose_latest_entry_is_old() {
        let now = Utc::now();
        let activity = RecentActivity {
            messages: vec![now - Duration::hours(5)],
            homework: vec![now - Duration::hours(5), now],
            grades: vec![],
        };
        let notes = build_notifications(&activity, Some(now - Duration::hours(1)));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, 1002);
        assert_eq!(notes[0].timestamp, now);
    }
}
