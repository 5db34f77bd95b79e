use chrono::NaiveDateTime;
use tracing::info;

use crate::api::Group;
use crate::data::GroupService;
use crate::error::Result;
use crate::schedule::{self, ProgressSnapshot, Reminder};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group: Group,
    pub progress: ProgressSnapshot,
}

/// The caller's home view: every group with its schedule progress, plus
/// reminders for the ones running late.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub greeting: String,
    pub groups: Vec<GroupSummary>,
    pub reminders: Vec<Reminder>,
}

impl Dashboard {
    pub fn build(session: &Session, groups: Vec<Group>, now: NaiveDateTime) -> Self {
        let reminders = schedule::reminders(&groups, now);
        let groups = groups
            .into_iter()
            .map(|group| GroupSummary {
                progress: ProgressSnapshot::for_group(&group, now),
                group,
            })
            .collect();
        Self {
            greeting: session.greeting(),
            groups,
            reminders,
        }
    }

    pub fn load(session: &Session, groups: &dyn GroupService, now: NaiveDateTime) -> Result<Self> {
        let list = groups.list_groups()?;
        let dashboard = Self::build(session, list, now);
        info!(
            groups = dashboard.groups.len(),
            reminders = dashboard.reminders.len(),
            "dashboard computed"
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::api::{Confirmation, GroupDetail, NewGroup};
    use crate::error::Error;
    use crate::thread::tests::session;

    struct FixedGroups(Vec<Group>);

    impl GroupService for FixedGroups {
        fn list_groups(&self) -> Result<Vec<Group>> {
            Ok(self.0.clone())
        }

        fn group_detail(&self, _group_id: i64) -> Result<GroupDetail> {
            Err(Error::validation("unused"))
        }

        fn create_group(&self, _group: &NewGroup) -> Result<Group> {
            Err(Error::validation("unused"))
        }

        fn join_group(&self, _group_id: i64) -> Result<Confirmation> {
            Err(Error::validation("unused"))
        }
    }

    fn group(id: i64, name: &str, start: &str, end: &str) -> Group {
        Group {
            id,
            name: name.into(),
            book: Some(1),
            book_title: "Dune".into(),
            creator_name: "ana".into(),
            start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
            member_count: 2,
            is_full: false,
            members: Vec::new(),
        }
    }

    #[test]
    fn dashboard_combines_progress_and_reminders() {
        let service = FixedGroups(vec![
            group(1, "Late", "2024-01-01", "2024-01-11"),
            group(2, "Fresh", "2024-01-16", "2024-02-15"),
        ]);
        let now = NaiveDate::from_ymd_opt(2024, 1, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let dashboard = Dashboard::load(&session(), &service, now).unwrap();
        assert_eq!(dashboard.greeting, "Welcome, ana!");
        assert_eq!(dashboard.groups.len(), 2);
        assert_eq!(dashboard.groups[0].progress.percentage, 100);
        assert!(dashboard.groups[0].progress.overdue);
        assert_eq!(dashboard.groups[1].progress.percentage, 0);
        assert!(!dashboard.groups[1].progress.overdue);
        assert_eq!(dashboard.reminders.len(), 1);
        assert_eq!(dashboard.reminders[0].group_name, "Late");
    }

    #[test]
    fn empty_dashboard_has_no_reminders() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let dashboard = Dashboard::build(&session(), Vec::new(), now);
        assert!(dashboard.groups.is_empty());
        assert!(dashboard.reminders.is_empty());
    }
}
