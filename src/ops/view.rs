use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};

use crate::model::{Member, OrderingConfig, ReferenceCache, Task};
use crate::ops::lookup::{self, UNASSIGNED_LABEL};
use crate::ops::quick_edit::QuickEdit;

/// Shown when no task survives filtering
pub const EMPTY_MESSAGE: &str = "目前沒有符合條件的任務。";

/// Which assignee tab is showing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tab", content = "member", rename_all = "lowercase")]
pub enum AssigneeTab {
    /// Every task, grouped by member
    #[default]
    All,
    /// Only tasks assigned to this member id
    Member(String),
    /// Only tasks with no assignee
    Unassigned,
}

/// UI-owned view state passed into derivation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub active_tab: AssigneeTab,
    #[serde(default)]
    pub hide_completed_and_stopped: bool,
    /// Cell currently being quick-edited
    #[serde(default)]
    pub editing: QuickEdit,
}

/// Static inputs to derivation that come from configuration
#[derive(Debug, Clone, Default)]
pub struct ViewRules {
    /// Member ids in group order
    pub roster: Vec<String>,
    pub ordering: OrderingConfig,
}

/// Group title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupHeading {
    Member { id: String, name: String },
    Unassigned,
}

impl GroupHeading {
    pub fn label(&self) -> &str {
        match self {
            GroupHeading::Member { name, .. } => name,
            GroupHeading::Unassigned => UNASSIGNED_LABEL,
        }
    }
}

/// One display group and its ordered rows
#[derive(Debug, Clone)]
pub struct TaskGroup<'a> {
    pub heading: GroupHeading,
    pub tasks: Vec<&'a Task>,
}

/// The tab list shown to the user: all, each known member in roster order, unassigned
pub fn tabs(members: &[Member], rules: &ViewRules) -> Vec<AssigneeTab> {
    let mut tabs = vec![AssigneeTab::All];
    tabs.extend(
        roster_order(members, &rules.roster)
            .into_iter()
            .map(|m| AssigneeTab::Member(m.id.clone())),
    );
    tabs.push(AssigneeTab::Unassigned);
    tabs
}

/// Known members ordered by the configured roster; members missing from
/// the roster follow in feed order.
pub fn roster_order<'a>(members: &'a [Member], roster: &[String]) -> Vec<&'a Member> {
    let mut ordered: Vec<&Member> = roster
        .iter()
        .filter_map(|id| lookup::find_member(members, id))
        .collect();
    for m in members {
        if !roster.contains(&m.id) {
            ordered.push(m);
        }
    }
    ordered
}

/// Apply the tab and finished-status filters, preserving input order
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    refs: &ReferenceCache,
    rules: &ViewRules,
    state: &ViewState,
) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| match &state.active_tab {
            AssigneeTab::All => true,
            AssigneeTab::Member(id) => t.assignee_id.as_deref() == Some(id.as_str()),
            AssigneeTab::Unassigned => t.assignee_id.is_none(),
        })
        .filter(|t| {
            !state.hide_completed_and_stopped || !lookup::is_finished(t, refs, &rules.ordering)
        })
        .collect()
}

fn canonical_rank(names: &[String], name: Option<&str>) -> usize {
    name.and_then(|n| names.iter().position(|c| c == n))
        .unwrap_or(usize::MAX)
}

/// Compare two tasks: status rank, priority rank, then due date descending
/// with undated tasks last.
pub fn compare_tasks(a: &Task, b: &Task, refs: &ReferenceCache, ordering: &OrderingConfig) -> Ordering {
    let status_rank = |t: &Task| {
        canonical_rank(&ordering.statuses, lookup::resolved_status(refs, &t.status))
    };
    let priority_rank = |t: &Task| {
        canonical_rank(
            &ordering.priorities,
            refs.priorities.get(&t.priority).map(|e| e.name.as_str()),
        )
    };
    status_rank(a)
        .cmp(&status_rank(b))
        .then_with(|| priority_rank(a).cmp(&priority_rank(b)))
        // Option orders None first, so reversing puts dated tasks (latest first) ahead of undated
        .then_with(|| Reverse(a.due_date).cmp(&Reverse(b.due_date)))
}

/// Stable sort in canonical display order
pub fn sort_tasks(tasks: &mut [&Task], refs: &ReferenceCache, ordering: &OrderingConfig) {
    tasks.sort_by(|a, b| compare_tasks(a, b, refs, ordering));
}

/// Derive the groups to render from the raw task set and the view state.
///
/// In the "all" tab there is one group per known member in roster order,
/// then an unassigned group; empty groups are omitted. Tasks whose assignee
/// is not a known member appear in no group. Other tabs yield a single flat
/// group (or nothing when it is empty).
pub fn derive_groups<'a>(
    tasks: &'a [Task],
    members: &[Member],
    refs: &ReferenceCache,
    rules: &ViewRules,
    state: &ViewState,
) -> Vec<TaskGroup<'a>> {
    let mut rows = filter_tasks(tasks, refs, rules, state);
    sort_tasks(&mut rows, refs, &rules.ordering);

    let single = |heading: GroupHeading, rows: Vec<&'a Task>| {
        if rows.is_empty() {
            Vec::new()
        } else {
            vec![TaskGroup {
                heading,
                tasks: rows,
            }]
        }
    };

    match &state.active_tab {
        AssigneeTab::Member(id) => {
            let name = lookup::assignee_label(members, Some(id.as_str())).to_string();
            single(GroupHeading::Member { id: id.clone(), name }, rows)
        }
        AssigneeTab::Unassigned => single(GroupHeading::Unassigned, rows),
        AssigneeTab::All => {
            let mut groups = Vec::new();
            for member in roster_order(members, &rules.roster) {
                let own: Vec<&Task> = rows
                    .iter()
                    .copied()
                    .filter(|t| t.assignee_id.as_deref() == Some(member.id.as_str()))
                    .collect();
                if !own.is_empty() {
                    groups.push(TaskGroup {
                        heading: GroupHeading::Member {
                            id: member.id.clone(),
                            name: member.display_name.clone(),
                        },
                        tasks: own,
                    });
                }
            }
            let unassigned: Vec<&Task> = rows
                .iter()
                .copied()
                .filter(|t| t.assignee_id.is_none())
                .collect();
            if !unassigned.is_empty() {
                groups.push(TaskGroup {
                    heading: GroupHeading::Unassigned,
                    tasks: unassigned,
                });
            }
            groups
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RefEntry, ReferenceSet};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn refs() -> ReferenceCache {
        ReferenceCache {
            priorities: ReferenceSet::new(vec![
                RefEntry::new("P-urgent", "緊急", 1),
                RefEntry::new("P-high", "優先", 2),
                RefEntry::new("P-normal", "一般", 3),
                RefEntry::new("P-low", "低", 4),
            ]),
            statuses: ReferenceSet::new(vec![
                RefEntry::new("S-progress", "進行中", 1),
                RefEntry::new("S-test", "測試中", 4),
                RefEntry::new("S-todo", "待安排", 5),
                RefEntry::new("S-done", "已完成", 7),
                RefEntry::new("S-stop", "停止", 8),
            ]),
            ..Default::default()
        }
    }

    fn date(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 4, d)
    }

    fn task(id: &str, status: &str, priority: &str, due: Option<NaiveDate>) -> Task {
        Task {
            id: id.into(),
            title: format!("task {id}"),
            description: None,
            git_issue_url: None,
            assignee_id: None,
            start_date: None,
            due_date: due,
            priority: priority.into(),
            status: status.into(),
            product: "xq".into(),
            task_type: "spec".into(),
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn assigned(mut t: Task, who: &str) -> Task {
        t.assignee_id = Some(who.into());
        t
    }

    fn members() -> Vec<Member> {
        vec![Member::new("m1", "Amy"), Member::new("m2", "Ben")]
    }

    fn ids(rows: &[&Task]) -> Vec<String> {
        rows.iter().map(|t| t.id.clone()).collect()
    }

    fn state(tab: AssigneeTab, hide: bool) -> ViewState {
        ViewState {
            active_tab: tab,
            hide_completed_and_stopped: hide,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_order_beats_priority() {
        let tasks = vec![
            task("1", "S-done", "P-high", date(1)),
            task("2", "S-progress", "P-low", date(2)),
        ];
        let groups = derive_groups(
            &tasks,
            &[],
            &refs(),
            &ViewRules::default(),
            &state(AssigneeTab::Unassigned, false),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0].tasks), vec!["2", "1"]);
    }

    #[test]
    fn test_priority_then_due_desc_then_input_order() {
        let tasks = vec![
            task("a", "S-todo", "P-normal", None),
            task("b", "S-todo", "P-normal", date(3)),
            task("c", "S-todo", "P-urgent", date(1)),
            task("d", "S-todo", "P-normal", date(9)),
            task("e", "S-todo", "P-normal", None),
            task("f", "S-todo", "P-normal", date(3)),
        ];
        let mut rows: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut rows, &refs(), &OrderingConfig::default());
        assert_eq!(ids(&rows), vec!["c", "d", "b", "f", "a", "e"]);
    }

    #[test]
    fn test_unknown_status_and_priority_sort_last() {
        let tasks = vec![
            task("ghost", "S-missing", "P-normal", None),
            task("stop", "S-stop", "P-normal", None),
            task("done", "S-done", "P-missing", None),
            task("done2", "S-done", "P-low", None),
            task("live", "S-test", "P-low", None),
        ];
        let mut rows: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut rows, &refs(), &OrderingConfig::default());
        // 停止 is outside the canonical list, so it ranks with unknown statuses
        assert_eq!(ids(&rows), vec!["live", "done2", "done", "ghost", "stop"]);
    }

    #[test]
    fn test_sorted_rows_never_invert_status_rank() {
        let statuses = ["S-done", "S-progress", "S-todo", "S-test", "S-missing"];
        let priorities = ["P-low", "P-urgent", "P-normal"];
        let mut tasks = Vec::new();
        for i in 0..30u32 {
            tasks.push(task(
                &i.to_string(),
                statuses[(i * 7 % 5) as usize],
                priorities[(i * 3 % 3) as usize],
                if i % 4 == 0 { None } else { date(i % 28 + 1) },
            ));
        }
        let refs = refs();
        let ordering = OrderingConfig::default();
        let mut rows: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut rows, &refs, &ordering);
        for pair in rows.windows(2) {
            assert_ne!(
                compare_tasks(pair[0], pair[1], &refs, &ordering),
                Ordering::Greater
            );
        }
        // equal keys keep their input order
        for pair in rows.windows(2) {
            if compare_tasks(pair[0], pair[1], &refs, &ordering) == Ordering::Equal {
                let a: u32 = pair[0].id.parse().unwrap();
                let b: u32 = pair[1].id.parse().unwrap();
                assert!(a < b);
            }
        }
    }

    #[test]
    fn test_member_tab_keeps_exactly_that_member() {
        let tasks = vec![
            assigned(task("1", "S-todo", "P-low", None), "m1"),
            assigned(task("2", "S-todo", "P-low", None), "m2"),
            task("3", "S-todo", "P-low", None),
            assigned(task("4", "S-done", "P-low", None), "m1"),
        ];
        let rows = filter_tasks(
            &tasks,
            &refs(),
            &ViewRules::default(),
            &state(AssigneeTab::Member("m1".into()), false),
        );
        assert_eq!(ids(&rows), vec!["1", "4"]);

        let rows = filter_tasks(
            &tasks,
            &refs(),
            &ViewRules::default(),
            &state(AssigneeTab::Unassigned, false),
        );
        assert_eq!(ids(&rows), vec!["3"]);
    }

    #[test]
    fn test_hide_finished_drops_done_and_stopped_only() {
        let tasks = vec![
            task("1", "S-done", "P-low", None),
            task("2", "S-stop", "P-low", None),
            task("3", "S-progress", "P-low", None),
            task("4", "S-missing", "P-low", None),
        ];
        let rows = filter_tasks(&tasks, &refs(), &ViewRules::default(), &state(AssigneeTab::All, true));
        assert_eq!(ids(&rows), vec!["3", "4"]);
        let rows = filter_tasks(&tasks, &refs(), &ViewRules::default(), &state(AssigneeTab::All, false));
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_all_tab_groups_by_roster_and_drops_dangling_assignees() {
        let tasks = vec![
            assigned(task("1", "S-todo", "P-low", None), "m1"),
            task("2", "S-todo", "P-low", None),
            assigned(task("3", "S-progress", "P-low", None), "m2"),
            assigned(task("4", "S-todo", "P-low", None), "ghost"),
            assigned(task("5", "S-progress", "P-low", None), "m1"),
        ];
        let rules = ViewRules {
            roster: vec!["m2".into(), "m1".into()],
            ..Default::default()
        };
        let groups = derive_groups(&tasks, &members(), &refs(), &rules, &state(AssigneeTab::All, false));
        let summary: Vec<(String, Vec<String>)> = groups
            .iter()
            .map(|g| (g.heading.label().to_string(), ids(&g.tasks)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Ben".to_string(), vec!["3".to_string()]),
                ("Amy".to_string(), vec!["5".to_string(), "1".to_string()]),
                ("未分配".to_string(), vec!["2".to_string()]),
            ]
        );
    }

    #[test]
    fn test_empty_groups_are_omitted() {
        let tasks = vec![assigned(task("1", "S-todo", "P-low", None), "m2")];
        let groups = derive_groups(
            &tasks,
            &members(),
            &refs(),
            &ViewRules::default(),
            &state(AssigneeTab::All, false),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].heading,
            GroupHeading::Member {
                id: "m2".into(),
                name: "Ben".into()
            }
        );
    }

    #[test]
    fn test_empty_feed_yields_no_groups() {
        for tab in [AssigneeTab::All, AssigneeTab::Unassigned, AssigneeTab::Member("m1".into())] {
            let groups = derive_groups(&[], &members(), &refs(), &ViewRules::default(), &state(tab, true));
            assert!(groups.is_empty());
        }
    }

    #[test]
    fn test_tabs_follow_roster_then_feed_order() {
        let members = vec![
            Member::new("m1", "Amy"),
            Member::new("m2", "Ben"),
            Member::new("m3", "Cat"),
        ];
        let rules = ViewRules {
            roster: vec!["m3".into(), "gone".into(), "m1".into()],
            ..Default::default()
        };
        assert_eq!(
            tabs(&members, &rules),
            vec![
                AssigneeTab::All,
                AssigneeTab::Member("m3".into()),
                AssigneeTab::Member("m1".into()),
                AssigneeTab::Member("m2".into()),
                AssigneeTab::Unassigned,
            ]
        );
    }

    #[test]
    fn test_view_state_round_trips_through_json() {
        let st = state(AssigneeTab::Member("m1".into()), true);
        let json = serde_json::to_string(&st).unwrap();
        let back: ViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, st);
        let minimal: ViewState = serde_json::from_str("{}").unwrap();
        assert_eq!(minimal.active_tab, AssigneeTab::All);
    }
}
