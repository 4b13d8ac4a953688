use crate::domain::models::{time_slot_order, User, EVERYONE};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskFrequency {
    Daily,
    Weekly,
    #[serde(alias = "one-time", alias = "once")]
    OneTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub time_slot: String,
    pub frequency: TaskFrequency,
    /// 0 = Monday .. 6 = Sunday, used by weekly tasks.
    #[serde(default)]
    pub day_of_week: Option<u32>,
    /// Used by one-time tasks.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub department: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub id: Uuid,
    pub template_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskTemplate {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        if !self.active {
            return false;
        }
        match self.frequency {
            TaskFrequency::Daily => true,
            TaskFrequency::Weekly => self.day_of_week == Some(date.weekday().num_days_from_monday()),
            TaskFrequency::OneTime => self.due_date == Some(date),
        }
    }

    pub fn assigned_to(&self, department: Option<&str>) -> bool {
        self.department.eq_ignore_ascii_case(EVERYONE)
            || department.is_some_and(|d| self.department.eq_ignore_ascii_case(d))
    }
}

pub fn tasks_for_day<'a>(
    templates: &'a [TaskTemplate],
    department: Option<&str>,
    date: NaiveDate,
) -> Vec<&'a TaskTemplate> {
    let mut tasks: Vec<&TaskTemplate> = templates
        .iter()
        .filter(|t| t.assigned_to(department) && t.applies_on(date))
        .collect();
    tasks.sort_by(|a, b| {
        time_slot_order(&a.time_slot)
            .cmp(&time_slot_order(&b.time_slot))
            .then_with(|| a.title.cmp(&b.title))
    });
    tasks
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub template_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistSlot {
    pub time_slot: String,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Completion {
    pub done: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Completion {
    pub fn new(done: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (100.0 * done as f64 / total as f64).round() as u32
        };
        Self {
            done,
            total,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Checklist {
    pub date: NaiveDate,
    pub slots: Vec<ChecklistSlot>,
    pub progress: Completion,
}

pub fn checklist(
    templates: &[TaskTemplate],
    completions: &[TaskCompletion],
    user: &User,
    date: NaiveDate,
) -> Checklist {
    let done: HashMap<Uuid, &TaskCompletion> = completions
        .iter()
        .filter(|c| c.user_id == user.id && c.date == date && c.completed)
        .map(|c| (c.template_id, c))
        .collect();

    let mut slots: Vec<ChecklistSlot> = Vec::new();
    let mut done_count = 0;
    let tasks = tasks_for_day(templates, user.department.as_deref(), date);
    let total = tasks.len();

    for task in tasks {
        let completion = done.get(&task.id);
        if completion.is_some() {
            done_count += 1;
        }
        let item = ChecklistItem {
            template_id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            completed: completion.is_some(),
            completed_at: completion.and_then(|c| c.completed_at),
        };
        let same_slot = slots
            .last()
            .is_some_and(|slot| slot.time_slot == task.time_slot);
        if same_slot {
            if let Some(slot) = slots.last_mut() {
                slot.items.push(item);
            }
        } else {
            slots.push(ChecklistSlot {
                time_slot: task.time_slot.clone(),
                items: vec![item],
            });
        }
    }

    Checklist {
        date,
        slots,
        progress: Completion::new(done_count, total),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberProgress {
    pub user_id: Uuid,
    pub name: String,
    pub progress: Completion,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentProgress {
    pub department: String,
    pub progress: Completion,
    pub members: Vec<MemberProgress>,
}

/// Completion per department and per member for one day. Users without a
/// department are grouped under `unassigned`.
pub fn team_progress(
    users: &[User],
    templates: &[TaskTemplate],
    completions: &[TaskCompletion],
    date: NaiveDate,
) -> Vec<DepartmentProgress> {
    let mut departments: BTreeMap<String, DepartmentProgress> = BTreeMap::new();

    for user in users {
        let list = checklist(templates, completions, user, date);
        let key = user
            .department
            .clone()
            .unwrap_or_else(|| "unassigned".to_string());
        let entry = departments
            .entry(key.clone())
            .or_insert_with(|| DepartmentProgress {
                department: key,
                progress: Completion::new(0, 0),
                members: Vec::new(),
            });
        entry.members.push(MemberProgress {
            user_id: user.id,
            name: user.name.clone(),
            progress: list.progress,
        });
    }

    departments
        .into_values()
        .map(|mut dept| {
            let done = dept.members.iter().map(|m| m.progress.done).sum();
            let total = dept.members.iter().map(|m| m.progress.total).sum();
            dept.progress = Completion::new(done, total);
            dept.members.sort_by(|a, b| {
                b.progress
                    .percentage
                    .cmp(&a.progress.percentage)
                    .then_with(|| a.name.cmp(&b.name))
            });
            dept
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskTemplateInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub time_slot: String,
    pub frequency: TaskFrequency,
    #[serde(default)]
    pub day_of_week: Option<u32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub department: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl TaskTemplateInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.time_slot.trim().is_empty() {
            return Err("time_slot is required");
        }
        if self.department.trim().is_empty() {
            return Err("department is required");
        }
        match self.frequency {
            TaskFrequency::Weekly if !matches!(self.day_of_week, Some(0..=6)) => {
                Err("weekly tasks need day_of_week 0-6")
            }
            TaskFrequency::OneTime if self.due_date.is_none() => Err("one-time tasks need due_date"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserRole;

    fn date(d: u32) -> NaiveDate {
        // June 2024: the 3rd is a Monday.
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn template(title: &str, slot: &str, frequency: TaskFrequency, department: &str) -> TaskTemplate {
        TaskTemplate {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            time_slot: slot.into(),
            frequency,
            day_of_week: None,
            due_date: None,
            department: department.into(),
            active: true,
        }
    }

    fn member(department: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: format!("{department} rep"),
            email: None,
            department: Some(department.into()),
            role: UserRole::Member,
            hire_date: None,
        }
    }

    #[test]
    fn frequency_rules() {
        let mut weekly = template("Pipeline review", "morning", TaskFrequency::Weekly, "sales");
        weekly.day_of_week = Some(0);
        assert!(weekly.applies_on(date(3)));
        assert!(!weekly.applies_on(date(4)));

        let mut once = template("Quarterly audit", "afternoon", TaskFrequency::OneTime, "sales");
        once.due_date = Some(date(5));
        assert!(once.applies_on(date(5)));
        assert!(!once.applies_on(date(6)));

        let mut inactive = template("Old task", "morning", TaskFrequency::Daily, "sales");
        inactive.active = false;
        assert!(!inactive.applies_on(date(5)));
    }

    #[test]
    fn checklist_groups_by_slot_and_counts_progress() {
        let user = member("sales");
        let calls = template("Call leads", "morning", TaskFrequency::Daily, "sales");
        let standup = template("Standup", "start_of_day", TaskFrequency::Daily, "everyone");
        let recap = template("Recap", "end_of_day", TaskFrequency::Daily, "sales");
        let disputes = template("Send letters", "morning", TaskFrequency::Daily, "disputes");
        let templates = vec![calls.clone(), standup.clone(), recap, disputes];

        let completions = vec![
            TaskCompletion {
                id: Uuid::new_v4(),
                template_id: calls.id,
                user_id: user.id,
                date: date(5),
                completed: true,
                completed_at: None,
            },
            // Yesterday's completion does not count today.
            TaskCompletion {
                id: Uuid::new_v4(),
                template_id: standup.id,
                user_id: user.id,
                date: date(4),
                completed: true,
                completed_at: None,
            },
        ];

        let list = checklist(&templates, &completions, &user, date(5));
        let slots: Vec<&str> = list.slots.iter().map(|s| s.time_slot.as_str()).collect();
        assert_eq!(slots, vec!["start_of_day", "morning", "end_of_day"]);
        assert_eq!(list.progress, Completion::new(1, 3));
        assert_eq!(list.progress.percentage, 33);
        assert!(list.slots[1].items[0].completed);
    }

    #[test]
    fn team_progress_rolls_up_departments() {
        let a = member("sales");
        let b = member("sales");
        let c = member("disputes");
        let task = template("Call leads", "morning", TaskFrequency::Daily, "sales");
        let completions = vec![TaskCompletion {
            id: Uuid::new_v4(),
            template_id: task.id,
            user_id: a.id,
            date: date(5),
            completed: true,
            completed_at: None,
        }];
        let teams = team_progress(&[a.clone(), b, c], &[task], &completions, date(5));
        assert_eq!(teams.len(), 2);
        let sales = teams.iter().find(|t| t.department == "sales").unwrap();
        assert_eq!(sales.progress, Completion::new(1, 2));
        assert_eq!(sales.members[0].user_id, a.id);
        let disputes = teams.iter().find(|t| t.department == "disputes").unwrap();
        assert_eq!(disputes.progress.percentage, 0);
    }

    #[test]
    fn template_input_validation() {
        let mut input = TaskTemplateInput {
            title: "Call leads".into(),
            description: None,
            time_slot: "morning".into(),
            frequency: TaskFrequency::Weekly,
            day_of_week: None,
            due_date: None,
            department: "sales".into(),
            active: true,
        };
        assert!(input.validate().is_err());
        input.day_of_week = Some(2);
        assert!(input.validate().is_ok());
        input.title = "  ".into();
        assert_eq!(input.validate(), Err("title is required"));
    }
}
