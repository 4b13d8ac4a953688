use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EVERYONE: &str = "everyone";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[serde(other)]
    Member,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn in_department(&self, department: &str) -> bool {
        self.department
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(department))
    }
}

/// `everyone` matches all users; anything else is a department name.
pub fn targets_user(assigned_to: &[String], user: &User) -> bool {
    assigned_to
        .iter()
        .any(|target| target.eq_ignore_ascii_case(EVERYONE) || user.in_department(target))
}

#[derive(Clone, Debug, Serialize)]
pub struct TimeSlot {
    pub key: &'static str,
    pub label: &'static str,
    pub order: u8,
}

pub static DEPARTMENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "sales",
        "customer_service",
        "disputes",
        "operations",
        "affiliates",
        "management",
    ]
});

pub static TIME_SLOTS: Lazy<Vec<TimeSlot>> = Lazy::new(|| {
    vec![
        TimeSlot { key: "start_of_day", label: "Start of Day", order: 0 },
        TimeSlot { key: "morning", label: "Morning", order: 1 },
        TimeSlot { key: "midday", label: "Midday", order: 2 },
        TimeSlot { key: "afternoon", label: "Afternoon", order: 3 },
        TimeSlot { key: "end_of_day", label: "End of Day", order: 4 },
    ]
});

/// Unknown slots sort after the known ones.
pub fn time_slot_order(key: &str) -> u8 {
    TIME_SLOTS
        .iter()
        .find(|slot| slot.key == key)
        .map(|slot| slot.order)
        .unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(department: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dana".into(),
            email: None,
            department: department.map(str::to_string),
            role: UserRole::Member,
            hire_date: None,
        }
    }

    #[test]
    fn unknown_roles_deserialize_as_member() {
        let u: User = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Sam",
            "role": "consultant"
        }))
        .unwrap();
        assert_eq!(u.role, UserRole::Member);
        let a: User = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Ada",
            "role": "admin",
            "department": "management"
        }))
        .unwrap();
        assert!(a.is_admin());
    }

    #[test]
    fn everyone_and_department_targeting() {
        let sales = user(Some("Sales"));
        let nobody = user(None);
        assert!(targets_user(&["everyone".into()], &nobody));
        assert!(targets_user(&["disputes".into(), "sales".into()], &sales));
        assert!(!targets_user(&["disputes".into()], &sales));
        assert!(!targets_user(&[], &sales));
    }

    #[test]
    fn time_slots_sort_known_first() {
        assert!(time_slot_order("morning") < time_slot_order("end_of_day"));
        assert_eq!(time_slot_order("whenever"), u8::MAX);
    }
}
