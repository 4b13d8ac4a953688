use crate::domain::models::{targets_user, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub id: Uuid,
    pub update_id: Uuid,
    pub user_id: Uuid,
    pub acknowledged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AckStats {
    pub total: usize,
    pub acknowledged: usize,
    pub percentage: u32,
}

pub fn target_users<'a>(update: &Update, users: &'a [User]) -> Vec<&'a User> {
    users
        .iter()
        .filter(|u| targets_user(&update.assigned_to, u))
        .collect()
}

/// Acknowledgements from users outside the target population are ignored.
pub fn ack_stats(update: &Update, users: &[User], acks: &[Acknowledgement]) -> AckStats {
    let targets: HashSet<Uuid> = target_users(update, users).iter().map(|u| u.id).collect();
    let acknowledged: HashSet<Uuid> = acks
        .iter()
        .filter(|a| a.update_id == update.id && targets.contains(&a.user_id))
        .map(|a| a.user_id)
        .collect();

    let total = targets.len();
    let percentage = if total == 0 {
        0
    } else {
        (100.0 * acknowledged.len() as f64 / total as f64).round() as u32
    };

    AckStats {
        total,
        acknowledged: acknowledged.len(),
        percentage,
    }
}

pub fn has_acknowledged(update_id: Uuid, user_id: Uuid, acks: &[Acknowledgement]) -> bool {
    acks.iter()
        .any(|a| a.update_id == update_id && a.user_id == user_id)
}

/// Updates aimed at `user` that they have not acknowledged yet, newest first.
pub fn pending_for<'a>(
    user: &User,
    updates: &'a [Update],
    acks: &[Acknowledgement],
) -> Vec<&'a Update> {
    let mut pending: Vec<&Update> = updates
        .iter()
        .filter(|u| targets_user(&u.assigned_to, user) && !has_acknowledged(u.id, user.id, acks))
        .collect();
    pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    pending
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateInput {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub assigned_to: Vec<String>,
}

impl UpdateInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.assigned_to.iter().all(|t| t.trim().is_empty()) {
            return Err("assigned_to needs at least one department or everyone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserRole;

    fn users(n: usize, department: &str) -> Vec<User> {
        (0..n)
            .map(|i| User {
                id: Uuid::new_v4(),
                name: format!("user {i}"),
                email: None,
                department: Some(department.into()),
                role: UserRole::Member,
                hire_date: None,
            })
            .collect()
    }

    fn update(assigned_to: &[&str]) -> Update {
        Update {
            id: Uuid::new_v4(),
            title: "New dispute letters".into(),
            body: String::new(),
            assigned_to: assigned_to.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
            created_by: None,
        }
    }

    fn ack(update: &Update, user: &User) -> Acknowledgement {
        Acknowledgement {
            id: Uuid::new_v4(),
            update_id: update.id,
            user_id: user.id,
            acknowledged_at: Utc::now(),
        }
    }

    #[test]
    fn everyone_update_with_four_of_ten_acknowledged() {
        let team = users(10, "sales");
        let u = update(&["everyone"]);
        let acks: Vec<_> = team.iter().take(4).map(|user| ack(&u, user)).collect();
        assert_eq!(
            ack_stats(&u, &team, &acks),
            AckStats {
                total: 10,
                acknowledged: 4,
                percentage: 40
            }
        );
    }

    #[test]
    fn department_targeting_ignores_outside_acks() {
        let mut team = users(3, "sales");
        let disputes = users(2, "disputes");
        team.extend(disputes.clone());
        let u = update(&["disputes"]);
        let acks = vec![ack(&u, &disputes[0]), ack(&u, &team[0])];
        let stats = ack_stats(&u, &team, &acks);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.acknowledged, 1);
        assert_eq!(stats.percentage, 50);
    }

    #[test]
    fn empty_population_is_zero_percent() {
        let team = users(3, "sales");
        let u = update(&["affiliates"]);
        assert_eq!(ack_stats(&u, &team, &[]).percentage, 0);
    }

    #[test]
    fn duplicate_acks_count_once_and_stats_are_stable() {
        let team = users(3, "sales");
        let u = update(&["sales"]);
        let acks = vec![ack(&u, &team[0]), ack(&u, &team[0])];
        let first = ack_stats(&u, &team, &acks);
        assert_eq!(first.acknowledged, 1);
        assert_eq!(first.percentage, 33);
        assert_eq!(first, ack_stats(&u, &team, &acks));
    }

    #[test]
    fn pending_excludes_acknowledged_and_untargeted() {
        let team = users(1, "sales");
        let me = &team[0];
        let seen = update(&["everyone"]);
        let unseen = update(&["sales"]);
        let other = update(&["disputes"]);
        let acks = vec![ack(&seen, me)];
        let updates = vec![seen, unseen.clone(), other];
        let pending = pending_for(me, &updates, &acks);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, unseen.id);
    }
}
