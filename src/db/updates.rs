use super::{ACKNOWLEDGEMENTS, UPDATES};
use crate::domain::updates::{Acknowledgement, Update, UpdateInput};
use crate::postgrest::{fetch_one, fetch_rows, insert_row, Direction, Query, RestStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub async fn load_updates(store: &dyn RestStore) -> Result<Vec<Update>> {
    let rows = fetch_rows(
        store,
        UPDATES,
        &Query::new()
            .select("*")
            .order("created_at", Direction::Desc),
    )
    .await?;
    Ok(rows)
}

pub async fn load_acknowledgements(store: &dyn RestStore) -> Result<Vec<Acknowledgement>> {
    let rows = fetch_rows(store, ACKNOWLEDGEMENTS, &Query::new().select("*")).await?;
    Ok(rows)
}

#[derive(Serialize)]
struct NewUpdate<'a> {
    title: &'a str,
    body: &'a str,
    assigned_to: &'a [String],
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

pub async fn create_update(store: &dyn RestStore, input: &UpdateInput, author: Uuid) -> Result<Update> {
    let row = NewUpdate {
        title: input.title.trim(),
        body: &input.body,
        assigned_to: &input.assigned_to,
        created_by: author,
        created_at: Utc::now(),
    };
    Ok(insert_row(store, UPDATES, &row).await?)
}

pub async fn delete_update(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store
        .delete(ACKNOWLEDGEMENTS, &Query::new().eq("update_id", id))
        .await?;
    store.delete(UPDATES, &Query::new().eq("id", id)).await?;
    Ok(())
}

#[derive(Serialize)]
struct NewAcknowledgement {
    update_id: Uuid,
    user_id: Uuid,
    acknowledged_at: DateTime<Utc>,
}

/// Returns the existing acknowledgement when the user already has one.
pub async fn acknowledge(store: &dyn RestStore, update_id: Uuid, user_id: Uuid) -> Result<Acknowledgement> {
    let existing: Option<Acknowledgement> = fetch_one(
        store,
        ACKNOWLEDGEMENTS,
        Query::new()
            .select("*")
            .eq("update_id", update_id)
            .eq("user_id", user_id),
    )
    .await?;
    if let Some(ack) = existing {
        return Ok(ack);
    }

    let row = NewAcknowledgement {
        update_id,
        user_id,
        acknowledged_at: Utc::now(),
    };
    Ok(insert_row(store, ACKNOWLEDGEMENTS, &row).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::updates::ack_stats;
    use crate::postgrest::memory::MemoryStore;
    use crate::domain::models::{User, UserRole};

    #[tokio::test]
    async fn acknowledging_is_idempotent_and_feeds_stats() {
        let store = MemoryStore::new();
        let author = Uuid::new_v4();
        let users: Vec<User> = (0..4)
            .map(|i| User {
                id: Uuid::new_v4(),
                name: format!("rep {i}"),
                email: None,
                department: Some("disputes".into()),
                role: UserRole::Member,
                hire_date: None,
            })
            .collect();

        let update = create_update(
            &store,
            &UpdateInput {
                title: " Round 2 letters ".into(),
                body: "Send by Friday".into(),
                assigned_to: vec!["disputes".into()],
            },
            author,
        )
        .await
        .unwrap();
        assert_eq!(update.title, "Round 2 letters");

        let first = acknowledge(&store, update.id, users[0].id).await.unwrap();
        let again = acknowledge(&store, update.id, users[0].id).await.unwrap();
        assert_eq!(first.id, again.id);
        acknowledge(&store, update.id, users[1].id).await.unwrap();

        let acks = load_acknowledgements(&store).await.unwrap();
        assert_eq!(acks.len(), 2);
        let stats = ack_stats(&update, &users, &acks);
        assert_eq!(stats.percentage, 50);

        delete_update(&store, update.id).await.unwrap();
        assert!(load_updates(&store).await.unwrap().is_empty());
        assert!(load_acknowledgements(&store).await.unwrap().is_empty());
    }
}
