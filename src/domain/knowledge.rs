use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntry {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KbEntryInput {
    pub title: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl KbEntryInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.category.trim().is_empty() {
            return Err("category is required");
        }
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        Ok(())
    }
}

pub fn matches(entry: &KbEntry, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    entry.title.to_lowercase().contains(&needle)
        || entry.content.to_lowercase().contains(&needle)
        || entry.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

pub fn search<'a>(entries: &'a [KbEntry], text: &str) -> Vec<&'a KbEntry> {
    entries.iter().filter(|e| matches(e, text)).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Category<'a> {
    pub name: &'a str,
    pub entries: Vec<&'a KbEntry>,
}

pub fn group_by_category<'a>(entries: &[&'a KbEntry]) -> Vec<Category<'a>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a KbEntry>> = BTreeMap::new();
    for &entry in entries {
        groups.entry(entry.category.as_str()).or_default().push(entry);
    }
    groups
        .into_iter()
        .map(|(name, mut entries)| {
            entries.sort_by(|a, b| a.title.cmp(&b.title));
            Category { name, entries }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, category: &str, tags: &[&str]) -> KbEntry {
        KbEntry {
            id: Uuid::new_v4(),
            title: title.into(),
            category: category.into(),
            content: format!("How to handle {title}"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            updated_at: None,
        }
    }

    #[test]
    fn search_hits_title_content_and_tags() {
        let entries = vec![
            entry("Goodwill letters", "disputes", &["late payment"]),
            entry("Refund policy", "billing", &[]),
            entry("Chargebacks", "billing", &["refund"]),
        ];
        assert_eq!(search(&entries, "REFUND").len(), 2);
        assert_eq!(search(&entries, "late pay").len(), 1);
        assert_eq!(search(&entries, "").len(), 3);
    }

    #[test]
    fn groups_sorted_by_category_then_title() {
        let entries = vec![
            entry("Refund policy", "billing", &[]),
            entry("Goodwill letters", "disputes", &[]),
            entry("Chargebacks", "billing", &[]),
        ];
        let all: Vec<&KbEntry> = entries.iter().collect();
        let groups = group_by_category(&all);
        assert_eq!(groups[0].name, "billing");
        assert_eq!(groups[0].entries[0].title, "Chargebacks");
        assert_eq!(groups[1].name, "disputes");
    }
}
