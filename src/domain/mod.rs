pub mod affiliates;
pub mod knowledge;
pub mod models;
pub mod onboarding;
pub mod playbook;
pub mod pto;
pub mod schedule;
pub mod training;
pub mod updates;
