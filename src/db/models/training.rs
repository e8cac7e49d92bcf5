use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "training_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Active,
    Archived,
}

/// Session lifecycle, driven by the trainer's "mark complete" action.
/// Independent of attendance marking.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "session_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    EnCours,
    Fini,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Training {
    pub id: Uuid,
    pub name: String,
    pub status: TrainingStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// An ordered stage within a training. `level_number` is 1-based, dense and
/// unique within its training. Levels are created with the training and
/// never mutated afterwards.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Level {
    pub id: Uuid,
    pub training_id: Uuid,
    pub level_number: i32,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub level_id: Uuid,
    pub session_number: i32,
    pub title: String,
    pub scheduled_on: Option<Date>,
    pub status: SessionStatus,
}
