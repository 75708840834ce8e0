use serde::{Deserialize, Serialize};

use super::Intent;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookFields {
    pub name: String,
    pub email: String,
    pub reason: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelFields {
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RescheduleFields {
    pub name: String,
    pub email: String,
    pub old_date: String,
    pub old_time: String,
    pub new_date: String,
    pub new_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum FieldSet {
    Book(BookFields),
    Cancel(CancelFields),
    Reschedule(RescheduleFields),
}

impl FieldSet {
    pub fn intent(&self) -> Intent {
        match self {
            FieldSet::Book(_) => Intent::Book,
            FieldSet::Cancel(_) => Intent::Cancel,
            FieldSet::Reschedule(_) => Intent::Reschedule,
        }
    }
}
