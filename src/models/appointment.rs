use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub reason: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub name: String,
    pub email: String,
    pub reason: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[cfg(test)]
impl NewAppointment {
    pub fn key(&self) -> AppointmentKey {
        AppointmentKey {
            name: self.name.clone(),
            email: self.email.clone(),
            date: self.date,
            time: self.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentKey {
    pub name: String,
    pub email: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Conflict,
    NoMatch,
}
