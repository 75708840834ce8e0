use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Appointment, AppointmentKey, NewAppointment, WriteOutcome};

/// The shared appointment calendar. Every operation is a single atomic step;
/// implementations must refuse a second record on an occupied (date, time).
pub trait AppointmentStore: Send + Sync {
    fn exists(&self, date: NaiveDate, time: NaiveTime) -> anyhow::Result<bool>;
    fn exists_match(&self, key: &AppointmentKey) -> anyhow::Result<bool>;
    fn insert(&self, appointment: &NewAppointment) -> anyhow::Result<WriteOutcome>;
    fn delete_match(&self, key: &AppointmentKey) -> anyhow::Result<usize>;
    fn update_match(
        &self,
        key: &AppointmentKey,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> anyhow::Result<WriteOutcome>;
    fn booked_times(&self, date: NaiveDate) -> anyhow::Result<Vec<NaiveTime>>;
    fn list(&self, date: Option<NaiveDate>) -> anyhow::Result<Vec<Appointment>>;
}

#[derive(Clone)]
pub struct SqliteAppointmentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAppointmentStore {
    pub fn new(conn: Connection) -> Self {
        Self::shared(Arc::new(Mutex::new(conn)))
    }

    pub fn shared(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}

impl AppointmentStore for SqliteAppointmentStore {
    fn exists(&self, date: NaiveDate, time: NaiveTime) -> anyhow::Result<bool> {
        let conn = self.lock()?;
        queries::slot_taken(&conn, date, time)
    }

    fn exists_match(&self, key: &AppointmentKey) -> anyhow::Result<bool> {
        let conn = self.lock()?;
        queries::appointment_exists(&conn, key)
    }

    fn insert(&self, appointment: &NewAppointment) -> anyhow::Result<WriteOutcome> {
        let conn = self.lock()?;
        queries::insert_appointment(&conn, appointment)
    }

    fn delete_match(&self, key: &AppointmentKey) -> anyhow::Result<usize> {
        let conn = self.lock()?;
        queries::delete_appointment(&conn, key)
    }

    fn update_match(
        &self,
        key: &AppointmentKey,
        new_date: NaiveDate,
        new_time: NaiveTime,
    ) -> anyhow::Result<WriteOutcome> {
        let conn = self.lock()?;
        queries::move_appointment(&conn, key, new_date, new_time)
    }

    fn booked_times(&self, date: NaiveDate) -> anyhow::Result<Vec<NaiveTime>> {
        let conn = self.lock()?;
        queries::booked_times(&conn, date)
    }

    fn list(&self, date: Option<NaiveDate>) -> anyhow::Result<Vec<Appointment>> {
        let conn = self.lock()?;
        queries::list_appointments(&conn, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_store_operations_through_shared_connection() {
        let conn = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
        let store = SqliteAppointmentStore::shared(Arc::clone(&conn));
        let date = NaiveDate::from_ymd_opt(2025, 7, 22).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let key = AppointmentKey {
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            date,
            time: nine,
        };

        let written = store
            .insert(&NewAppointment {
                name: key.name.clone(),
                email: key.email.clone(),
                reason: None,
                date,
                time: nine,
            })
            .unwrap();
        assert_eq!(written, WriteOutcome::Written);
        assert!(store.exists(date, nine).unwrap());
        assert!(store.exists_match(&key).unwrap());

        assert_eq!(store.update_match(&key, date, ten).unwrap(), WriteOutcome::Written);
        assert_eq!(store.booked_times(date).unwrap(), vec![ten]);
        assert_eq!(store.list(Some(date)).unwrap().len(), 1);

        let moved = AppointmentKey { time: ten, ..key };
        assert_eq!(store.delete_match(&moved).unwrap(), 1);
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_inserts_same_slot_single_winner() {
        let store = SqliteAppointmentStore::new(db::init_db(":memory:").unwrap());
        let date = NaiveDate::from_ymd_opt(2025, 7, 22).unwrap();
        let time = NaiveTime::from_hms_opt(11, 0, 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .insert(&NewAppointment {
                            name: format!("Patient {i}"),
                            email: format!("p{i}@example.com"),
                            reason: None,
                            date,
                            time,
                        })
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<WriteOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let written = outcomes.iter().filter(|o| **o == WriteOutcome::Written).count();
        assert_eq!(written, 1);
        assert_eq!(store.booked_times(date).unwrap(), vec![time]);
    }
}
