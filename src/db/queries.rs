use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, ErrorCode};

use crate::models::{
    Appointment, AppointmentKey, Intent, NewAppointment, Session, Turn, WriteOutcome,
};
use crate::services::normalizer::{format_date, format_time};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Appointments ──

pub fn slot_taken(conn: &Connection, date: NaiveDate, time: NaiveTime) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE date = ?1 AND time = ?2",
        params![format_date(&date), format_time(&time)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn appointment_exists(conn: &Connection, key: &AppointmentKey) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE name = ?1 AND email = ?2 AND date = ?3 AND time = ?4",
        params![
            key.name,
            key.email,
            format_date(&key.date),
            format_time(&key.time)
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Inserts unless another appointment already holds the (date, time); the
/// UNIQUE constraint makes the check and the write a single atomic step.
pub fn insert_appointment(
    conn: &Connection,
    appointment: &NewAppointment,
) -> anyhow::Result<WriteOutcome> {
    let created_at = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let result = conn.execute(
        "INSERT INTO appointments (name, email, reason, date, time, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            appointment.name,
            appointment.email,
            appointment.reason,
            format_date(&appointment.date),
            format_time(&appointment.time),
            created_at,
        ],
    );

    match result {
        Ok(_) => Ok(WriteOutcome::Written),
        Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Conflict),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_appointment(conn: &Connection, key: &AppointmentKey) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM appointments
         WHERE name = ?1 AND email = ?2 AND date = ?3 AND time = ?4",
        params![
            key.name,
            key.email,
            format_date(&key.date),
            format_time(&key.time)
        ],
    )?;
    Ok(count)
}

pub fn move_appointment(
    conn: &Connection,
    key: &AppointmentKey,
    new_date: NaiveDate,
    new_time: NaiveTime,
) -> anyhow::Result<WriteOutcome> {
    let result = conn.execute(
        "UPDATE appointments SET date = ?1, time = ?2
         WHERE name = ?3 AND email = ?4 AND date = ?5 AND time = ?6",
        params![
            format_date(&new_date),
            format_time(&new_time),
            key.name,
            key.email,
            format_date(&key.date),
            format_time(&key.time),
        ],
    );

    match result {
        Ok(0) => Ok(WriteOutcome::NoMatch),
        Ok(_) => Ok(WriteOutcome::Written),
        Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Conflict),
        Err(e) => Err(e.into()),
    }
}

pub fn booked_times(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<NaiveTime>> {
    let mut stmt =
        conn.prepare("SELECT time FROM appointments WHERE date = ?1 ORDER BY time ASC")?;
    let rows = stmt.query_map(params![format_date(&date)], |row| row.get::<_, String>(0))?;

    let mut times = vec![];
    for row in rows {
        let raw = row?;
        match NaiveTime::parse_from_str(&raw, "%H:%M:%S") {
            Ok(t) => times.push(t),
            Err(_) => tracing::warn!(time = %raw, "skipping unparseable stored time"),
        }
    }
    Ok(times)
}

pub fn list_appointments(
    conn: &Connection,
    date: Option<NaiveDate>,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (&str, Vec<String>) = match date {
        Some(d) => (
            "SELECT id, name, email, reason, date, time, created_at \
             FROM appointments WHERE date = ?1 ORDER BY date ASC, time ASC",
            vec![format_date(&d)],
        ),
        None => (
            "SELECT id, name, email, reason, date, time, created_at \
             FROM appointments ORDER BY date ASC, time ASC",
            vec![],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let reason: Option<String> = row.get(3)?;
    let date_str: String = row.get(4)?;
    let time_str: String = row.get(5)?;
    let created_at_str: String = row.get(6)?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")?;
    let time = NaiveTime::parse_from_str(&time_str, "%H:%M:%S")?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        id,
        name,
        email,
        reason,
        date,
        time,
        created_at,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ── Sessions ──

pub fn get_session(conn: &Connection, key: &str) -> anyhow::Result<Option<Session>> {
    let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let result = conn.query_row(
        "SELECT session_key, intent, history, created_at, last_activity, expires_at
         FROM sessions WHERE session_key = ?1 AND expires_at > ?2",
        params![key, now],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    );

    let (key, intent_str, history_json, created_at, last_activity, expires_at) = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let Some(intent) = Intent::parse(&intent_str) else {
        tracing::warn!(session = %key, intent = %intent_str, "dropping session with unknown intent");
        return Ok(None);
    };
    let history: Vec<Turn> = serde_json::from_str(&history_json)?;

    Ok(Some(Session {
        key,
        intent,
        history,
        created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)?,
        last_activity: NaiveDateTime::parse_from_str(&last_activity, TIMESTAMP_FORMAT)?,
        expires_at: NaiveDateTime::parse_from_str(&expires_at, TIMESTAMP_FORMAT)?,
    }))
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let history_json = serde_json::to_string(&session.history)?;

    conn.execute(
        "INSERT INTO sessions (session_key, intent, history, created_at, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(session_key) DO UPDATE SET
           intent = excluded.intent,
           history = excluded.history,
           created_at = excluded.created_at,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![
            session.key,
            session.intent.as_str(),
            history_json,
            session.created_at.format(TIMESTAMP_FORMAT).to_string(),
            session.last_activity.format(TIMESTAMP_FORMAT).to_string(),
            session.expires_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn delete_session(conn: &Connection, key: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE session_key = ?1", params![key])?;
    Ok(count > 0)
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}
