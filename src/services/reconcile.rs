use chrono::{NaiveDate, NaiveTime};

use crate::db::store::AppointmentStore;
use crate::models::{
    AppointmentKey, BookFields, CancelFields, FieldSet, NewAppointment, Outcome,
    RescheduleFields, WriteOutcome,
};
use crate::services::normalizer::{normalize_date, normalize_time};
use crate::services::slots;

pub fn reconcile(store: &dyn AppointmentStore, fields: &FieldSet) -> anyhow::Result<Outcome> {
    let outcome = match fields {
        FieldSet::Book(f) => book(store, f)?,
        FieldSet::Cancel(f) => cancel(store, f)?,
        FieldSet::Reschedule(f) => reschedule(store, f)?,
    };

    tracing::info!(
        intent = fields.intent().as_str(),
        applied = outcome.is_success(),
        outcome = ?outcome,
        "reconciled"
    );
    Ok(outcome)
}

fn book(store: &dyn AppointmentStore, f: &BookFields) -> anyhow::Result<Outcome> {
    let (date, time) = match normalize_pair(&f.date, &f.time, ("date", "time")) {
        Ok(pair) => pair,
        Err(outcome) => return Ok(outcome),
    };

    let available = slots::available(store, date)?;
    if !available.contains(&time) {
        return Ok(if slots::is_slot(&time) {
            Outcome::SlotTaken {
                date,
                time,
                available,
            }
        } else {
            Outcome::NoSuchSlot {
                date,
                time,
                available,
            }
        });
    }

    let appointment = NewAppointment {
        name: f.name.clone(),
        email: f.email.clone(),
        reason: Some(f.reason.clone()),
        date,
        time,
    };

    match store.insert(&appointment)? {
        WriteOutcome::Written => Ok(Outcome::Booked { date, time }),
        WriteOutcome::Conflict | WriteOutcome::NoMatch => {
            tracing::warn!(%date, %time, "slot taken between availability check and insert");
            Ok(Outcome::SlotTaken {
                date,
                time,
                available: slots::available(store, date)?,
            })
        }
    }
}

fn cancel(store: &dyn AppointmentStore, f: &CancelFields) -> anyhow::Result<Outcome> {
    let (date, time) = match normalize_pair(&f.date, &f.time, ("date", "time")) {
        Ok(pair) => pair,
        Err(outcome) => return Ok(outcome),
    };

    let key = AppointmentKey {
        name: f.name.clone(),
        email: f.email.clone(),
        date,
        time,
    };

    Ok(match store.delete_match(&key)? {
        0 => Outcome::NotFound,
        _ => Outcome::Cancelled { date, time },
    })
}

fn reschedule(store: &dyn AppointmentStore, f: &RescheduleFields) -> anyhow::Result<Outcome> {
    let old = normalize_pair(&f.old_date, &f.old_time, ("old_date", "old_time"));
    let (old_date, old_time) = match old {
        Ok(pair) => pair,
        Err(outcome) => return Ok(outcome),
    };
    let new = normalize_pair(&f.new_date, &f.new_time, ("new_date", "new_time"));
    let (new_date, new_time) = match new {
        Ok(pair) => pair,
        Err(outcome) => return Ok(outcome),
    };

    let key = AppointmentKey {
        name: f.name.clone(),
        email: f.email.clone(),
        date: old_date,
        time: old_time,
    };

    if !store.exists_match(&key)? {
        return Ok(Outcome::RescheduleNotFound);
    }

    let rescheduled = Outcome::Rescheduled {
        from_date: old_date,
        from_time: old_time,
        to_date: new_date,
        to_time: new_time,
    };

    if (old_date, old_time) == (new_date, new_time) {
        return Ok(rescheduled);
    }

    if !slots::is_slot(&new_time) {
        return Ok(Outcome::NoSuchSlot {
            date: new_date,
            time: new_time,
            available: slots::available(store, new_date)?,
        });
    }

    if store.exists(new_date, new_time)? {
        return Ok(Outcome::RescheduleSlotTaken {
            date: new_date,
            time: new_time,
            available: slots::available(store, new_date)?,
        });
    }

    match store.update_match(&key, new_date, new_time)? {
        WriteOutcome::Written => Ok(rescheduled),
        WriteOutcome::NoMatch => Ok(Outcome::RescheduleNotFound),
        WriteOutcome::Conflict => Ok(Outcome::RescheduleSlotTaken {
            date: new_date,
            time: new_time,
            available: slots::available(store, new_date)?,
        }),
    }
}

fn normalize_pair(
    date: &str,
    time: &str,
    names: (&'static str, &'static str),
) -> Result<(NaiveDate, NaiveTime), Outcome> {
    let date = normalize_date(date).ok_or(Outcome::TimeFormatError { field: names.0 })?;
    let time = normalize_time(time).ok_or(Outcome::TimeFormatError { field: names.1 })?;
    Ok((date, time))
}
