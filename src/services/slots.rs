use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::db::store::AppointmentStore;

const SLOT_HOURS: [u32; 8] = [9, 10, 11, 12, 14, 15, 16, 17];

pub fn slot_grid() -> Vec<NaiveTime> {
    SLOT_HOURS
        .iter()
        .filter_map(|h| NaiveTime::from_hms_opt(*h, 0, 0))
        .collect()
}

pub fn is_slot(time: &NaiveTime) -> bool {
    time.minute() == 0
        && time.second() == 0
        && time.nanosecond() == 0
        && SLOT_HOURS.contains(&time.hour())
}

pub fn available(store: &dyn AppointmentStore, date: NaiveDate) -> anyhow::Result<Vec<NaiveTime>> {
    let booked = store.booked_times(date)?;
    Ok(slot_grid()
        .into_iter()
        .filter(|slot| !booked.contains(slot))
        .collect())
}
