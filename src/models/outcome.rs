use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::services::normalizer::{display_time, format_date};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Booked {
        date: NaiveDate,
        time: NaiveTime,
    },
    SlotTaken {
        date: NaiveDate,
        time: NaiveTime,
        available: Vec<NaiveTime>,
    },
    NoSuchSlot {
        date: NaiveDate,
        time: NaiveTime,
        available: Vec<NaiveTime>,
    },
    Cancelled {
        date: NaiveDate,
        time: NaiveTime,
    },
    NotFound,
    Rescheduled {
        from_date: NaiveDate,
        from_time: NaiveTime,
        to_date: NaiveDate,
        to_time: NaiveTime,
    },
    RescheduleNotFound,
    RescheduleSlotTaken {
        date: NaiveDate,
        time: NaiveTime,
        available: Vec<NaiveTime>,
    },
    TimeFormatError {
        field: &'static str,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Booked { .. } | Outcome::Cancelled { .. } | Outcome::Rescheduled { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            Outcome::Booked { date, time } => format!(
                "Your appointment on {} at {} has been booked. Thank you!",
                format_date(date),
                display_time(time)
            ),
            Outcome::SlotTaken {
                date,
                time,
                available,
            } => format!(
                "Sorry, {} on {} is already booked. {}",
                display_time(time),
                format_date(date),
                suggest(available)
            ),
            Outcome::NoSuchSlot {
                date,
                time,
                available,
            } => format!(
                "Sorry, {} is not one of our appointment times on {}. {}",
                display_time(time),
                format_date(date),
                suggest(available)
            ),
            Outcome::Cancelled { date, time } => format!(
                "Your appointment on {} at {} has been cancelled.",
                format_date(date),
                display_time(time)
            ),
            Outcome::NotFound => {
                "I couldn't find an appointment matching those details, so nothing was cancelled."
                    .to_string()
            }
            Outcome::Rescheduled {
                from_date,
                from_time,
                to_date,
                to_time,
            } => format!(
                "Your appointment has been moved from {} at {} to {} at {}.",
                format_date(from_date),
                display_time(from_time),
                format_date(to_date),
                display_time(to_time)
            ),
            Outcome::RescheduleNotFound => {
                "I couldn't find an appointment matching your current booking details, so nothing was changed."
                    .to_string()
            }
            Outcome::RescheduleSlotTaken {
                date,
                time,
                available,
            } => format!(
                "Sorry, {} on {} is already taken, so your appointment was not moved. {}",
                display_time(time),
                format_date(date),
                suggest(available)
            ),
            Outcome::TimeFormatError { field } => format!(
                "I couldn't understand the {} you gave. Please start again using a date like 2025-07-22 and a time like 10:00 AM.",
                field.replace('_', " ")
            ),
        }
    }
}

fn suggest(available: &[NaiveTime]) -> String {
    if available.is_empty() {
        return "There are no open times left that day; please start again with another date."
            .to_string();
    }
    let times = available
        .iter()
        .map(display_time)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Available times that day: {times}. Please start again to pick one.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 22).unwrap()
    }

    #[test]
    fn test_booked_message() {
        let msg = Outcome::Booked { date: d(), time: t(14) }.message();
        assert_eq!(
            msg,
            "Your appointment on 2025-07-22 at 2:00 PM has been booked. Thank you!"
        );
    }

    #[test]
    fn test_slot_taken_lists_alternatives() {
        let msg = Outcome::SlotTaken {
            date: d(),
            time: t(10),
            available: vec![t(9), t(11)],
        }
        .message();
        assert!(msg.contains("10:00 AM on 2025-07-22 is already booked"));
        assert!(msg.contains("9:00 AM, 11:00 AM"));
    }

    #[test]
    fn test_no_alternatives_left() {
        let msg = Outcome::RescheduleSlotTaken {
            date: d(),
            time: t(10),
            available: vec![],
        }
        .message();
        assert!(msg.contains("no open times left"));
    }

    #[test]
    fn test_time_format_error_names_field() {
        let msg = Outcome::TimeFormatError { field: "new_time" }.message();
        assert!(msg.contains("new time"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(Outcome::NotFound).unwrap();
        assert_eq!(json["kind"], "not_found");

        let json = serde_json::to_value(Outcome::Booked { date: d(), time: t(9) }).unwrap();
        assert_eq!(json["kind"], "booked");
        assert_eq!(json["date"], "2025-07-22");
        assert_eq!(json["time"], "09:00:00");
    }

    #[test]
    fn test_success_kinds() {
        assert!(Outcome::Cancelled { date: d(), time: t(9) }.is_success());
        assert!(!Outcome::NotFound.is_success());
        assert!(!Outcome::TimeFormatError { field: "time" }.is_success());
    }
}
