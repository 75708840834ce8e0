pub mod appointment;
pub mod conversation;
pub mod fields;
pub mod intent;
pub mod outcome;

pub use appointment::{Appointment, AppointmentKey, NewAppointment, WriteOutcome};
pub use conversation::{Role, Session, Turn};
pub use fields::{BookFields, CancelFields, FieldSet, RescheduleFields};
pub use intent::Intent;
pub use outcome::Outcome;
