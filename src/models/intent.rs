use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Book,
    Cancel,
    Reschedule,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Book => "book",
            Intent::Cancel => "cancel",
            Intent::Reschedule => "reschedule",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "book" => Some(Intent::Book),
            "cancel" => Some(Intent::Cancel),
            "reschedule" => Some(Intent::Reschedule),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_intents() {
        assert_eq!(Intent::parse("book"), Some(Intent::Book));
        assert_eq!(Intent::parse(" Cancel "), Some(Intent::Cancel));
        assert_eq!(Intent::parse("RESCHEDULE"), Some(Intent::Reschedule));
    }

    #[test]
    fn test_parse_unknown_intent() {
        assert_eq!(Intent::parse("refund"), None);
        assert_eq!(Intent::parse(""), None);
    }

    #[test]
    fn test_as_str_round_trips_through_parse() {
        for intent in [Intent::Book, Intent::Cancel, Intent::Reschedule] {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
    }
}
