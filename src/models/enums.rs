use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(TimePeriod {
    Morning => "morning",
    Afternoon => "afternoon",
    Evening => "evening",
    Night => "night",
});

// Only `Confirmed` is written by the capture flow; the other states are
// reserved for a reminder workflow.
str_enum!(RecordStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Skipped => "skipped",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn time_period_round_trip() {
        for (variant, s) in [
            (TimePeriod::Morning, "morning"),
            (TimePeriod::Afternoon, "afternoon"),
            (TimePeriod::Evening, "evening"),
            (TimePeriod::Night, "night"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(TimePeriod::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn record_status_round_trip() {
        for (variant, s) in [
            (RecordStatus::Pending, "pending"),
            (RecordStatus::Confirmed, "confirmed"),
            (RecordStatus::Skipped, "skipped"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(RecordStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_value_reports_enum_name() {
        let err = TimePeriod::from_str("midnight").unwrap_err();
        match err {
            DatabaseError::InvalidEnum { field, value } => {
                assert_eq!(field, "TimePeriod");
                assert_eq!(value, "midnight");
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn serde_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&TimePeriod::Afternoon).unwrap();
        assert_eq!(json, "\"afternoon\"");
        let status: RecordStatus = serde_json::from_str("\"confirmed\"").unwrap();
        assert_eq!(status, RecordStatus::Confirmed);
    }
}
