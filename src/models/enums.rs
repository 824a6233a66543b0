use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
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

str_enum!(AppointmentStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
});

impl AppointmentStatus {
    /// Terminal statuses accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }

    /// Whether `target` is a legal next status from `self`.
    ///
    /// pending -> approved | rejected | cancelled
    /// approved -> completed
    pub fn can_transition_to(&self, target: AppointmentStatus) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Completed)
        )
    }

    /// The only status a record may currently hold for `target` to be
    /// reachable. `None` when no transition leads to `target`.
    pub fn required_from(target: AppointmentStatus) -> Option<AppointmentStatus> {
        match target {
            Self::Approved | Self::Rejected | Self::Cancelled => Some(Self::Pending),
            Self::Completed => Some(Self::Approved),
            Self::Pending => None,
        }
    }
}

/// Event tags on the appointment -> notification wire.
///
/// Serialized with the dotted names the HTTP envelope carries, so the
/// blanket `rename_all` used by `str_enum!` does not fit here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "appointment.created")]
    Created,
    #[serde(rename = "appointment.approved")]
    Approved,
    #[serde(rename = "appointment.rejected")]
    Rejected,
    #[serde(rename = "appointment.completed")]
    Completed,
    #[serde(rename = "appointment.cancelled")]
    Cancelled,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "appointment.created",
            Self::Approved => "appointment.approved",
            Self::Rejected => "appointment.rejected",
            Self::Completed => "appointment.completed",
            Self::Cancelled => "appointment.cancelled",
        }
    }

    /// The event tag announcing that an appointment reached `status`.
    ///
    /// Derived from the resulting status after a committed transition;
    /// `pending` is the creation status and maps to `Created`.
    pub fn for_status(status: AppointmentStatus) -> EventType {
        match status {
            AppointmentStatus::Pending => Self::Created,
            AppointmentStatus::Approved => Self::Approved,
            AppointmentStatus::Rejected => Self::Rejected,
            AppointmentStatus::Completed => Self::Completed,
            AppointmentStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appointment.created" => Ok(Self::Created),
            "appointment.approved" => Ok(Self::Approved),
            "appointment.rejected" => Ok(Self::Rejected),
            "appointment.completed" => Ok(Self::Completed),
            "appointment.cancelled" => Ok(Self::Cancelled),
            _ => Err(DatabaseError::InvalidEnum {
                field: "EventType".into(),
                value: s.into(),
            }),
        }
    }
}
