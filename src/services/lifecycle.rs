//! Booking status and the transitions the API enforces.
//!
//! Only `cancel` is policy-constrained. `PUT /bookings/:id` may set any
//! status; it goes through [`BookingStatus`] for enum membership only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    CancelledConfirmed,
    Terminated,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::CancelledConfirmed,
        BookingStatus::Terminated,
    ];

    /// Statuses that hold a room and therefore block overlapping bookings.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::CancelledConfirmed => "CANCELLED_CONFIRMED",
            BookingStatus::Terminated => "TERMINATED",
        }
    }

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Status a new booking gets when the request names none.
    pub fn initial(requested: Option<BookingStatus>) -> BookingStatus {
        requested.unwrap_or(BookingStatus::Pending)
    }

    /// Target status of a soft cancel. A confirmed booking keeps the fact
    /// that it had been confirmed.
    pub fn cancel(self) -> Result<BookingStatus, AppError> {
        match self {
            BookingStatus::Pending => Ok(BookingStatus::Cancelled),
            BookingStatus::Confirmed => Ok(BookingStatus::CancelledConfirmed),
            BookingStatus::Cancelled
            | BookingStatus::CancelledConfirmed
            | BookingStatus::Terminated => Err(AppError::InvalidTransition(
                "Booking already cancelled or terminated".to_string(),
            )),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
