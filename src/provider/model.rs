//! Records produced by providers and passed through the HTTP layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single calendar entry. Times are local to the display timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub subject: String,
    pub organizer: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Booking {
    /// True if this booking intersects the half-open range `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }

    pub fn is_active_at(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

/// A room and its bookings for the current day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: String,
    pub name: String,
    pub bookings: Vec<Booking>,
    /// Booking in progress at the time the record was built.
    pub current: Option<Booking>,
    /// First booking starting after that time.
    pub next: Option<Booking>,
}

impl RoomRecord {
    /// Build a record, ordering bookings and deriving `current` and `next` at `now`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mut bookings: Vec<Booking>,
        now: NaiveDateTime,
    ) -> Self {
        bookings.sort_by_key(|b| b.start);
        let current = bookings.iter().find(|b| b.is_active_at(now)).cloned();
        let next = bookings.iter().find(|b| b.start > now).cloned();
        Self {
            id: id.into(),
            name: name.into(),
            bookings,
            current,
            next,
        }
    }
}

/// Result of an InstaBook attempt, serialized verbatim to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub success: bool,
    pub message: String,
    pub booking: Option<Booking>,
}

impl BookingOutcome {
    pub fn booked(booking: Booking) -> Self {
        Self {
            success: true,
            message: "Room booked".to_string(),
            booking: Some(booking),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            booking: None,
        }
    }
}
