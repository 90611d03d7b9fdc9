//! Deterministic demo backend.
//!
//! Generates a fixed set of rooms with a repeatable daily schedule and keeps
//! InstaBook bookings in memory, so the frontend can be tried without a
//! calendar server.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use futures_util::future::BoxFuture;

use crate::provider::model::{Booking, BookingOutcome, RoomRecord};
use crate::provider::{ProviderError, RoomDataProvider};

const ROOMS: [(&str, &str); 4] = [
    ("demo-boardroom", "Boardroom"),
    ("demo-blue", "Blue Room"),
    ("demo-green", "Green Room"),
    ("demo-huddle", "Huddle Space"),
];

const SUBJECTS: [&str; 5] = [
    "Team sync",
    "Interview",
    "Sprint planning",
    "1:1",
    "Customer call",
];

const FIRST_HOUR: u32 = 8;
const LAST_HOUR: u32 = 18;

pub struct DemoProvider {
    tz: Tz,
    instabooks: Mutex<HashMap<String, Vec<Booking>>>,
}

impl DemoProvider {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            instabooks: Mutex::new(HashMap::new()),
        }
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    /// Room state as seen at `now`.
    ///
    /// InstaBooks are shown if they touch the current day, so a booking
    /// running past midnight stays visible until it ends.
    pub fn rooms_at(&self, now: NaiveDateTime) -> Vec<RoomRecord> {
        let (day_start, day_end) = day_bounds(now);
        let mut instabooks = self.instabooks.lock().unwrap_or_else(PoisonError::into_inner);
        prune_before(&mut instabooks, day_start);
        ROOMS
            .iter()
            .enumerate()
            .map(|(index, (id, name))| {
                let mut bookings = scheduled(index, now);
                if let Some(extra) = instabooks.get(*id) {
                    bookings.extend(
                        extra
                            .iter()
                            .filter(|b| b.overlaps(day_start, day_end))
                            .cloned(),
                    );
                }
                RoomRecord::new(*id, *name, bookings, now)
            })
            .collect()
    }

    /// Attempt an InstaBook starting at `now`.
    pub fn book_at(&self, room_id: &str, length_minutes: u32, now: NaiveDateTime) -> BookingOutcome {
        let Some(index) = ROOMS.iter().position(|(id, _)| *id == room_id) else {
            return BookingOutcome::rejected(format!("Unknown room {room_id}"));
        };
        if length_minutes == 0 {
            return BookingOutcome::rejected("Booking length must be positive");
        }

        let start = truncate_to_minute(now);
        let end = start + Duration::minutes(i64::from(length_minutes));

        let mut instabooks = self.instabooks.lock().unwrap_or_else(PoisonError::into_inner);
        prune_before(&mut instabooks, day_bounds(now).0);
        let existing = instabooks.entry(room_id.to_string()).or_default();

        let busy = scheduled(index, now)
            .iter()
            .chain(existing.iter())
            .any(|b| b.overlaps(start, end));
        if busy {
            return BookingOutcome::rejected("Room is already booked for that time");
        }

        let booking = Booking {
            subject: "InstaBook".to_string(),
            organizer: None,
            start,
            end,
        };
        existing.push(booking.clone());
        tracing::info!(room_id, length_minutes, start = %start, "Demo room booked");
        BookingOutcome::booked(booking)
    }
}

impl RoomDataProvider for DemoProvider {
    fn name(&self) -> &'static str {
        "demo"
    }

    fn get_room_data(&self) -> BoxFuture<'_, Result<Vec<RoomRecord>, ProviderError>> {
        Box::pin(async move { Ok(self.rooms_at(self.now())) })
    }

    fn add_booking<'a>(
        &'a self,
        room_id: &'a str,
        length_minutes: u32,
    ) -> BoxFuture<'a, Result<BookingOutcome, ProviderError>> {
        Box::pin(async move { Ok(self.book_at(room_id, length_minutes, self.now())) })
    }
}

/// The generated schedule for room `index` on the day of `now`.
fn scheduled(index: usize, now: NaiveDateTime) -> Vec<Booking> {
    let date = now.date();
    (FIRST_HOUR..LAST_HOUR)
        .filter_map(|hour| {
            let seed = hour as usize + index;
            if seed % 3 != 0 {
                return None;
            }
            let start = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?);
            let minutes = if seed % 2 == 0 { 30 } else { 60 };
            Some(Booking {
                subject: SUBJECTS[seed % SUBJECTS.len()].to_string(),
                organizer: Some(format!("Demo Organizer {}", seed % 7 + 1)),
                start,
                end: start + Duration::minutes(minutes),
            })
        })
        .collect()
}

/// Midnight at the start of `now`'s day and of the following day.
fn day_bounds(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = now.date().and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

/// Drop InstaBooks that ended before `cutoff`.
fn prune_before(instabooks: &mut HashMap<String, Vec<Booking>>, cutoff: NaiveDateTime) {
    instabooks.retain(|_, bookings| {
        bookings.retain(|b| b.end > cutoff);
        !bookings.is_empty()
    });
}

fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}
