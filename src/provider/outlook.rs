//! Outlook calendar backend.
//!
//! # Responsibilities
//! - Resolve the room directory (configured map or room search)
//! - Read each room's calendar view for the current local day
//! - Create InstaBook events after checking the requested slot is free
//!
//! # Design Decisions
//! - All times are exchanged in the display timezone via the `Prefer` header
//! - The assembled room list is cached for the refresh interval
//! - A successful booking drops the cache so the next `/data` sees it

use std::collections::BTreeMap;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use futures_util::future::{try_join_all, BoxFuture};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::OutlookConfig;
use crate::provider::model::{Booking, BookingOutcome, RoomRecord};
use crate::provider::{ProviderError, RoomDataProvider};

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const INSTABOOK_SUBJECT: &str = "InstaBook";

/// Where the list of rooms comes from.
#[derive(Debug, Clone)]
pub enum RoomDirectory {
    /// Room address -> display name.
    Fixed(BTreeMap<String, String>),
    /// Rooms from `/me/findrooms` whose name contains the term.
    Search(String),
}

struct CachedRooms {
    fetched_at: Instant,
    rooms: Vec<RoomRecord>,
}

pub struct OutlookProvider {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    directory: RoomDirectory,
    refresh: StdDuration,
    tz: Tz,
    cache: RwLock<Option<CachedRooms>>,
}

impl OutlookProvider {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        directory: RoomDirectory,
        refresh: StdDuration,
        tz: Tz,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            directory,
            refresh,
            tz,
            cache: RwLock::new(None),
        }
    }

    pub fn from_config(config: &OutlookConfig, tz: Tz) -> Result<Self, ProviderError> {
        let missing = |key: &str| ProviderError::Config(format!("{key} is not set"));

        let base_url = config.ews_url.as_deref().ok_or_else(|| missing("OUTLOOK_EWS_URL"))?;
        let username = config.username.as_deref().ok_or_else(|| missing("OUTLOOK_USERNAME"))?;
        let password = config.password.as_deref().ok_or_else(|| missing("OUTLOOK_PASSWORD"))?;

        let directory = match (&config.room_dict, &config.room_search_term) {
            (Some(rooms), _) => RoomDirectory::Fixed(rooms.clone()),
            (None, Some(term)) => RoomDirectory::Search(term.clone()),
            (None, None) => return Err(missing("OUTLOOK_ROOM_DICT")),
        };

        Ok(Self::new(
            base_url,
            qualified_username(config.domain.as_deref(), username),
            password,
            directory,
            StdDuration::from_secs(config.refresh_time_seconds),
            tz,
        ))
    }

    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.username, Some(&self.password))
            .header("Prefer", format!("outlook.timezone=\"{}\"", self.tz.name()))
    }

    fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, ProviderError> {
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| {
                ProviderError::Decode(format!("{local} does not exist in {}", self.tz.name()))
            })
    }

    /// `(address, display name)` for every room.
    async fn rooms(&self) -> Result<Vec<(String, String)>, ProviderError> {
        match &self.directory {
            RoomDirectory::Fixed(rooms) => Ok(rooms
                .iter()
                .map(|(address, name)| (address.clone(), name.clone()))
                .collect()),
            RoomDirectory::Search(term) => {
                let url = format!("{}/me/findrooms", self.base_url);
                let found: ODataList<RoomEntry> =
                    send_json(self.authorized(self.client.get(url))).await?;
                let term = term.to_lowercase();
                Ok(found
                    .value
                    .into_iter()
                    .filter(|room| room.name.to_lowercase().contains(&term))
                    .map(|room| (room.address, room.name))
                    .collect())
            }
        }
    }

    async fn calendar_view(
        &self,
        room: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Booking>, ProviderError> {
        let url = format!("{}/users/{}/calendarview", self.base_url, room);
        let query = [
            ("startDateTime", utc_param(self.to_utc(start)?)),
            ("endDateTime", utc_param(self.to_utc(end)?)),
        ];
        let events: ODataList<Event> =
            send_json(self.authorized(self.client.get(url)).query(&query)).await?;
        events.value.into_iter().map(Event::into_booking).collect()
    }

    async fn fetch_room_data(&self) -> Result<Vec<RoomRecord>, ProviderError> {
        let now = self.now();
        let day_start = now.date().and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        let rooms = self.rooms().await?;
        let views = try_join_all(
            rooms
                .iter()
                .map(|(address, _)| self.calendar_view(address, day_start, day_end)),
        )
        .await?;

        Ok(rooms
            .into_iter()
            .zip(views)
            .map(|((address, name), bookings)| RoomRecord::new(address, name, bookings, now))
            .collect())
    }

    async fn room_data(&self) -> Result<Vec<RoomRecord>, ProviderError> {
        let now = self.now();
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.refresh {
                tracing::debug!("Serving cached room data");
                return Ok(cached
                    .rooms
                    .iter()
                    .map(|r| RoomRecord::new(r.id.clone(), r.name.clone(), r.bookings.clone(), now))
                    .collect());
            }
        }

        let rooms = self.fetch_room_data().await?;
        tracing::debug!(rooms = rooms.len(), "Fetched room data from Outlook");
        *self.cache.write().await = Some(CachedRooms {
            fetched_at: Instant::now(),
            rooms: rooms.clone(),
        });
        Ok(rooms)
    }

    async fn book(&self, room_id: &str, length_minutes: u32) -> Result<BookingOutcome, ProviderError> {
        let Some((address, name)) = self
            .rooms()
            .await?
            .into_iter()
            .find(|(address, _)| address == room_id)
        else {
            return Ok(BookingOutcome::rejected(format!("Unknown room {room_id}")));
        };
        if length_minutes == 0 {
            return Ok(BookingOutcome::rejected("Booking length must be positive"));
        }

        let now = self.now();
        let start = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);
        let end = start + Duration::minutes(i64::from(length_minutes));

        let existing = self.calendar_view(&address, start, end).await?;
        if existing.iter().any(|b| b.overlaps(start, end)) {
            tracing::info!(room_id, "InstaBook rejected, room is busy");
            return Ok(BookingOutcome::rejected("Room is already booked for that time"));
        }

        let tz_name = self.tz.name();
        let body = serde_json::json!({
            "Subject": INSTABOOK_SUBJECT,
            "Start": { "DateTime": start.format(DATE_TIME_FORMAT).to_string(), "TimeZone": tz_name },
            "End": { "DateTime": end.format(DATE_TIME_FORMAT).to_string(), "TimeZone": tz_name },
            "Location": { "DisplayName": name },
            "Attendees": [{
                "EmailAddress": { "Address": address, "Name": name },
                "Type": "Resource",
            }],
        });
        let url = format!("{}/users/{}/events", self.base_url, address);
        let created: Event = send_json(self.authorized(self.client.post(url)).json(&body)).await?;

        *self.cache.write().await = None;
        tracing::info!(room_id, length_minutes, start = %start, "Room booked");
        Ok(BookingOutcome::booked(created.into_booking()?))
    }
}

impl RoomDataProvider for OutlookProvider {
    fn name(&self) -> &'static str {
        "outlook"
    }

    fn get_room_data(&self) -> BoxFuture<'_, Result<Vec<RoomRecord>, ProviderError>> {
        Box::pin(self.room_data())
    }

    fn add_booking<'a>(
        &'a self,
        room_id: &'a str,
        length_minutes: u32,
    ) -> BoxFuture<'a, Result<BookingOutcome, ProviderError>> {
        Box::pin(self.book(room_id, length_minutes))
    }
}

fn qualified_username(domain: Option<&str>, username: &str) -> String {
    match domain {
        Some(domain) if !username.contains('@') && !username.contains('\\') => {
            format!("{domain}\\{username}")
        }
        _ => username.to_string(),
    }
}

fn utc_param(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status { status, body });
    }
    response
        .json()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ODataList<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoomEntry {
    name: String,
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Event {
    subject: Option<String>,
    organizer: Option<Recipient>,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EventTime {
    date_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Recipient {
    email_address: EmailAddress,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmailAddress {
    name: Option<String>,
    address: Option<String>,
}

impl Event {
    fn into_booking(self) -> Result<Booking, ProviderError> {
        Ok(Booking {
            subject: self.subject.unwrap_or_default(),
            organizer: self
                .organizer
                .and_then(|o| o.email_address.name.or(o.email_address.address)),
            start: parse_local(&self.start.date_time)?,
            end: parse_local(&self.end.date_time)?,
        })
    }
}

fn parse_local(raw: &str) -> Result<NaiveDateTime, ProviderError> {
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .map_err(|e| ProviderError::Decode(format!("bad timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_qualified_username() {
        assert_eq!(qualified_username(Some("CORP"), "svc"), "CORP\\svc");
        assert_eq!(qualified_username(Some("CORP"), "svc@corp.com"), "svc@corp.com");
        assert_eq!(qualified_username(None, "svc"), "svc");
    }

    #[test]
    fn test_parse_outlook_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_local("2024-03-04T09:30:00.0000000").unwrap(), expected);
        assert_eq!(parse_local("2024-03-04T09:30:00").unwrap(), expected);
        assert!(matches!(parse_local("tomorrow"), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn test_event_without_organizer() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "Subject": "Retro",
            "Start": { "DateTime": "2024-03-04T09:00:00.0000000", "TimeZone": "Europe/London" },
            "End": { "DateTime": "2024-03-04T10:00:00.0000000", "TimeZone": "Europe/London" }
        }))
        .unwrap();
        let booking = event.into_booking().unwrap();
        assert_eq!(booking.subject, "Retro");
        assert!(booking.organizer.is_none());
    }

    #[test]
    fn test_from_config_requires_directory() {
        let config = OutlookConfig {
            domain: Some("CORP".to_string()),
            ews_url: Some("https://outlook.example.com/api/v2.0/".to_string()),
            username: Some("svc".to_string()),
            password: Some("secret".to_string()),
            ..OutlookConfig::default()
        };
        assert!(matches!(
            OutlookProvider::from_config(&config, chrono_tz::UTC),
            Err(ProviderError::Config(_))
        ));

        let config = OutlookConfig {
            room_search_term: Some("Room".to_string()),
            ..config
        };
        let provider = OutlookProvider::from_config(&config, chrono_tz::UTC).unwrap();
        assert_eq!(provider.base_url, "https://outlook.example.com/api/v2.0");
        assert_eq!(provider.username, "CORP\\svc");
    }
}
