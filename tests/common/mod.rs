//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use futures_util::future::BoxFuture;
use room_display::config::AppConfig;
use room_display::provider::{
    Booking, BookingOutcome, ProviderError, RoomDataProvider, RoomRecord,
};
use room_display::{HttpServer, ServerMode, Shutdown};
use tokio::net::TcpListener;

/// Provider that records every call and answers with canned data.
#[derive(Default)]
pub struct RecordingProvider {
    pub rooms: Vec<RoomRecord>,
    pub fail: bool,
    pub data_calls: AtomicUsize,
    pub bookings: Mutex<Vec<(String, u32)>>,
}

impl RecordingProvider {
    pub fn with_rooms(rooms: Vec<RoomRecord>) -> Self {
        Self {
            rooms,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    pub fn booking_calls(&self) -> Vec<(String, u32)> {
        self.bookings.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.data_calls() + self.booking_calls().len()
    }
}

impl RoomDataProvider for RecordingProvider {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn get_room_data(&self) -> BoxFuture<'_, Result<Vec<RoomRecord>, ProviderError>> {
        Box::pin(async move {
            self.data_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Decode("calendar exploded".to_string()));
            }
            Ok(self.rooms.clone())
        })
    }

    fn add_booking<'a>(
        &'a self,
        room_id: &'a str,
        length_minutes: u32,
    ) -> BoxFuture<'a, Result<BookingOutcome, ProviderError>> {
        Box::pin(async move {
            self.bookings
                .lock()
                .unwrap()
                .push((room_id.to_string(), length_minutes));
            if self.fail {
                return Err(ProviderError::Decode("calendar exploded".to_string()));
            }
            Ok(BookingOutcome::rejected(format!(
                "{room_id} not bookable for {length_minutes}"
            )))
        })
    }
}

#[allow(dead_code)]
pub fn sample_rooms() -> Vec<RoomRecord> {
    let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let booking = Booking {
        subject: "Design review".to_string(),
        organizer: Some("Ada".to_string()),
        start: day.and_hms_opt(9, 0, 0).unwrap(),
        end: day.and_hms_opt(10, 0, 0).unwrap(),
    };
    vec![
        RoomRecord::new("r1", "Blue Room", vec![booking], day.and_hms_opt(9, 30, 0).unwrap()),
        RoomRecord::new("r2", "Red Room", Vec::new(), day.and_hms_opt(9, 30, 0).unwrap()),
    ]
}

/// A running server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(config: AppConfig, provider: Arc<dyn RoomDataProvider>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();

        let server = HttpServer::new(Arc::new(config), provider, ServerMode::Debug);
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
