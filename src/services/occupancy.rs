use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::errors::EngineResult;
use crate::models::{Booking, Room};
use crate::store::Store;

/// A booking joined with its room for calendar display. The room reference
/// can dangle if a room was removed administratively; the booking is still
/// shown.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithRoom {
    pub booking: Booking,
    pub room: Option<Room>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub category: Option<String>,
    pub room_number: Option<String>,
}

impl RoomFilter {
    fn matches(&self, room: &Room) -> bool {
        self.category
            .as_deref()
            .map_or(true, |c| room.room_category == c)
            && self
                .room_number
                .as_deref()
                .map_or(true, |n| room.room_number == n)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OccupancySnapshot {
    pub occupied: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Per-date index over the active booking set, check-in through checkout
/// INCLUSIVE: a guest departing on date D is still "in house" on D for
/// calendar purposes. Conflict detection elsewhere stays half-open; the two
/// rules coexist on purpose.
pub fn build_occupancy_index(
    bookings: &[Booking],
    rooms: &[Room],
) -> BTreeMap<NaiveDate, Vec<BookingWithRoom>> {
    let by_number: BTreeMap<&str, &Room> =
        rooms.iter().map(|r| (r.room_number.as_str(), r)).collect();

    let mut index: BTreeMap<NaiveDate, Vec<BookingWithRoom>> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.status.is_active()) {
        let room = by_number.get(booking.room_number.as_str()).map(|r| (*r).clone());
        for date in booking.stay().calendar_days() {
            index.entry(date).or_default().push(BookingWithRoom {
                booking: booking.clone(),
                room: room.clone(),
            });
        }
    }
    index
}

/// Share of filtered rooms with an in-house booking on `date`. Derived from
/// the same inclusive rule as the calendar index so report and calendar
/// agree.
pub fn occupancy(
    date: NaiveDate,
    bookings: &[Booking],
    rooms: &[Room],
    filter: &RoomFilter,
) -> OccupancySnapshot {
    let filtered: HashSet<&str> = rooms
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| r.room_number.as_str())
        .collect();
    let total = filtered.len();

    let occupied_rooms: HashSet<&str> = bookings
        .iter()
        .filter(|b| b.status.is_active() && b.stay().in_house_on(date))
        .map(|b| b.room_number.as_str())
        .filter(|n| filtered.contains(n))
        .collect();
    let occupied = occupied_rooms.len();

    let percentage = if total == 0 {
        0.0
    } else {
        100.0 * occupied as f64 / total as f64
    };

    OccupancySnapshot {
        occupied,
        total,
        percentage,
    }
}

/// Store-backed wrapper serving calendar and occupancy views. Always
/// rebuilds from the current booking set; nothing derived is persisted.
#[derive(Clone)]
pub struct OccupancyAggregator {
    store: Arc<dyn Store>,
}

impl OccupancyAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn calendar(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> EngineResult<BTreeMap<NaiveDate, Vec<BookingWithRoom>>> {
        let bookings = self.store.active_bookings().await?;
        let rooms = self.store.all_rooms().await?;
        let mut index = build_occupancy_index(&bookings, &rooms);
        if let Some(from) = from {
            index.retain(|d, _| *d >= from);
        }
        if let Some(to) = to {
            index.retain(|d, _| *d <= to);
        }
        Ok(index)
    }

    pub async fn occupancy_on(
        &self,
        date: NaiveDate,
        filter: &RoomFilter,
    ) -> EngineResult<OccupancySnapshot> {
        let bookings = self.store.active_bookings().await?;
        let rooms = self.store.all_rooms().await?;
        Ok(occupancy(date, &bookings, &rooms, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus};
    use proptest::prelude::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn room(number: &str, category: &str) -> Room {
        Room {
            room_number: number.to_string(),
            room_category: category.to_string(),
            capacity: 2,
            nightly_rate: 12_000,
            discounted_nightly_rate: None,
            available_flag: true,
        }
    }

    fn booking(room_number: &str, check_in: &str, check_out: &str, status: BookingStatus) -> Booking {
        Booking {
            booking_id: Booking::new_reference(),
            room_number: room_number.to_string(),
            guest_name: "Guest".to_string(),
            guest_email: "guest@example.com".to_string(),
            guest_phone: "+77000000000".to_string(),
            check_in_date: d(check_in),
            check_out_date: d(check_out),
            guest_count: 2,
            status,
            payment_status: PaymentStatus::Pending,
            base_total_amount: 24_000,
            paid_amount: 0,
            admin_notes: String::new(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn index_includes_the_departure_day() {
        let rooms = vec![room("101", "Standard")];
        let bookings = vec![booking("101", "2024-01-10", "2024-01-12", BookingStatus::Confirmed)];
        let index = build_occupancy_index(&bookings, &rooms);

        assert!(index.contains_key(&d("2024-01-10")));
        assert!(index.contains_key(&d("2024-01-11")));
        assert!(index.contains_key(&d("2024-01-12")));
        assert!(!index.contains_key(&d("2024-01-13")));
        assert!(index[&d("2024-01-12")][0].room.is_some());
    }

    #[test]
    fn terminal_bookings_are_not_indexed() {
        let rooms = vec![room("101", "Standard")];
        let bookings = vec![
            booking("101", "2024-01-10", "2024-01-12", BookingStatus::Cancelled),
            booking("101", "2024-01-20", "2024-01-22", BookingStatus::CheckedOut),
        ];
        assert!(build_occupancy_index(&bookings, &rooms).is_empty());
    }

    #[test]
    fn occupancy_counts_distinct_rooms_once() {
        let rooms = vec![room("101", "Standard"), room("102", "Standard")];
        // Same-day turnover: departure and arrival share 2024-01-12 on 101.
        let bookings = vec![
            booking("101", "2024-01-10", "2024-01-12", BookingStatus::CheckedIn),
            booking("101", "2024-01-12", "2024-01-14", BookingStatus::Confirmed),
        ];
        let snap = occupancy(d("2024-01-12"), &bookings, &rooms, &RoomFilter::default());
        assert_eq!(snap.occupied, 1);
        assert_eq!(snap.total, 2);
        assert_eq!(snap.percentage, 50.0);
    }

    #[test]
    fn category_and_room_filters_scope_the_report() {
        let rooms = vec![
            room("101", "Standard"),
            room("201", "Deluxe"),
            room("202", "Deluxe"),
        ];
        let bookings = vec![
            booking("101", "2024-01-10", "2024-01-12", BookingStatus::Confirmed),
            booking("201", "2024-01-10", "2024-01-12", BookingStatus::Confirmed),
        ];

        let deluxe = occupancy(
            d("2024-01-11"),
            &bookings,
            &rooms,
            &RoomFilter {
                category: Some("Deluxe".to_string()),
                room_number: None,
            },
        );
        assert_eq!(deluxe.occupied, 1);
        assert_eq!(deluxe.total, 2);

        let single = occupancy(
            d("2024-01-11"),
            &bookings,
            &rooms,
            &RoomFilter {
                category: None,
                room_number: Some("202".to_string()),
            },
        );
        assert_eq!(single.occupied, 0);
        assert_eq!(single.total, 1);
        assert_eq!(single.percentage, 0.0);
    }

    #[test]
    fn empty_filter_set_yields_zero_percent() {
        let snap = occupancy(
            d("2024-01-11"),
            &[],
            &[],
            &RoomFilter {
                category: Some("Penthouse".to_string()),
                room_number: None,
            },
        );
        assert_eq!(snap.total, 0);
        assert_eq!(snap.percentage, 0.0);
    }

    #[tokio::test]
    async fn aggregator_rebuilds_from_the_store_and_honors_the_range() {
        use crate::store::memory::MemoryStore;
        use crate::store::Store;

        let store = Arc::new(MemoryStore::with_rooms(vec![room("101", "Standard")]));
        store
            .insert_booking(&booking("101", "2024-01-10", "2024-01-12", BookingStatus::Confirmed))
            .await
            .unwrap();

        let aggregator = OccupancyAggregator::new(store.clone());
        let full = aggregator.calendar(None, None).await.unwrap();
        assert_eq!(full.len(), 3);

        let clipped = aggregator
            .calendar(Some(d("2024-01-11")), Some(d("2024-01-11")))
            .await
            .unwrap();
        assert_eq!(clipped.len(), 1);
        assert!(clipped.contains_key(&d("2024-01-11")));

        let snap = aggregator
            .occupancy_on(d("2024-01-11"), &RoomFilter::default())
            .await
            .unwrap();
        assert_eq!(snap.occupied, 1);
        assert_eq!(snap.percentage, 100.0);
    }

    proptest! {
        #[test]
        fn percentage_stays_within_bounds(
            occupied_rooms in 0usize..10,
            extra_rooms in 0usize..10,
            day_offset in 0i64..20,
        ) {
            let mut rooms = Vec::new();
            let mut bookings = Vec::new();
            for i in 0..(occupied_rooms + extra_rooms) {
                rooms.push(room(&format!("R{i}"), "Standard"));
            }
            for i in 0..occupied_rooms {
                bookings.push(booking(&format!("R{i}"), "2024-01-01", "2024-01-30", BookingStatus::Confirmed));
            }
            let date = d("2024-01-05") + chrono::Days::new(day_offset as u64);
            let snap = occupancy(date, &bookings, &rooms, &RoomFilter::default());
            prop_assert!((0.0..=100.0).contains(&snap.percentage));
        }
    }
}
