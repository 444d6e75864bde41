//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Seat, SeatStatus};

/// Validate that a seat's state is internally consistent
pub fn assert_seat_invariants(seat: &Seat) {
    // Only RESERVED seats carry a hold
    debug_assert!(
        seat.status == SeatStatus::Reserved || seat.hold.is_none(),
        "Seat {} is {} but carries a hold",
        seat.seat_ref(),
        seat.status
    );

    // A RESERVED seat must know its holder and deadline
    debug_assert!(
        seat.status != SeatStatus::Reserved || seat.hold.is_some(),
        "Seat {} is RESERVED without a hold",
        seat.seat_ref()
    );

    // Row labels are uppercase ASCII letters
    debug_assert!(
        !seat.row.is_empty() && seat.row.chars().all(|c| c.is_ascii_uppercase()),
        "Seat {} has malformed row label {:?}",
        seat.seat_ref(),
        seat.row
    );

    // Seat numbers start at 1
    debug_assert!(
        seat.number >= 1,
        "Seat in row {} has number {}, expected 1 or greater",
        seat.row,
        seat.number
    );
}

/// Validate that a requested status transition is one the lifecycle allows
pub fn assert_transition_valid(from: SeatStatus, to: SeatStatus) {
    debug_assert!(
        from.can_transition_to(to),
        "Illegal seat transition {} -> {}",
        from,
        to
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Hold;
    use chrono::Duration;
    use uuid::Uuid;

    fn make_seat() -> Seat {
        Seat::new(Uuid::new_v4(), "A".to_string(), 1, Uuid::new_v4())
    }

    #[test]
    fn test_fresh_seat_is_valid() {
        assert_seat_invariants(&make_seat());
    }

    #[test]
    fn test_reserved_seat_with_hold_is_valid() {
        let mut seat = make_seat();
        seat.status = SeatStatus::Reserved;
        seat.hold = Some(Hold::new(Uuid::new_v4(), Duration::minutes(10)));
        assert_seat_invariants(&seat);
    }

    #[test]
    #[should_panic(expected = "carries a hold")]
    fn test_available_seat_must_not_hold() {
        let mut seat = make_seat();
        seat.hold = Some(Hold::new(Uuid::new_v4(), Duration::minutes(10)));
        assert_seat_invariants(&seat);
    }

    #[test]
    #[should_panic(expected = "without a hold")]
    fn test_reserved_seat_must_hold() {
        let mut seat = make_seat();
        seat.status = SeatStatus::Reserved;
        assert_seat_invariants(&seat);
    }

    #[test]
    fn test_lifecycle_transitions_are_valid() {
        assert_transition_valid(SeatStatus::Available, SeatStatus::Reserved);
        assert_transition_valid(SeatStatus::Reserved, SeatStatus::Sold);
        assert_transition_valid(SeatStatus::Reserved, SeatStatus::Available);
    }

    #[test]
    #[should_panic(expected = "Illegal seat transition")]
    fn test_sold_seat_cannot_move() {
        assert_transition_valid(SeatStatus::Sold, SeatStatus::Available);
    }
}
