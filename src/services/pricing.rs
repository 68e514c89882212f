use crate::models::{PickupType, RateSheet, RentalType, TimeWindow};

/// Fixed surcharge for doorstep delivery, not part of any rate sheet.
pub const DELIVERY_CHARGE: i64 = 100;

/// Tax rate applied to the base price, as a percentage.
pub const TAX_RATE_PERCENT: i64 = 18;

/// An itemized price for a window/bike/pickup-method combination, not yet
/// persisted. All amounts are whole currency units and satisfy
/// `total == base_price + delivery_charge + tax`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct Quote {
    pub rental_type: RentalType,
    pub base_price: i64,
    pub delivery_charge: i64,
    pub tax: i64,
    pub total: i64,
}

impl Quote {
    /// Marker for the invalid-window case: `quote` never fails, it returns a
    /// fully zeroed breakdown with the default classification. Callers must
    /// check this before trusting the amounts.
    pub fn is_zeroed(&self) -> bool {
        *self == Quote::default()
    }
}

/// Classify a window and price it against a rate sheet. Pure and
/// deterministic: no clock reads beyond the supplied window.
///
/// Tier selection, checked in order:
/// - 7 or more whole days: weekly, billed per started week at the weekly
///   unit price (`rate_per_7_days`, or seven daily rates when absent);
/// - 1 or more whole days: daily, billed per whole day;
/// - otherwise hourly, with a one-hour billing floor.
///
/// A missing or inverted window yields a zeroed quote rather than an error;
/// this function is safe to call before validation and callers check
/// [`Quote::is_zeroed`].
pub fn quote(rates: &RateSheet, window: Option<&TimeWindow>, pickup_type: PickupType) -> Quote {
    let Some(window) = window else {
        tracing::warn!("quote requested without a window");
        return Quote::default();
    };
    if !window.is_valid() {
        tracing::warn!(
            pickup = %window.pickup,
            drop_off = %window.drop_off,
            "quote requested for an inverted window"
        );
        return Quote::default();
    }

    let diff_hours = window.diff_hours();
    let diff_days = window.diff_days();

    let (rental_type, base_price) = if diff_days >= 7 {
        let weekly_unit = rates.rate_per_7_days.unwrap_or(rates.rate_per_day * 7);
        let weeks = (diff_days + 6) / 7;
        (RentalType::Weekly, weeks * weekly_unit)
    } else if diff_days >= 1 {
        (RentalType::Daily, rates.rate_per_day * diff_days)
    } else {
        (RentalType::Hourly, rates.rate_per_hour * diff_hours.max(1))
    };

    let delivery_charge = match pickup_type {
        PickupType::Doorstep => DELIVERY_CHARGE,
        PickupType::Station => 0,
    };

    // Half-up rounding in integer arithmetic.
    let tax = (base_price * TAX_RATE_PERCENT + 50) / 100;

    Quote {
        rental_type,
        base_price,
        delivery_charge,
        tax,
        total: base_price + delivery_charge + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn window(pickup: &str, drop_off: &str) -> TimeWindow {
        TimeWindow::new(dt(pickup), dt(drop_off))
    }

    fn rates(hour: i64, day: i64, week: Option<i64>) -> RateSheet {
        RateSheet {
            rate_per_hour: hour,
            rate_per_day: day,
            rate_per_7_days: week,
        }
    }

    #[test]
    fn test_three_hour_station_rental_is_hourly() {
        let q = quote(
            &rates(50, 500, None),
            Some(&window("2025-06-16 10:00", "2025-06-16 13:00")),
            PickupType::Station,
        );
        assert_eq!(q.rental_type, RentalType::Hourly);
        assert_eq!(q.base_price, 150);
        assert_eq!(q.delivery_charge, 0);
        assert_eq!(q.tax, 27);
        assert_eq!(q.total, 177);
    }

    #[test]
    fn test_two_day_doorstep_rental_is_daily() {
        let q = quote(
            &rates(50, 500, None),
            Some(&window("2025-06-16 10:00", "2025-06-18 10:00")),
            PickupType::Doorstep,
        );
        assert_eq!(q.rental_type, RentalType::Daily);
        assert_eq!(q.base_price, 1000);
        assert_eq!(q.delivery_charge, 100);
        assert_eq!(q.tax, 180);
        assert_eq!(q.total, 1280);
    }

    #[test]
    fn test_nine_day_rental_is_weekly_with_daily_fallback() {
        // No weekly rate: the weekly unit is 7 * 500 = 3500, and 9 days
        // bills as 2 started weeks.
        let q = quote(
            &rates(50, 500, None),
            Some(&window("2025-06-16 10:00", "2025-06-25 10:00")),
            PickupType::Station,
        );
        assert_eq!(q.rental_type, RentalType::Weekly);
        assert_eq!(q.base_price, 7000);
    }

    #[test]
    fn test_weekly_rate_used_when_present() {
        let q = quote(
            &rates(50, 500, Some(3000)),
            Some(&window("2025-06-16 10:00", "2025-06-23 10:00")),
            PickupType::Station,
        );
        assert_eq!(q.rental_type, RentalType::Weekly);
        assert_eq!(q.base_price, 3000);
    }

    #[test]
    fn test_weekly_base_is_multiple_of_weekly_unit() {
        for days in 7..30 {
            let drop_off = dt("2025-06-16 10:00") + chrono::Duration::days(days);
            let q = quote(
                &rates(50, 500, Some(3000)),
                Some(&TimeWindow::new(dt("2025-06-16 10:00"), drop_off)),
                PickupType::Station,
            );
            assert_eq!(q.rental_type, RentalType::Weekly, "days={days}");
            assert_eq!(q.base_price % 3000, 0, "days={days}");
        }
    }

    #[test]
    fn test_one_hour_billing_floor() {
        let q = quote(
            &rates(50, 500, None),
            Some(&window("2025-06-16 10:00", "2025-06-16 10:10")),
            PickupType::Station,
        );
        assert_eq!(q.rental_type, RentalType::Hourly);
        assert_eq!(q.base_price, 50);
    }

    #[test]
    fn test_partial_hour_rounds_up() {
        let q = quote(
            &rates(50, 500, None),
            Some(&window("2025-06-16 10:00", "2025-06-16 12:01")),
            PickupType::Station,
        );
        assert_eq!(q.base_price, 150);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // base -> expected tax at 18%
        for (base, expected) in [(0i64, 0i64), (1, 0), (100, 18), (999, 180)] {
            let tax = (base * TAX_RATE_PERCENT + 50) / 100;
            assert_eq!(tax, expected, "base={base}");
        }
    }

    #[test]
    fn test_total_is_exact_sum() {
        let cases = [
            ("2025-06-16 10:00", "2025-06-16 13:00", PickupType::Station),
            ("2025-06-16 10:00", "2025-06-18 10:00", PickupType::Doorstep),
            ("2025-06-16 10:00", "2025-06-30 10:00", PickupType::Doorstep),
            ("2025-06-16 10:00", "2025-06-16 10:01", PickupType::Station),
        ];
        for (pickup, drop_off, pt) in cases {
            let q = quote(&rates(37, 411, Some(2599)), Some(&window(pickup, drop_off)), pt);
            assert_eq!(q.total, q.base_price + q.delivery_charge + q.tax);
        }
    }

    #[test]
    fn test_missing_window_yields_zeroed_quote() {
        let q = quote(&rates(50, 500, None), None, PickupType::Doorstep);
        assert!(q.is_zeroed());
        assert_eq!(q.rental_type, RentalType::Hourly);
        assert_eq!(q.total, 0);
    }

    #[test]
    fn test_inverted_window_yields_zeroed_quote() {
        let q = quote(
            &rates(50, 500, None),
            Some(&window("2025-06-18 10:00", "2025-06-16 10:00")),
            PickupType::Doorstep,
        );
        assert!(q.is_zeroed());
        assert_eq!(q.delivery_charge, 0);
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let w = window("2025-06-16 10:00", "2025-06-19 10:00");
        let r = rates(50, 500, Some(3000));
        let a = quote(&r, Some(&w), PickupType::Doorstep);
        let b = quote(&r, Some(&w), PickupType::Doorstep);
        assert_eq!(a, b);
    }
}
