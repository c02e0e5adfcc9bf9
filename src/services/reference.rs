use chrono::NaiveDate;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::Mutex;

use crate::constants::{
    ORDER_NUMBER_DIGITS, ORDER_NUMBER_PREFIX, TRANSFER_REMAINDER_MODULUS,
    TRANSFER_REMAINDER_THRESHOLD, TRANSFER_SURCHARGE_HIGH, TRANSFER_SURCHARGE_LOW,
};

/// Process-wide source of order numbers and transfer surcharges.
/// Seeded once; tests construct it with a fixed seed.
pub struct ReferenceGenerator {
    rng: Mutex<StdRng>,
}

impl ReferenceGenerator {
    pub fn from_os_rng() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }

    /// `ORDER/yyyyMMdd/ddddddd`. Uniqueness is checked by the caller.
    pub fn order_number(&self, date: NaiveDate) -> String {
        let digits: String = self.with_rng(|rng| {
            (0..ORDER_NUMBER_DIGITS)
                .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
                .collect()
        });
        format!(
            "{}/{}/{}",
            ORDER_NUMBER_PREFIX,
            date.format("%Y%m%d"),
            digits
        )
    }

    /// Amount added to a transfer so it can be told apart on the bank statement.
    /// A remainder below 200 gets 100..=300, otherwise 10..=99.
    pub fn transfer_surcharge(&self, cash: Decimal) -> Decimal {
        let remainder = cash % Decimal::from(TRANSFER_REMAINDER_MODULUS);
        let (min, max) = if remainder < Decimal::from(TRANSFER_REMAINDER_THRESHOLD) {
            TRANSFER_SURCHARGE_HIGH
        } else {
            TRANSFER_SURCHARGE_LOW
        };
        Decimal::from(self.with_rng(|rng| rng.random_range(min..=max)))
    }

    pub fn transfer_total(&self, cash: Decimal) -> Decimal {
        cash + self.transfer_surcharge(cash)
    }
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn order_number_has_expected_shape() {
        let refs = ReferenceGenerator::seeded(1);
        let number = refs.order_number(date());
        let parts: Vec<&str> = number.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORDER");
        assert_eq!(parts[1], "20240309");
        assert_eq!(parts[2].len(), 7);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let a = ReferenceGenerator::seeded(42);
        let b = ReferenceGenerator::seeded(42);
        for _ in 0..5 {
            assert_eq!(a.order_number(date()), b.order_number(date()));
        }
    }

    #[test]
    fn low_remainder_gets_three_digit_surcharge() {
        // Memastikan sisa bagi < 200 mendapat tambahan 100..=300
        let refs = ReferenceGenerator::seeded(7);
        for _ in 0..200 {
            let surcharge = refs.transfer_surcharge(Decimal::from(150_000));
            assert!(surcharge >= Decimal::from(100) && surcharge <= Decimal::from(300));
        }
        let surcharge = refs.transfer_surcharge(Decimal::from(150_199));
        assert!(surcharge >= Decimal::from(100));
    }

    #[test]
    fn high_remainder_gets_two_digit_surcharge() {
        let refs = ReferenceGenerator::seeded(7);
        for _ in 0..200 {
            let surcharge = refs.transfer_surcharge(Decimal::from(150_500));
            assert!(surcharge >= Decimal::from(10) && surcharge <= Decimal::from(99));
        }
    }

    #[test]
    fn remainder_of_exactly_200_uses_low_tier() {
        let refs = ReferenceGenerator::seeded(3);
        for _ in 0..100 {
            let surcharge = refs.transfer_surcharge(Decimal::from(150_200));
            assert!(surcharge <= Decimal::from(99));
        }
    }

    #[test]
    fn transfer_total_adds_surcharge_to_cash() {
        let refs = ReferenceGenerator::seeded(11);
        let total = refs.transfer_total(Decimal::from(150_000));
        let extra = total - Decimal::from(150_000);
        assert!(extra >= Decimal::from(100) && extra <= Decimal::from(300));
    }
}
