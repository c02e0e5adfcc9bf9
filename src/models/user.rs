use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ==================== USER ====================
/// User profile joined with its membership level.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub referral_code: String,
    pub registration_referral_code: Option<String>,
    pub bonus_percentage: Decimal,
}

impl User {
    /// Referral code of whoever invited this user, if any.
    pub fn referred_by(&self) -> Option<&str> {
        self.registration_referral_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

// ==================== CART ====================
/// A cart row joined with the product and its discount.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub qty: i32,
    pub no_sku: String,
    pub product_name: String,
    pub picture_url: String,
    pub thumbnail: String,
    pub description: String,
    pub weight: Decimal,
    pub volume: Decimal,
    pub price: Decimal,
    pub stock: i32,
    pub flag_promo: bool,
    pub promo_price: Decimal,
}

impl CartLine {
    pub fn unit_price(&self) -> Decimal {
        if self.flag_promo {
            self.promo_price
        } else {
            self.price
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[test]
    fn referred_by_ignores_blank_codes() {
        let mut user = fixtures::user(Decimal::ZERO);
        user.registration_referral_code = Some("   ".to_string());
        assert_eq!(user.referred_by(), None);

        user.registration_referral_code = Some("REF123".to_string());
        assert_eq!(user.referred_by(), Some("REF123"));
    }

    #[test]
    fn line_total_multiplies_effective_price() {
        let line = fixtures::cart_line(Decimal::new(2500, 0), 4);
        assert_eq!(line.line_total(), Decimal::new(10000, 0));
    }
}
