/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Order numbering: ORDER/yyyyMMdd/ddddddd
pub const ORDER_NUMBER_PREFIX: &str = "ORDER";
pub const ORDER_NUMBER_DIGITS: usize = 7;

// Gateway payment window
pub const PAYMENT_EXPIRY_HOURS: u32 = 24;
pub const GATEWAY_SUCCESS_STATUS: i64 = 200;
pub const CALLBACK_SUCCESS_CODE: &str = "1";

// Bank transfer disambiguation surcharge
pub const TRANSFER_REMAINDER_MODULUS: i64 = 1000;
pub const TRANSFER_REMAINDER_THRESHOLD: i64 = 200;
pub const TRANSFER_SURCHARGE_HIGH: (i64, i64) = (100, 300);
pub const TRANSFER_SURCHARGE_LOW: (i64, i64) = (10, 99);

// Ledger descriptions
pub const POINT_DESC_ORDER_PAYMENT: &str = "Payment for order";
pub const POINT_DESC_REFUND: &str = "Point refund";
pub const POINT_DESC_PURCHASE_BONUS: &str = "Bonus from purchase";
pub const POINT_DESC_REFERRAL_BONUS: &str = "Referral bonus from purchase";
pub const STOCK_DESC_ORDER_PAID: &str = "Order payment confirmed";
