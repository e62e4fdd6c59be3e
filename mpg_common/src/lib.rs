mod currency;
mod fees;
mod money;

mod secret;

pub use currency::{Currency, UnknownCurrency};
pub use fees::{format_payment_amount, validate_payment_amount, visit_booking_fee, VisitFee};
pub use money::{Money, MoneyConversionError};
pub use secret::Secret;
