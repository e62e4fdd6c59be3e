use std::fmt::{self, Display, Formatter};

use mpg_common::{Currency, Money};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

//--------------------------------------     Domain types     ---------------------------------------------

/// A visit-booking payment as the caller describes it. `reference` is the booking's correlation key;
/// the merchant order id sent to the gateway is generated fresh for every submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub reference: String,
    pub payer_email: String,
    pub payer_phone: String,
    pub payer_first_name: String,
    pub payer_last_name: String,
    /// ISO 3166 alpha-2 code for the billing address, e.g. `KE`.
    pub country_code: String,
}

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InvalidAmount(String);

impl PaymentRequest {
    /// Checks the amount against the currency's payable range before anything leaves the process.
    pub fn validate(&self) -> Result<(), InvalidAmount> {
        if self.currency.validate(self.amount) {
            Ok(())
        } else {
            let (min, max) = self.currency.bounds();
            Err(InvalidAmount(format!(
                "Amount {} is outside the payable range for {} ({} to {})",
                self.currency.format(self.amount),
                self.currency,
                self.currency.format(min),
                self.currency.format(max)
            )))
        }
    }
}

/// The outcome of a payment initiation. A gateway refusal is data, not an error: callers branch on
/// the variant and show `message` to the payer as-is.
///
/// The envelope status and the redirect URL decide success; the tracking id merely tags along, since
/// the gateway is free to omit it and the callback carries it again anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentResult {
    Success { redirect_url: String, tracking_id: Option<String> },
    Error { message: String },
}

impl PaymentResult {
    pub fn error(message: impl Into<String>) -> Self {
        PaymentResult::Error { message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentResult::Success { .. })
    }
}

/// Payment states, normalized from the gateway's `payment_status_description` and `status_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
    Reversed,
    Invalid,
}

impl PaymentStatus {
    /// Maps the textual description the gateway sends, falling back to its numeric `status_code`
    /// (0 invalid, 1 completed, 2 failed, 3 reversed). Anything unrecognized is treated as pending.
    pub fn from_wire(description: Option<&str>, status_code: Option<i64>) -> Self {
        if let Some(description) = description {
            match description.trim().to_ascii_uppercase().as_str() {
                "COMPLETED" => return PaymentStatus::Completed,
                "PENDING" => return PaymentStatus::Pending,
                "FAILED" => return PaymentStatus::Failed,
                "REVERSED" => return PaymentStatus::Reversed,
                "INVALID" => return PaymentStatus::Invalid,
                _ => {},
            }
        }
        match status_code {
            Some(0) => PaymentStatus::Invalid,
            Some(1) => PaymentStatus::Completed,
            Some(2) => PaymentStatus::Failed,
            Some(3) => PaymentStatus::Reversed,
            _ => PaymentStatus::Pending,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Reversed => "REVERSED",
            PaymentStatus::Invalid => "INVALID",
        };
        f.write_str(s)
    }
}

/// What a status query reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentVerification {
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<Currency>,
    pub confirmation_code: Option<String>,
}

/// Outcome of a connection test. Nothing beyond the token cache is touched to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
}

//--------------------------------------      Wire types      ---------------------------------------------

/// Body of `POST /api/Auth/RequestToken`.
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
}

/// Response to `POST /api/Auth/RequestToken`. The envelope reports success as the string `"200"`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: Option<String>,
    /// The gateway's own expiry instant for the token, e.g. `2026-08-25T08:30:45.1987056Z`. Logged
    /// for diagnostics; the token cache applies its fixed TTL instead.
    #[serde(rename = "expiryDate")]
    pub expiry_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_fault")]
    pub error: Option<GatewayFault>,
    #[serde(default)]
    pub status: String,
    pub message: Option<String>,
}

/// The structured error object PesaPal embeds in failure envelopes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayFault {
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl GatewayFault {
    /// A single printable message assembled from whichever fields the gateway populated.
    pub fn describe(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(code) = self.code.as_deref() {
            if !code.is_empty() {
                parts.push(code);
            }
        }
        if let Some(message) = self.message.as_deref() {
            if !message.is_empty() {
                parts.push(message);
            }
        }
        if parts.is_empty() {
            self.error_type.clone().unwrap_or_else(|| "unspecified gateway error".to_string())
        } else {
            parts.join(": ")
        }
    }
}

/// The gateway sends `error` as null, an empty string, a bare message, or a structured object,
/// depending on the endpoint and the failure. Normalize all of them here.
fn lenient_fault<'de, D>(deserializer: D) -> Result<Option<GatewayFault>, D::Error>
where D: Deserializer<'de> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(GatewayFault { message: Some(s), ..Default::default() }),
        other => serde_json::from_value(other).ok(),
    })
}

/// Order payload for `POST /api/Transactions/SubmitOrderRequest`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub id: String,
    pub currency: Currency,
    pub amount: Money,
    pub description: String,
    pub callback_url: String,
    pub notification_id: String,
    pub billing_address: BillingAddress,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillingAddress {
    pub email_address: String,
    pub phone_number: String,
    pub country_code: String,
    pub first_name: String,
    pub last_name: String,
}

/// Response to `POST /api/Transactions/SubmitOrderRequest`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_tracking_id: Option<String>,
    pub merchant_reference: Option<String>,
    pub redirect_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_fault")]
    pub error: Option<GatewayFault>,
    #[serde(default)]
    pub status: String,
    pub message: Option<String>,
}

impl From<SubmitOrderResponse> for PaymentResult {
    fn from(wire: SubmitOrderResponse) -> Self {
        match (wire.status.as_str(), wire.redirect_url) {
            ("200", Some(redirect_url)) => {
                PaymentResult::Success { redirect_url, tracking_id: wire.order_tracking_id }
            },
            _ => {
                let message = wire
                    .error
                    .map(|e| e.describe())
                    .or(wire.message)
                    .unwrap_or_else(|| "The payment gateway declined the order".to_string());
                PaymentResult::error(message)
            },
        }
    }
}

/// Response to `GET /api/Transactions/GetTransactionStatus`. Everything is optional because the
/// gateway omits fields freely, particularly for orders it has no record of.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionStatusResponse {
    pub payment_method: Option<String>,
    pub amount: Option<Money>,
    pub created_date: Option<String>,
    pub confirmation_code: Option<String>,
    pub payment_status_description: Option<String>,
    pub description: Option<String>,
    pub message: Option<String>,
    pub payment_account: Option<String>,
    pub call_back_url: Option<String>,
    pub status_code: Option<i64>,
    pub merchant_reference: Option<String>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_fault")]
    pub error: Option<GatewayFault>,
    #[serde(default)]
    pub status: String,
}

impl From<TransactionStatusResponse> for PaymentVerification {
    fn from(wire: TransactionStatusResponse) -> Self {
        let payment_status = PaymentStatus::from_wire(wire.payment_status_description.as_deref(), wire.status_code);
        Self {
            payment_status,
            payment_method: wire.payment_method,
            amount: wire.amount,
            currency: wire.currency.as_deref().and_then(|code| code.parse().ok()),
            confirmation_code: wire.confirmation_code,
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn kes_request(amount: i64) -> PaymentRequest {
        PaymentRequest {
            amount: Money::from_major(amount),
            currency: Currency::KES,
            description: "Visit booking fee".to_string(),
            reference: "VB-1001".to_string(),
            payer_email: "asha@example.com".to_string(),
            payer_phone: "+254700000001".to_string(),
            payer_first_name: "Asha".to_string(),
            payer_last_name: "Odhiambo".to_string(),
            country_code: "KE".to_string(),
        }
    }

    #[test]
    fn amounts_are_validated_against_the_currency_bounds() {
        assert!(kes_request(5_000).validate().is_ok());
        let err = kes_request(50).validate().unwrap_err();
        assert!(err.to_string().contains("KSh 50"));
        assert!(err.to_string().contains("KES"));
        assert!(kes_request(2_000_000).validate().is_err());
    }

    #[test]
    fn auth_success_fixture_parses() {
        let auth: AuthResponse = serde_json::from_str(include_str!("./test_assets/auth_success.json")).unwrap();
        assert_eq!(auth.status, "200");
        assert!(auth.token.as_deref().unwrap().starts_with("eyJ"));
        assert_eq!(auth.expiry_date.as_deref(), Some("2026-08-25T08:30:45.1987056Z"));
        assert!(auth.error.is_none());
    }

    #[test]
    fn auth_rejection_fixture_carries_the_fault() {
        let auth: AuthResponse = serde_json::from_str(include_str!("./test_assets/auth_rejected.json")).unwrap();
        assert_eq!(auth.status, "500");
        assert!(auth.token.is_none());
        let fault = auth.error.unwrap();
        assert_eq!(fault.describe(), "invalid_consumer_key_or_secret: Invalid Access Token");
    }

    #[test]
    fn submit_success_fixture_becomes_a_success_result() {
        let wire: SubmitOrderResponse = serde_json::from_str(include_str!("./test_assets/submit_success.json")).unwrap();
        let result = PaymentResult::from(wire);
        match result {
            PaymentResult::Success { redirect_url, tracking_id } => {
                assert!(redirect_url.contains("OrderTrackingId"));
                assert_eq!(tracking_id.as_deref(), Some("b945e4af-80a5-4ec1-8706-e03f8332fb04"));
            },
            PaymentResult::Error { message } => panic!("expected success, got: {message}"),
        }
    }

    #[test]
    fn submit_rejection_fixture_becomes_an_error_result() {
        let wire: SubmitOrderResponse =
            serde_json::from_str(include_str!("./test_assets/submit_rejected.json")).unwrap();
        let result = PaymentResult::from(wire);
        assert_eq!(result, PaymentResult::error("invalid_ipn_id: Invalid notification id provided"));
    }

    #[test]
    fn transaction_status_fixture_maps_to_a_verification() {
        let wire: TransactionStatusResponse =
            serde_json::from_str(include_str!("./test_assets/transaction_status.json")).unwrap();
        let verification = PaymentVerification::from(wire);
        assert_eq!(verification.payment_status, PaymentStatus::Completed);
        assert_eq!(verification.payment_method.as_deref(), Some("MpesaKE"));
        assert_eq!(verification.amount, Some(Money::from_major(5_000)));
        assert_eq!(verification.currency, Some(Currency::KES));
        assert_eq!(verification.confirmation_code.as_deref(), Some("SHG1234XYZ"));
    }

    #[test]
    fn status_mapping_prefers_the_description_and_falls_back_to_the_code() {
        assert_eq!(PaymentStatus::from_wire(Some("completed"), None), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::from_wire(Some(" REVERSED "), Some(1)), PaymentStatus::Reversed);
        assert_eq!(PaymentStatus::from_wire(None, Some(0)), PaymentStatus::Invalid);
        assert_eq!(PaymentStatus::from_wire(None, Some(2)), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_wire(Some("processing"), Some(3)), PaymentStatus::Reversed);
        assert_eq!(PaymentStatus::from_wire(None, None), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::from_wire(Some("???"), Some(99)), PaymentStatus::Pending);
    }

    #[test]
    fn payment_results_serialize_with_a_status_tag() {
        let success = PaymentResult::Success {
            redirect_url: "https://pay/x".to_string(),
            tracking_id: Some("T1".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({"status": "success", "redirect_url": "https://pay/x", "tracking_id": "T1"})
        );
        let error = PaymentResult::error("nope");
        assert_eq!(serde_json::to_value(&error).unwrap(), json!({"status": "error", "message": "nope"}));
    }

    #[test]
    fn gateway_faults_deserialize_from_any_shape_the_gateway_uses() {
        let from_string: SubmitOrderResponse = serde_json::from_str(r#"{"error": "boom", "status": "500"}"#).unwrap();
        assert_eq!(from_string.error.unwrap().describe(), "boom");
        let from_empty: SubmitOrderResponse = serde_json::from_str(r#"{"error": "", "status": "500"}"#).unwrap();
        assert!(from_empty.error.is_none());
        let from_null: SubmitOrderResponse = serde_json::from_str(r#"{"error": null, "status": "200"}"#).unwrap();
        assert!(from_null.error.is_none());
        let missing: SubmitOrderResponse = serde_json::from_str(r#"{"status": "200"}"#).unwrap();
        assert!(missing.error.is_none());
    }

    #[test]
    fn a_success_envelope_without_a_redirect_is_still_an_error() {
        let wire: SubmitOrderResponse =
            serde_json::from_str(r#"{"order_tracking_id": "T1", "status": "200"}"#).unwrap();
        assert!(!PaymentResult::from(wire).is_success());
    }

    #[test]
    fn the_redirect_alone_is_enough_for_success() {
        let wire: SubmitOrderResponse =
            serde_json::from_str(r#"{"redirect_url": "https://pay/x", "status": "200"}"#).unwrap();
        match PaymentResult::from(wire) {
            PaymentResult::Success { redirect_url, tracking_id } => {
                assert_eq!(redirect_url, "https://pay/x");
                assert_eq!(tracking_id, None);
            },
            PaymentResult::Error { message } => panic!("expected success, got: {message}"),
        }
    }
}
