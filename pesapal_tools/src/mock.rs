use std::time::Duration;

use chrono::Utc;
use log::*;
use rand::{distributions::Alphanumeric, Rng};
use tokio::time::sleep;

use crate::{
    config::{ConfigStatus, PesapalConfig},
    data_objects::{ConnectionReport, PaymentRequest, PaymentResult, PaymentStatus, PaymentVerification},
    PesapalError,
};

/// Simulated latency for every mock call.
const MOCK_LATENCY: Duration = Duration::from_millis(800);

const MOCK_CALLBACK_URL: &str = "http://localhost:5173/visits/payment-complete";

/// A stand-in gateway for development without PesaPal credentials.
///
/// Mirrors the live client's contract: the same amount validation, a redirect URL built from the
/// configured callback, and randomized verification outcomes that lean towards completed.
#[derive(Debug, Clone)]
pub struct MockPesapal {
    config: PesapalConfig,
    latency: Duration,
}

impl MockPesapal {
    pub fn new(config: PesapalConfig) -> Self {
        Self { config, latency: MOCK_LATENCY }
    }

    /// Overrides the simulated latency. Tests run with zero.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn initiate_payment(&self, request: &PaymentRequest) -> PaymentResult {
        if let Err(e) = request.validate() {
            return PaymentResult::error(e.to_string());
        }
        sleep(self.latency).await;
        let tracking_id = mock_tracking_id();
        let callback =
            if self.config.callback_url.is_empty() { MOCK_CALLBACK_URL } else { self.config.callback_url.as_str() };
        info!("Mock gateway accepted '{}' as {tracking_id}", request.reference);
        PaymentResult::Success {
            redirect_url: format!(
                "{callback}?OrderTrackingId={tracking_id}&OrderMerchantReference={}",
                request.reference
            ),
            tracking_id: Some(tracking_id),
        }
    }

    /// Reports a randomized outcome: mostly completed, sometimes still pending. Never fails.
    pub async fn verify_payment(&self, tracking_id: &str) -> Result<PaymentVerification, PesapalError> {
        sleep(self.latency).await;
        let payment_status =
            if rand::thread_rng().gen_bool(0.7) { PaymentStatus::Completed } else { PaymentStatus::Pending };
        debug!("Mock gateway reports {tracking_id} as {payment_status}");
        Ok(PaymentVerification {
            payment_status,
            payment_method: Some("MockPay".to_string()),
            amount: None,
            currency: None,
            confirmation_code: None,
        })
    }

    pub async fn test_connection(&self) -> ConnectionReport {
        sleep(self.latency).await;
        ConnectionReport { success: true, message: "Mock gateway ready (no PesaPal credentials in use)".to_string() }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn configuration_status(&self) -> ConfigStatus {
        self.config.status()
    }
}

fn mock_tracking_id() -> String {
    let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(6).map(char::from).collect();
    format!("MOCK-{}-{}", Utc::now().timestamp_millis(), suffix.to_ascii_uppercase())
}

#[cfg(test)]
mod test {
    use mpg_common::{Currency, Money};

    use super::*;

    fn instant_mock() -> MockPesapal {
        let config = PesapalConfig { callback_url: "https://makao.test/done".to_string(), ..Default::default() };
        MockPesapal::new(config).with_latency(Duration::ZERO)
    }

    fn visit_request() -> PaymentRequest {
        PaymentRequest {
            amount: Money::from_major(5_000),
            currency: Currency::KES,
            description: "Visit booking fee".to_string(),
            reference: "VB-2002".to_string(),
            payer_email: "juma@example.com".to_string(),
            payer_phone: "+254711000002".to_string(),
            payer_first_name: "Juma".to_string(),
            payer_last_name: "Mwangi".to_string(),
            country_code: "KE".to_string(),
        }
    }

    #[tokio::test]
    async fn initiation_redirects_through_the_configured_callback() {
        let mock = instant_mock();
        match mock.initiate_payment(&visit_request()).await {
            PaymentResult::Success { redirect_url, tracking_id } => {
                assert!(tracking_id.unwrap().starts_with("MOCK-"));
                assert!(redirect_url.starts_with("https://makao.test/done?OrderTrackingId=MOCK-"));
                assert!(redirect_url.ends_with("&OrderMerchantReference=VB-2002"));
            },
            PaymentResult::Error { message } => panic!("mock rejected a valid payment: {message}"),
        }
    }

    #[tokio::test]
    async fn initiation_applies_the_same_amount_validation_as_the_live_client() {
        let mock = instant_mock();
        let mut request = visit_request();
        request.amount = Money::from_major(3);
        let result = mock.initiate_payment(&request).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn verification_reports_only_completed_or_pending() {
        let mock = instant_mock();
        for _ in 0..25 {
            let verification = mock.verify_payment("MOCK-1-ABCDEF").await.unwrap();
            assert!(matches!(verification.payment_status, PaymentStatus::Completed | PaymentStatus::Pending));
        }
    }

    #[tokio::test]
    async fn the_mock_gateway_is_always_reachable() {
        let report = instant_mock().test_connection().await;
        assert!(report.success);
        assert!(!instant_mock().is_configured());
    }
}
