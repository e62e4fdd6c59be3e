use log::*;

use crate::{
    api::PesapalApi,
    config::{ConfigStatus, Environment, PesapalConfig},
    data_objects::{ConnectionReport, PaymentRequest, PaymentResult, PaymentVerification},
    mock::MockPesapal,
    PesapalError,
};

/// The contract every payment backend exposes to the booking flow.
///
/// Implemented by the live [`PesapalApi`], the [`MockPesapal`] stand-in, and the [`PaymentService`]
/// selection wrapper, so call sites stay generic over which one they were handed.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Submits a payment. Refusals come back as data, not errors.
    async fn initiate_payment(&self, request: &PaymentRequest) -> PaymentResult;
    /// Looks up the state of a previously submitted payment.
    async fn verify_payment(&self, tracking_id: &str) -> Result<PaymentVerification, PesapalError>;
    /// Attempts authentication and reports reachability.
    async fn test_connection(&self) -> ConnectionReport;
    fn is_configured(&self) -> bool;
    fn configuration_status(&self) -> ConfigStatus;
}

impl PaymentGateway for PesapalApi {
    async fn initiate_payment(&self, request: &PaymentRequest) -> PaymentResult {
        PesapalApi::initiate_payment(self, request).await
    }

    async fn verify_payment(&self, tracking_id: &str) -> Result<PaymentVerification, PesapalError> {
        PesapalApi::verify_payment(self, tracking_id).await
    }

    async fn test_connection(&self) -> ConnectionReport {
        PesapalApi::test_connection(self).await
    }

    fn is_configured(&self) -> bool {
        PesapalApi::is_configured(self)
    }

    fn configuration_status(&self) -> ConfigStatus {
        PesapalApi::configuration_status(self)
    }
}

impl PaymentGateway for MockPesapal {
    async fn initiate_payment(&self, request: &PaymentRequest) -> PaymentResult {
        MockPesapal::initiate_payment(self, request).await
    }

    async fn verify_payment(&self, tracking_id: &str) -> Result<PaymentVerification, PesapalError> {
        MockPesapal::verify_payment(self, tracking_id).await
    }

    async fn test_connection(&self) -> ConnectionReport {
        MockPesapal::test_connection(self).await
    }

    fn is_configured(&self) -> bool {
        MockPesapal::is_configured(self)
    }

    fn configuration_status(&self) -> ConfigStatus {
        MockPesapal::configuration_status(self)
    }
}

/// The backend selected at startup.
#[derive(Debug, Clone)]
pub enum PaymentService {
    Live(PesapalApi),
    Mock(MockPesapal),
}

impl PaymentService {
    /// Picks the backend once, from configuration.
    ///
    /// Configured credentials select the live client. Without them, the sandbox environment falls
    /// back to the mock gateway and the live environment refuses to start.
    pub fn from_config(config: PesapalConfig) -> Result<Self, PesapalError> {
        if config.is_configured() {
            info!("Payment gateway: live PesaPal client ({})", config.environment);
            return Ok(PaymentService::Live(PesapalApi::new(config)?));
        }
        match config.environment {
            Environment::Live => Err(PesapalError::Configuration(
                "PesaPal credentials are required in the live environment".to_string(),
            )),
            Environment::Sandbox => {
                warn!("PesaPal credentials not supplied. Using the mock gateway.");
                Ok(PaymentService::Mock(MockPesapal::new(config)))
            },
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, PaymentService::Mock(_))
    }
}

impl PaymentGateway for PaymentService {
    async fn initiate_payment(&self, request: &PaymentRequest) -> PaymentResult {
        match self {
            PaymentService::Live(api) => api.initiate_payment(request).await,
            PaymentService::Mock(mock) => mock.initiate_payment(request).await,
        }
    }

    async fn verify_payment(&self, tracking_id: &str) -> Result<PaymentVerification, PesapalError> {
        match self {
            PaymentService::Live(api) => api.verify_payment(tracking_id).await,
            PaymentService::Mock(mock) => mock.verify_payment(tracking_id).await,
        }
    }

    async fn test_connection(&self) -> ConnectionReport {
        match self {
            PaymentService::Live(api) => api.test_connection().await,
            PaymentService::Mock(mock) => mock.test_connection().await,
        }
    }

    fn is_configured(&self) -> bool {
        match self {
            PaymentService::Live(api) => api.is_configured(),
            PaymentService::Mock(mock) => mock.is_configured(),
        }
    }

    fn configuration_status(&self) -> ConfigStatus {
        match self {
            PaymentService::Live(api) => api.configuration_status(),
            PaymentService::Mock(mock) => mock.configuration_status(),
        }
    }
}
