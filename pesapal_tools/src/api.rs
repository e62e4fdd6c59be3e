use std::sync::Arc;

use chrono::Utc;
use log::*;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    config::{ConfigStatus, PesapalConfig},
    data_objects::{
        AuthRequest,
        ConnectionReport,
        OrderRequest,
        PaymentRequest,
        PaymentResult,
        PaymentVerification,
        SubmitOrderResponse,
        TransactionStatusResponse,
    },
    token::{TokenCache, TOKEN_TTL},
    transport::{FailureKind, HttpSender, HttpTransport, OutboundRequest, RetryPolicy, Transport},
    AuthResponse,
    BillingAddress,
    PesapalError,
};

pub const AUTH_PATH: &str = "/api/Auth/RequestToken";
pub const SUBMIT_ORDER_PATH: &str = "/api/Transactions/SubmitOrderRequest";
pub const TRANSACTION_STATUS_PATH: &str = "/api/Transactions/GetTransactionStatus";

/// Client for the PesaPal v3 API. Cheap to clone; clones share the HTTP pool and the token cache.
#[derive(Debug, Clone)]
pub struct PesapalApi {
    config: PesapalConfig,
    transport: Arc<HttpTransport>,
    token: Arc<TokenCache>,
}

impl PesapalApi {
    pub fn new(config: PesapalConfig) -> Result<Self, PesapalError> {
        Self::with_policy(config, RetryPolicy::default())
    }

    /// Builds a client with a non-default retry policy.
    pub fn with_policy(config: PesapalConfig, policy: RetryPolicy) -> Result<Self, PesapalError> {
        let sender = HttpSender::new(policy.request_timeout).map_err(|e| PesapalError::Initialization(e.to_string()))?;
        let transport = Transport::new(sender, config.primary_url(), config.fallback_url.clone(), policy);
        Ok(Self { config, transport: Arc::new(transport), token: Arc::new(TokenCache::new()) })
    }

    /// A bearer token for the gateway, served from cache while fresh.
    ///
    /// Fails with [`PesapalError::Configuration`] before any network traffic when credentials are
    /// missing, with [`PesapalError::Auth`] when the gateway rejects them, and with
    /// [`PesapalError::Transport`] when the retry budget is exhausted.
    pub async fn access_token(&self) -> Result<String, PesapalError> {
        if !self.config.is_configured() {
            return Err(PesapalError::Configuration(
                "consumer key and secret are required to request a token".to_string(),
            ));
        }
        if let Some(token) = self.token.get(Utc::now()).await {
            trace!("Using cached gateway token");
            return Ok(token);
        }
        debug!("Requesting a fresh gateway token");
        let body = serde_json::to_value(AuthRequest {
            consumer_key: &self.config.consumer_key,
            consumer_secret: self.config.consumer_secret.reveal(),
        })
        .map_err(|e| PesapalError::Json(e.to_string()))?;
        let response = self.transport.send(&OutboundRequest::post(AUTH_PATH, body)).await?;
        let auth = response.json::<AuthResponse>().map_err(|e| PesapalError::Json(e.to_string()))?;
        match (auth.status.as_str(), auth.token) {
            ("200", Some(token)) => {
                if let Some(expiry) = &auth.expiry_date {
                    debug!("Gateway reports token expiry at {expiry}; caching for {} min", TOKEN_TTL.num_minutes());
                }
                self.token.store(token.clone(), Utc::now() + TOKEN_TTL).await;
                info!("Authenticated with the payment gateway");
                Ok(token)
            },
            _ => {
                let message = auth
                    .error
                    .map(|e| e.describe())
                    .or(auth.message)
                    .unwrap_or_else(|| "the gateway did not return a token".to_string());
                Err(PesapalError::Auth(message))
            },
        }
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn invalidate_token(&self) {
        self.token.clear().await;
    }

    /// Submits a visit-booking payment and reports the outcome.
    ///
    /// Never returns an error: gateway rejections, transport exhaustion and configuration gaps all
    /// normalize into [`PaymentResult::Error`] with a message fit for the booking screen.
    pub async fn initiate_payment(&self, request: &PaymentRequest) -> PaymentResult {
        if let Err(e) = request.validate() {
            return PaymentResult::error(e.to_string());
        }
        match self.submit_order(request).await {
            Ok(result) => result,
            Err(e) => {
                error!("Payment initiation for '{}' failed: {e}", request.reference);
                PaymentResult::error(normalize_error(&e))
            },
        }
    }

    async fn submit_order(&self, request: &PaymentRequest) -> Result<PaymentResult, PesapalError> {
        let token = self.access_token().await?;
        let order = OrderRequest {
            id: merchant_reference(),
            currency: request.currency,
            amount: request.amount,
            description: request.description.clone(),
            callback_url: self.config.callback_url.clone(),
            notification_id: self.config.ipn_id.clone(),
            billing_address: BillingAddress {
                email_address: request.payer_email.clone(),
                phone_number: request.payer_phone.clone(),
                country_code: request.country_code.clone(),
                first_name: request.payer_first_name.clone(),
                last_name: request.payer_last_name.clone(),
            },
        };
        debug!("Submitting order {} for {}", order.id, request.currency.format(request.amount));
        let body = serde_json::to_value(&order).map_err(|e| PesapalError::Json(e.to_string()))?;
        let wire = OutboundRequest::post(SUBMIT_ORDER_PATH, body).with_bearer(token);
        let response = self.transport.send(&wire).await?;
        let submitted = response.json::<SubmitOrderResponse>().map_err(|e| PesapalError::Json(e.to_string()))?;
        let result = PaymentResult::from(submitted);
        match &result {
            PaymentResult::Success { tracking_id, .. } => {
                info!("Order {} accepted as {}", order.id, tracking_id.as_deref().unwrap_or("(no tracking id)"))
            },
            PaymentResult::Error { message } => warn!("Order {} declined: {message}", order.id),
        }
        Ok(result)
    }

    /// Queries the gateway for the state of a submitted payment.
    pub async fn verify_payment(&self, tracking_id: &str) -> Result<PaymentVerification, PesapalError> {
        let token = self.access_token().await?;
        debug!("Fetching transaction status for {tracking_id}");
        let request = OutboundRequest::get(TRANSACTION_STATUS_PATH)
            .with_query("orderTrackingId", tracking_id)
            .with_bearer(token);
        let response = self.transport.send(&request).await?;
        let status = response.json::<TransactionStatusResponse>().map_err(|e| PesapalError::Json(e.to_string()))?;
        if status.status != "200" {
            let message = status
                .error
                .as_ref()
                .map(|e| e.describe())
                .or_else(|| status.message.clone())
                .unwrap_or_else(|| "the status query failed".to_string());
            return Err(PesapalError::Gateway(message));
        }
        let verification = PaymentVerification::from(status);
        info!("Transaction {tracking_id} is {}", verification.payment_status);
        Ok(verification)
    }

    /// Tries to authenticate and reports the result. Touches nothing beyond the token cache.
    pub async fn test_connection(&self) -> ConnectionReport {
        match self.access_token().await {
            Ok(_) => ConnectionReport {
                success: true,
                message: format!("Connected to PesaPal ({})", self.config.environment),
            },
            Err(e) => ConnectionReport { success: false, message: e.to_string() },
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn configuration_status(&self) -> ConfigStatus {
        self.config.status()
    }
}

/// Merchant order ids look like `VISIT-1756110000000-X7K2ZQ`: the submission instant in unix
/// milliseconds plus six random alphanumerics.
fn merchant_reference() -> String {
    let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(6).map(char::from).collect();
    format!("VISIT-{}-{}", Utc::now().timestamp_millis(), suffix.to_ascii_uppercase())
}

/// The message shown on the booking screen for an internal failure. Each category keeps its own
/// wording.
fn normalize_error(e: &PesapalError) -> String {
    match e {
        PesapalError::Configuration(_) | PesapalError::Initialization(_) => {
            "Payments are not configured yet. Please contact support.".to_string()
        },
        PesapalError::Auth(message) => format!("The payment gateway refused our credentials: {message}"),
        PesapalError::Transport(t) => match t.kind {
            FailureKind::Timeout => "The payment gateway timed out. Please try again in a moment.".to_string(),
            FailureKind::ConnectionReset => {
                "The connection to the payment gateway was interrupted. Please try again.".to_string()
            },
            FailureKind::Other => format!("Could not reach the payment gateway: {}", t.message),
        },
        PesapalError::Gateway(message) => message.clone(),
        PesapalError::Json(_) => "The payment gateway returned an unexpected response. Please try again.".to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::TransportError;

    #[test]
    fn merchant_references_have_the_expected_shape() {
        let reference = merchant_reference();
        let parts: Vec<&str> = reference.splitn(3, '-').collect();
        assert_eq!(parts[0], "VISIT");
        assert!(parts[1].parse::<i64>().unwrap() > 1_700_000_000_000);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn merchant_references_do_not_repeat() {
        assert_ne!(merchant_reference(), merchant_reference());
    }

    #[test]
    fn each_failure_category_gets_its_own_message() {
        let configuration = PesapalError::Configuration("no key".to_string());
        assert!(normalize_error(&configuration).contains("not configured"));
        let auth = PesapalError::Auth("bad secret".to_string());
        assert!(normalize_error(&auth).contains("bad secret"));
        let timeout = PesapalError::Transport(TransportError {
            kind: FailureKind::Timeout,
            attempts: 3,
            message: "deadline".to_string(),
        });
        assert!(normalize_error(&timeout).contains("timed out"));
        let reset = PesapalError::Transport(TransportError {
            kind: FailureKind::ConnectionReset,
            attempts: 3,
            message: "reset".to_string(),
        });
        assert!(normalize_error(&reset).contains("interrupted"));
        let gateway = PesapalError::Gateway("amount too large".to_string());
        assert_eq!(normalize_error(&gateway), "amount too large");
    }
}
