//! Client tooling for the PesaPal v3 payment gateway, as used by the Makao property platform to
//! collect visit-booking fees.
//!
//! [`PaymentService::from_config`] is the usual entry point: it reads the environment, selects the
//! live [`PesapalApi`] client or the [`MockPesapal`] stand-in, and hands back a [`PaymentGateway`]
//! implementation the booking flow can drive without caring which backend it got.

mod api;
mod config;
mod error;
mod gateway;
mod mock;
mod token;
mod transport;

mod data_objects;

pub use api::{PesapalApi, AUTH_PATH, SUBMIT_ORDER_PATH, TRANSACTION_STATUS_PATH};
pub use config::{ConfigStatus, Environment, PesapalConfig, LIVE_BASE_URL, SANDBOX_BASE_URL};
pub use data_objects::{
    AuthRequest,
    AuthResponse,
    BillingAddress,
    ConnectionReport,
    GatewayFault,
    InvalidAmount,
    OrderRequest,
    PaymentRequest,
    PaymentResult,
    PaymentStatus,
    PaymentVerification,
    SubmitOrderResponse,
    TransactionStatusResponse,
};
pub use error::PesapalError;
pub use gateway::{PaymentGateway, PaymentService};
pub use mock::MockPesapal;
pub use token::{TokenCache, TOKEN_TTL};
pub use transport::{
    Failure,
    FailureKind,
    HttpSender,
    HttpTransport,
    OutboundRequest,
    RetryPolicy,
    SendOnce,
    Transport,
    TransportError,
    WireResponse,
};
