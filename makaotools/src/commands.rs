use anyhow::Result;
use log::info;
use mpg_common::{visit_booking_fee, Currency, Money};
use pesapal_tools::{PaymentGateway, PaymentRequest, PaymentService, PesapalConfig};

use crate::PayParams;

fn new_payment_service() -> PaymentService {
    let config = PesapalConfig::new_from_env_or_default();
    match PaymentService::from_config(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error selecting payment gateway: {e}");
            std::process::exit(1);
        },
    }
}

pub fn handle_fee(country: &str) {
    let fee = visit_booking_fee(country);
    println!("Visit booking fee for {country}: {fee}");
}

pub fn handle_config() {
    let service = new_payment_service();
    if service.is_mock() {
        println!("No PesaPal credentials found. Payments will run against the mock gateway.");
    }
    let status = service.configuration_status();
    let json =
        serde_json::to_string_pretty(&status).unwrap_or_else(|e| format!("Could not represent status as JSON. {e}"));
    println!("{status}\n{json}");
}

pub async fn handle_ping() {
    let service = new_payment_service();
    println!("Checking payment gateway connection...");
    let report = service.test_connection().await;
    if report.success {
        println!("Connected: {}", report.message);
    } else {
        eprintln!("Disconnected: {}", report.message);
        std::process::exit(1);
    }
}

pub async fn handle_pay(params: PayParams) {
    let fee = visit_booking_fee(&params.country);
    let currency = match &params.currency {
        Some(code) => match code.parse::<Currency>() {
            Ok(currency) => currency,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            },
        },
        None => fee.currency,
    };
    let amount = params.amount.map(Money::from_major).unwrap_or(fee.amount);
    let request = PaymentRequest {
        amount,
        currency,
        description: params.description,
        reference: params.reference,
        payer_email: params.email,
        payer_phone: params.phone,
        payer_first_name: params.first_name,
        payer_last_name: params.last_name,
        country_code: params.country_code,
    };
    info!("Initiating a payment of {} for booking '{}'", currency.format(amount), request.reference);
    let service = new_payment_service();
    let result = service.initiate_payment(&request).await;
    let json =
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Could not represent result as JSON. {e}"));
    println!("{json}");
}

pub async fn handle_verify(tracking_id: &str) {
    async fn verify(tracking_id: &str) -> Result<String> {
        let service = new_payment_service();
        let verification = service.verify_payment(tracking_id).await?;
        let json = serde_json::to_string_pretty(&verification)?;
        Ok(json)
    }
    match verify(tracking_id).await {
        Ok(json) => println!("Payment {tracking_id}\n{json}"),
        Err(e) => {
            eprintln!("Error verifying payment {tracking_id}: {e}");
            std::process::exit(1);
        },
    }
}
