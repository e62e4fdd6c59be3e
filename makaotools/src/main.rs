use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;

mod commands;

use crate::commands::{handle_config, handle_fee, handle_pay, handle_ping, handle_verify};

/// Operator tooling for the Makao visit-booking payment gateway.
#[derive(Parser, Debug)]
#[command(version = "0.1.0", author = "Makao")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the visit booking fee for a country
    #[clap(name = "fee")]
    Fee {
        /// The country the visitor is booking from
        #[arg(short, long, default_value = "Kenya")]
        country: String,
    },
    /// Report which PesaPal configuration values are present
    #[clap(name = "config")]
    Config,
    /// Check connectivity to the payment gateway
    #[clap(name = "ping")]
    Ping,
    /// Initiate a visit booking payment
    #[clap(name = "pay")]
    Pay(PayParams),
    /// Look up the status of a submitted payment
    #[clap(name = "verify")]
    Verify {
        /// The order tracking id returned when the payment was initiated
        #[arg(short, long)]
        tracking_id: String,
    },
}

#[derive(Debug, Args)]
pub struct PayParams {
    /// The country the visitor is booking from. Sets the default amount and currency.
    #[arg(short, long, default_value = "Kenya")]
    pub country: String,
    /// Fee amount in major units. Defaults to the country's fee schedule.
    #[arg(short, long)]
    pub amount: Option<i64>,
    /// Fee currency code. Defaults to the country's fee schedule.
    #[arg(long)]
    pub currency: Option<String>,
    /// The booking reference this payment belongs to
    #[arg(short, long)]
    pub reference: String,
    /// What the payment is for
    #[arg(short, long, default_value = "Property visit booking fee")]
    pub description: String,
    #[arg(long, default_value = "visitor@example.com")]
    pub email: String,
    #[arg(long, default_value = "+254700000000")]
    pub phone: String,
    #[arg(long, default_value = "Makao")]
    pub first_name: String,
    #[arg(long, default_value = "Visitor")]
    pub last_name: String,
    /// ISO 3166 alpha-2 billing country code
    #[arg(long, default_value = "KE")]
    pub country_code: String,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    match cli.command {
        Command::Fee { country } => handle_fee(&country),
        Command::Config => handle_config(),
        Command::Ping => handle_ping().await,
        Command::Pay(params) => handle_pay(params).await,
        Command::Verify { tracking_id } => handle_verify(&tracking_id).await,
    }
}
