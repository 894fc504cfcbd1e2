use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use ppro_checkout::config::{DEFAULT_API_URL, ServerConfig};
use ppro_checkout::domain::method::{Currency, PaymentMethod};
use ppro_checkout::interfaces::checkout::api::{CheckoutApi, HttpCheckoutApi};
use ppro_checkout::interfaces::checkout::checkout_page::{
    CheckoutController, CheckoutForm, CheckoutNext, DEMO_AMOUNT,
};
use ppro_checkout::interfaces::checkout::qr_page::{QrOutcome, QrPaymentController};
use ppro_checkout::interfaces::checkout::return_page::{ReturnPageController, ReturnParams};
use ppro_checkout::interfaces::http;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the checkout backend
    Serve(ServerConfig),
    /// Submit a payment the way the checkout page does
    Pay(PayArgs),
    /// Resolve a payment's status the way the return page does
    Status(StatusArgs),
}

#[derive(Args)]
struct ClientArgs {
    /// Base URL of the checkout API
    #[arg(long, env = "CHECKOUT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Args)]
struct PayArgs {
    /// ideal, blik, bancontact or bancontactqr
    method: PaymentMethod,

    /// Defaults to the only currency the method is offered in
    #[arg(long)]
    currency: Option<Currency>,

    /// Amount in minor units
    #[arg(long, default_value_t = DEMO_AMOUNT)]
    amount: u64,

    /// Set up a recurring agreement (iDEAL only)
    #[arg(long)]
    recurring: bool,

    /// For QR methods, keep polling until the payment settles or the code expires
    #[arg(long)]
    wait: bool,

    #[command(flatten)]
    client: ClientArgs,
}

#[derive(Args)]
struct StatusArgs {
    charge_id: String,

    #[arg(long)]
    order_id: Option<String>,

    /// Status already known from the return URL, if any
    #[arg(long)]
    status: Option<String>,

    #[command(flatten)]
    client: ClientArgs,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Serve(config) => http::serve(config).await.into_diagnostic(),
        Command::Pay(args) => pay(args).await,
        Command::Status(args) => status(args).await,
    }
}

async fn pay(args: PayArgs) -> Result<()> {
    let api: Arc<dyn CheckoutApi> = Arc::new(HttpCheckoutApi::new(args.client.api_url));

    let mut form = CheckoutForm::new(args.amount);
    form.select_currency(args.currency.unwrap_or(args.method.currency()));
    form.select_method(args.method).into_diagnostic()?;
    if args.recurring && !form.set_recurring(true) {
        tracing::warn!(method = %args.method, "recurring is not offered for this method");
    }

    let controller = CheckoutController::new(Arc::clone(&api)).with_form(form);
    match controller.submit().await.into_diagnostic()? {
        CheckoutNext::Redirect { url } => println!("{url}"),
        CheckoutNext::QrPage { url, params } => {
            println!("{url}");
            if let Some(qr_data) = &params.qr_data {
                println!("QR data: {qr_data}");
            }
            if args.wait {
                let session = QrPaymentController::new(api, params).start();
                println!("Code valid for {}", session.timer_label());
                match session.outcome().await {
                    Some(QrOutcome::Succeeded { return_url }) => println!("{return_url}"),
                    Some(QrOutcome::Failed { status }) => println!("Payment failed: {status}"),
                    Some(QrOutcome::Expired) => println!("QR code expired"),
                    Some(QrOutcome::Invalid) => println!("Invalid QR code data"),
                    None => println!("Stopped"),
                }
            }
        }
    }
    Ok(())
}

async fn status(args: StatusArgs) -> Result<()> {
    let api: Arc<dyn CheckoutApi> = Arc::new(HttpCheckoutApi::new(args.client.api_url));
    let params = ReturnParams {
        status: args.status,
        charge_id: Some(args.charge_id),
        method: None,
        order_id: args.order_id,
    };

    let view = ReturnPageController::new(api, params).resolve().await;
    println!("{}", view.state.title());
    println!("{}", view.state.message());
    println!("Status: {}", view.status);
    if let Some(charge_id) = &view.charge_id {
        println!("Charge: {charge_id}");
    }
    if let Some(error) = &view.error {
        println!("Error: {error}");
    }
    Ok(())
}
