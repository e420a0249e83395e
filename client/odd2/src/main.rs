//! Odd 2 client — entry point.
//!
//! Drives the VIP payment flow against a running Odd 2 backend, plus the
//! page's decorative widgets (countdown, social proof), as CLI subcommands.

use clap::{Parser, Subcommand};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use odd2_client::api::{HttpPaymentApi, PaymentApi};
use odd2_client::config::Config;
use odd2_client::countdown::Countdown;
use odd2_client::flow::{FlowOptions, FlowOutcome, PaymentFlow};
use odd2_client::socialproof::{self, SocialProof};

#[derive(Parser)]
#[command(name = "odd2-client", version, about = "Client for the Odd 2 football predictions site")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Buy VIP access with mobile money and wait for confirmation
    Pay {
        /// Mobile-money phone number to charge
        #[arg(long)]
        phone: String,
    },
    /// Unlock the VIP prediction through the demo endpoint
    Demo,
    /// Show the countdown to the next prediction update
    Countdown,
    /// Tick the countdown live, with the page's social-proof widgets
    Watch,
    /// Trigger prediction generation on the backend (admin)
    GeneratePredictions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let client = Client::builder().timeout(config.http_timeout()).build()?;
    let api = HttpPaymentApi::new(client, config.base_url.clone());

    match cli.command {
        Command::Pay { phone } => {
            let mut flow = PaymentFlow::new(api, FlowOptions::from_config(&config));
            let outcome = flow.submit(&phone).await;
            if let Some(notice) = flow.notifier().current() {
                println!("{}", notice.message);
            }
            if outcome == FlowOutcome::Completed {
                // The browser would reload here; re-fetch instead so the
                // freshly unlocked state is picked up from the server.
                let response = flow.api().fetch_countdown().await?;
                let countdown = Countdown::from_response(&response);
                info!(
                    "VIP prediction unlocked; next update at {} (in {countdown})",
                    countdown.next_update_label()
                );
            }
        }

        Command::Demo => {
            let mut flow = PaymentFlow::new(api, FlowOptions::from_config(&config));
            let outcome = flow.demo().await;
            if let Some(notice) = flow.notifier().current() {
                println!("{}", notice.message);
            }
            info!("demo flow finished: {outcome:?}");
        }

        Command::Countdown => {
            let response = api.fetch_countdown().await?;
            let countdown = Countdown::from_response(&response);
            println!(
                "{countdown} until the next update at {} (around {})",
                countdown.next_update_label(),
                countdown.ends_at().format("%H:%M:%S")
            );
        }

        Command::Watch => loop {
            let response = api.fetch_countdown().await?;
            let countdown = Countdown::from_response(&response);

            let cancel = CancellationToken::new();
            let proof = SocialProof::seed(&mut rand::thread_rng());
            let widgets = tokio::spawn(socialproof::run(proof, cancel.clone()));

            countdown.run().await;

            // The refresh tears the page down; the widgets restart with it.
            cancel.cancel();
            let _ = widgets.await;
            info!("refreshing predictions view");
        },

        Command::GeneratePredictions => {
            let ack = api.generate_predictions().await?;
            if ack.success {
                info!(
                    "{}",
                    ack.message.unwrap_or_else(|| "Predictions generated".to_string())
                );
            } else {
                anyhow::bail!(ack.error.unwrap_or_else(|| "Prediction generation failed".to_string()));
            }
        }
    }

    Ok(())
}
