//! Synthetic Contract Producer
//!
//! Generates clean and suspicious procurement contracts and publishes them to
//! NATS for pipeline testing.
//!
//! Usage: contract_producer [nats_url] [subject] [count] [suspicious_rate] [delay_ms] [batch_size]
//!
//! With `batch_size > 1` contracts are grouped into `{"contracts": [...]}`
//! payloads, which the worker expects on its batch subject.

use procurement_risk_pipeline::handler::BatchRequest;
use procurement_risk_pipeline::ContractRecord;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const DEPARTMENTS: [&str; 6] = [
    "Public Works",
    "Health",
    "Education",
    "Transport",
    "Water Resources",
    "Home Affairs",
];

const DESCRIPTIVE_TITLES: [&str; 5] = [
    "Supply and installation of solar street lighting along the district ring road",
    "Procurement of laboratory reagents for the regional public health laboratory",
    "Construction of a two-storey classroom block at the municipal secondary school",
    "Annual maintenance contract for water treatment plant pumping equipment",
    "Provision of school meals for primary schools in the northern education zone",
];

const VAGUE_TITLES: [&str; 5] = [
    "Consulting",
    "IT services",
    "Misc. supplies",
    "Works",
    "Advisory",
];

/// Contract generator for testing
struct ContractGenerator {
    rng: rand::rngs::ThreadRng,
    contract_counter: u64,
}

impl ContractGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            contract_counter: 0,
        }
    }

    /// Competitive award close to its estimate
    fn generate_clean(&mut self) -> ContractRecord {
        self.contract_counter += 1;
        let estimate = self.rng.gen_range(20_000.0..2_000_000.0_f64).round();
        let final_price = (estimate * self.rng.gen_range(0.85..1.04) * 100.0).round() / 100.0 + 0.37;
        let month = self.rng.gen_range(1..12);

        ContractRecord::new(
            format!("{} (lot {})", self.random_choice(&DESCRIPTIVE_TITLES), self.contract_counter),
            estimate,
            final_price,
            self.rng.gen_range(3..12),
        )
        .with_department(self.random_choice(&DEPARTMENTS))
        .with_award_month(month)
        .with_timing(false, false)
    }

    /// Single bidder, vague title, round overrun price, end-of-year award
    fn generate_suspicious(&mut self) -> ContractRecord {
        self.contract_counter += 1;
        let estimate = self.rng.gen_range(50_000.0..1_000_000.0_f64).round();
        let final_price = ((estimate * self.rng.gen_range(1.1..1.6)) / 1000.0).round() * 1000.0;
        let is_december = self.rng.gen_bool(0.6);

        ContractRecord::new(self.random_choice(&VAGUE_TITLES), estimate, final_price, 1)
            .with_department(self.random_choice(&DEPARTMENTS))
            .with_award_month(if is_december { 12 } else { self.rng.gen_range(1..12) })
            .with_timing(self.rng.gen_bool(0.3), is_december)
    }

    fn generate(&mut self, suspicious_rate: f64) -> (ContractRecord, bool) {
        if self.rng.gen_bool(suspicious_rate) {
            (self.generate_suspicious(), true)
        } else {
            (self.generate_clean(), false)
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("contract_producer=info".parse()?),
        )
        .init();

    info!("Starting Synthetic Contract Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("procurement.contracts");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let suspicious_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.2_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);
    let batch_size: usize = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(1).max(1);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        suspicious_rate = suspicious_rate,
        delay_ms = delay_ms,
        batch_size = batch_size,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, suspicious_rate, delay_ms).await;
        }
    };

    let mut generator = ContractGenerator::new();
    let mut clean_count = 0;
    let mut suspicious_count = 0;
    let mut pending = Vec::with_capacity(batch_size);

    info!("Starting to publish {} contracts...", count);

    for i in 0..count {
        let (contract, suspicious) = generator.generate(suspicious_rate);
        if suspicious {
            suspicious_count += 1;
        } else {
            clean_count += 1;
        }

        let payload = if batch_size > 1 {
            pending.push(contract);
            if pending.len() < batch_size && i + 1 < count {
                continue;
            }
            serde_json::to_vec(&BatchRequest {
                contracts: std::mem::take(&mut pending),
            })?
        } else {
            serde_json::to_vec(&contract)?
        };

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} contracts ({} clean, {} suspicious)",
                i + 1,
                count,
                clean_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;
    info!(
        "Completed! Published {} contracts ({} clean, {} suspicious)",
        count, clean_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, suspicious_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = ContractGenerator::new();

    for i in 0..count {
        let (contract, _) = generator.generate(suspicious_rate);
        let json = serde_json::to_string_pretty(&contract)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample contract {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
