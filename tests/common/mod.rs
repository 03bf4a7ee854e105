use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 9] = [
    "id",
    "amount",
    "currency",
    "channel",
    "fee",
    "fee_rate",
    "amount_ref",
    "status",
    "date",
];

const CHANNELS: [&str; 4] = ["swift", "wise", "paypal", "alipay_global"];
const CURRENCIES: [(&str, f64); 3] = [("USD", 7.25), ("EUR", 7.85), ("GBP", 9.15)];
const STATUSES: [&str; 3] = ["completed", "completed", "failed"];

/// Writes `rows` random but well-formed ledger rows. Same seed, same file.
pub fn generate_ledger(path: &Path, rows: usize, seed: u64) -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    for i in 1..=rows {
        let amount: u32 = rng.gen_range(100..50_000);
        let fee_rate: f64 = rng.gen_range(0.005..0.03);
        let (currency, rate) = CURRENCIES[rng.gen_range(0..CURRENCIES.len())];
        let channel = CHANNELS.choose(&mut rng).copied().unwrap_or("swift");
        let status = STATUSES.choose(&mut rng).copied().unwrap_or("completed");
        let day: u32 = rng.gen_range(1..=28);

        wtr.write_record([
            format!("tx{i:05}"),
            amount.to_string(),
            currency.to_string(),
            channel.to_string(),
            format!("{:.2}", f64::from(amount) * fee_rate),
            format!("{fee_rate:.4}"),
            format!("{:.2}", f64::from(amount) * rate),
            status.to_string(),
            format!("2024-03-{day:02}"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
