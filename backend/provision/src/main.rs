use std::path::PathBuf;

use anyhow::Error;
use clap::{Args as ClapArgs, Parser, Subcommand};
use records::{HealthSample, remote::RealtimeDatabase};
use reqwest::Client;

use provision::{
    import_file,
    models::SampleRow,
    utils::{parse_date, parse_heart_rate, parse_oxygen, parse_prn, parse_weight, today},
    write_sample,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the realtime database.
    #[arg(long, env = "RECORDS_ENDPOINT")]
    endpoint: String,

    /// Database secret or access token.
    #[arg(long, env = "RECORDS_AUTH", hide_env_values = true)]
    auth: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a single sample.
    Sample(SampleArgs),

    /// Write every sample listed in a file.
    Import { file: PathBuf },
}

#[derive(ClapArgs, Debug)]
struct SampleArgs {
    #[arg(long)]
    prn: String,

    /// Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long, default_value = "Unknown")]
    spo2: String,

    #[arg(long, default_value = "Unknown")]
    heart_rate: String,

    #[arg(long)]
    weight: Option<String>,
}

impl SampleArgs {
    fn into_row(self) -> Result<SampleRow, Error> {
        Ok(SampleRow {
            prn: parse_prn(&self.prn)?,
            date: parse_date(&self.date.unwrap_or_else(today))?,
            sample: HealthSample {
                oxygen_saturation: parse_oxygen(&self.spo2)?,
                heart_rate: parse_heart_rate(&self.heart_rate)?,
                weight: self.weight.as_deref().map(parse_weight).transpose()?,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();
    let store = RealtimeDatabase::new(Client::new(), &args.endpoint, args.auth)?;

    match args.command {
        Command::Sample(sample) => {
            let row = sample.into_row()?;
            write_sample(&store, &row).await?;

            println!("Wrote sample {} for PRN {}", row.date, row.prn);
        }
        Command::Import { file } => {
            let summary = import_file(&store, &file).await?;

            println!("Written: {}", summary.written);
            println!("Skipped: {}", summary.skipped);
            println!("Failed: {}", summary.failed);
        }
    }

    Ok(())
}
