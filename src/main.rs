use bank_trama::application::payment::PaymentService;
use bank_trama::application::reference::random_reference;
use bank_trama::config::BankConfig;
use bank_trama::domain::frame::{pack, unpack};
use bank_trama::domain::ports::{InvoicerBox, TransactionLog, TransactionLogBox};
use bank_trama::infrastructure::in_memory::{InMemoryInvoicer, InMemoryTransactionLog};
use bank_trama::infrastructure::invoice::FileInvoicer;
#[cfg(feature = "storage-rocksdb")]
use bank_trama::infrastructure::rocksdb::RocksDbTransactionLog;
use bank_trama::infrastructure::tcp::TcpBankTransport;
use bank_trama::interfaces::csv::attempt_writer::AttemptWriter;
use bank_trama::interfaces::json::request_reader::RequestReader;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with bank settings and frame defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bank host
    #[arg(long, env = "BANK_HOST", global = true)]
    host: Option<String>,

    /// Bank port
    #[arg(long, env = "BANK_PORT", global = true)]
    port: Option<u16>,

    /// Hard timeout for one exchange with the bank, in milliseconds
    #[arg(long, env = "BANK_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a storefront payment request (JSON) and print the receipt
    Pay {
        request: PathBuf,
        /// Write invoice documents into this directory
        #[arg(long)]
        invoice_dir: Option<PathBuf>,
    },
    /// Send a ready-made 63-digit frame and print the bank's answer
    Relay { frame: String },
    /// Pack transaction fields (JSON) into a frame
    Encode { fields: PathBuf },
    /// Unpack a frame into JSON
    Decode { frame: String },
    /// Write every logged attempt as CSV
    Audit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BankConfig::from_file(path).into_diagnostic()?,
        None => BankConfig::default(),
    }
    .with_overrides(cli.host, cli.port, cli.timeout_ms)
    .into_diagnostic()?;

    match cli.command {
        Command::Pay {
            request,
            invoice_dir,
        } => {
            let request = RequestReader::new(File::open(request).into_diagnostic()?)
                .payment_request()
                .into_diagnostic()?;
            let invoicer: InvoicerBox = match invoice_dir {
                Some(dir) => Box::new(FileInvoicer::new(dir)),
                None => Box::new(InMemoryInvoicer::new()),
            };
            let service = build_service(&config, invoicer, cli.db_path)?;
            let receipt = service.process_payment(request).await.into_diagnostic()?;
            print_json(&receipt)?;
        }
        Command::Relay { frame } => {
            let service = build_service(&config, Box::new(InMemoryInvoicer::new()), cli.db_path)?;
            let reply = service.relay_frame(&frame).await.into_diagnostic()?;
            print_json(&reply)?;
        }
        Command::Encode { fields } => {
            let input = RequestReader::new(File::open(fields).into_diagnostic()?)
                .transaction_input()
                .into_diagnostic()?;
            let reference = input
                .reference_number
                .clone()
                .unwrap_or_else(|| random_reference(&mut rand::thread_rng()));
            let fields = input
                .resolve(&config.defaults, &reference, None)
                .into_diagnostic()?;
            println!("{}", pack(&fields).into_diagnostic()?);
        }
        Command::Decode { frame } => {
            let decoded = unpack(frame.trim()).into_diagnostic()?;
            print_json(&decoded)?;
        }
        Command::Audit => {
            let log = transaction_log(cli.db_path)?;
            let records = log.all().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = AttemptWriter::new(stdout.lock());
            writer.write_records(&records).into_diagnostic()?;
        }
    }

    Ok(())
}

fn build_service(
    config: &BankConfig,
    invoicer: InvoicerBox,
    db_path: Option<PathBuf>,
) -> Result<PaymentService> {
    let transport = TcpBankTransport::new(config.endpoint());
    Ok(PaymentService::new(
        Box::new(transport),
        invoicer,
        transaction_log(db_path)?,
        config.defaults.clone(),
    ))
}

fn transaction_log(db_path: Option<PathBuf>) -> Result<TransactionLogBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Box::new(
            RocksDbTransactionLog::open(path).into_diagnostic()?,
        )),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryTransactionLog::new()))
        }
        None => Ok(Box::new(InMemoryTransactionLog::new())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
