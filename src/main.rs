use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use placeorder::application::handler::{DEFAULT_MAX_STEPS, EngineConfig, PlaceOrderHandler};
use placeorder::application::registry::StateRegistry;
use placeorder::domain::payment::{
    PaymentDecisionFn, PaymentStatus, lenient_decision, strict_decision,
};
use placeorder::domain::ports::{OrderStoreRef, ProcessStoreBox};
use placeorder::infrastructure::in_memory::{
    GatewaySnapshotStore, InMemoryCartProvider, InMemoryOrderStore, InMemoryPaymentGateway,
    InMemoryProcessStore,
};
use placeorder::interfaces::controller::CheckoutController;
use placeorder::interfaces::csv::command_reader::CommandReader;
use placeorder::interfaces::csv::outcome_writer::OutcomeWriter;
use placeorder::interfaces::script::ScriptRunner;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DecisionPolicy {
    /// Approved or completed payments confirm the order
    Lenient,
    /// Only completed (captured) payments confirm the order
    Strict,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command script CSV file (session, command, arg)
    input: PathBuf,

    /// JSON file mapping session ids to carts
    #[arg(long)]
    carts: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Maximum number of transitions a single command may run
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// How the gateway's payment status is turned into a decision
    #[arg(long, value_enum, default_value = "lenient")]
    payment_decision: DecisionPolicy,

    /// Status newly created payments start with on the simulated gateway
    #[arg(long, default_value = "unapproved")]
    initial_payment_status: PaymentStatus,
}

/// Storage backends selected on the command line.
struct Stores {
    process_store: ProcessStoreBox,
    order_store: OrderStoreRef,
    /// Where the simulated gateway's intents are kept between runs, if anywhere.
    gateway_snapshots: Option<Box<dyn GatewaySnapshotStore>>,
}

fn stores(db_path: Option<PathBuf>) -> Result<Stores> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = db_path {
        use placeorder::infrastructure::rocksdb::RocksDBStore;

        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok(Stores {
            process_store: Box::new(store.clone()),
            order_store: Arc::new(store.clone()),
            gateway_snapshots: Some(Box::new(store)),
        });
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        tracing::warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    Ok(Stores {
        process_store: Box::new(InMemoryProcessStore::new()),
        order_store: Arc::new(InMemoryOrderStore::new()),
        gateway_snapshots: None,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,placeorder=info")),
        )
        .init();

    let cli = Cli::parse();

    let Stores {
        process_store,
        order_store,
        gateway_snapshots,
    } = stores(cli.db_path)?;
    let gateway = InMemoryPaymentGateway::with_initial_status(cli.initial_payment_status);
    if let Some(snapshots) = &gateway_snapshots {
        if let Some(snapshot) = snapshots.load_gateway_snapshot().into_diagnostic()? {
            tracing::info!(intents = snapshot.intents.len(), "simulated gateway restored");
            gateway.restore(snapshot);
        }
    }
    let decide: PaymentDecisionFn = match cli.payment_decision {
        DecisionPolicy::Lenient => Arc::new(lenient_decision),
        DecisionPolicy::Strict => Arc::new(strict_decision),
    };

    let registry = StateRegistry::standard(Arc::new(gateway.clone()), order_store, decide);
    let handler = PlaceOrderHandler::with_config(
        process_store,
        registry,
        EngineConfig {
            max_steps: cli.max_steps,
        },
    );
    let carts = InMemoryCartProvider::from_json_file(&cli.carts).into_diagnostic()?;
    let runner = ScriptRunner::new(
        CheckoutController::new(Arc::new(handler), Box::new(carts)),
        gateway.clone(),
    );

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    for command in reader.commands() {
        match command {
            Ok(command) => {
                let outcome = runner.execute(&command).await;
                writer.write_outcome(&outcome).into_diagnostic()?;
                if let Some(snapshots) = &gateway_snapshots {
                    snapshots
                        .save_gateway_snapshot(&gateway.snapshot())
                        .into_diagnostic()?;
                }
            }
            Err(e) => {
                tracing::error!("Error reading command: {}", e);
            }
        }
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
