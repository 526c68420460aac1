//! aisquick-function - runs the sample function against a NATS subscription
//!
//! Environment variables (and `.env`) provide defaults; flags override them.

use clap::{Args, Parser, Subcommand};
use std::process;
use std::sync::Arc;

use aisquick_function::{
    AppError, Database, DieselTable, MemoryTable, NatsTrigger, SampleFunction, SampleMessage,
    TableConfig, TableName, TableSink, TracingLogger, TriggerConfig,
};

#[derive(Parser)]
#[command(name = "aisquick-function")]
#[command(version, about = "Log sample messages from a queue and write them to a table", long_about = None)]
struct Cli {
    #[command(flatten)]
    broker: BrokerArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct BrokerArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL")]
    nats_url: Option<String>,

    /// JetStream stream holding the topic
    #[arg(long, env = "NATS_STREAM")]
    stream: Option<String>,

    /// Topic subject the samples are published on
    #[arg(long, env = "SAMPLE_TOPIC")]
    topic: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume the subscription and write rows (default)
    Run {
        /// Durable subscription name
        #[arg(long, env = "SAMPLE_SUBSCRIPTION")]
        subscription: Option<String>,

        /// Target table
        #[arg(long, env = "SAMPLE_TABLE")]
        table: Option<String>,

        /// Database connection string
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,

        /// Keep rows in memory instead of writing to the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Publish one sample message to the topic
    Send {
        #[arg(long)]
        id: String,

        #[arg(long)]
        message: String,
    },
}

fn trigger_config(broker: BrokerArgs) -> TriggerConfig {
    let mut config = TriggerConfig::default();
    if let Some(url) = broker.nats_url {
        config.nats_url = url;
    }
    if let Some(stream) = broker.stream {
        config.stream_name = stream;
    }
    if let Some(topic) = broker.topic {
        config.topic = topic;
    }
    config
}

async fn run(
    mut trigger_config: TriggerConfig,
    subscription: Option<String>,
    table: Option<String>,
    database_url: Option<String>,
    dry_run: bool,
) -> Result<(), AppError> {
    if let Some(subscription) = subscription {
        trigger_config.subscription = subscription;
    }

    let mut table_config = TableConfig::default();
    if let Some(table) = table {
        table_config.table_name = table;
    }
    if database_url.is_some() {
        table_config.database_url = database_url;
    }

    let sink = open_sink(&table_config, dry_run)?;

    let trigger = NatsTrigger::connect(trigger_config).await?;
    let function = SampleFunction::new(TracingLogger);

    trigger.run(&function, sink.as_ref()).await
}

/// Validate the table name, then open the database table or an in-memory one
fn open_sink(table_config: &TableConfig, dry_run: bool) -> Result<Arc<dyn TableSink>, AppError> {
    let table_name = TableName::parse(&table_config.table_name)?;

    if dry_run {
        tracing::warn!("Dry run: rows for '{}' are kept in memory only", table_name.as_str());
        return Ok(Arc::new(MemoryTable::new()));
    }

    let db = Database::new(table_config)?;
    db.test_connection()?;

    let table = DieselTable::new(db, table_name);
    table.ensure_table()?;
    Ok(Arc::new(table))
}

async fn send(trigger_config: TriggerConfig, id: String, message: String) -> Result<(), AppError> {
    let trigger = NatsTrigger::connect(trigger_config).await?;
    let sample = SampleMessage::new(id, message);
    trigger.publish(&sample).await?;

    tracing::info!("Sent message {}", sample.id);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads them
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let trigger_config = trigger_config(cli.broker);

    let result = match cli.command.unwrap_or(Commands::Run {
        subscription: None,
        table: None,
        database_url: None,
        dry_run: false,
    }) {
        Commands::Run {
            subscription,
            table,
            database_url,
            dry_run,
        } => run(trigger_config, subscription, table, database_url, dry_run).await,
        Commands::Send { id, message } => send(trigger_config, id, message).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}
