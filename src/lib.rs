//! # aisquick-function: queue-triggered sample function
//!
//! Receives sample messages from a NATS JetStream subscription, logs each
//! one and writes a matching row to a SQL table.
//!
//! ```ignore
//! use aisquick_function::{SampleFunction, SampleMessage, TracingLogger};
//!
//! let function = SampleFunction::new(TracingLogger);
//! let row = function.run(&SampleMessage::new("42", "hello"));
//! assert_eq!(row.message, "hello");
//! ```

// Core modules
pub mod models;
pub mod logger;
pub mod function;
pub mod dispatch;
pub mod error;
pub mod config;

// Table storage (Diesel)
pub mod table;

// NATS JetStream integration
pub mod nats;

// Re-export key types
pub use models::{SampleMessage, SampleTableEntity, SAMPLE_PARTITION};
pub use logger::{Logger, TracingLogger, render_template};
pub use function::SampleFunction;
pub use dispatch::dispatch;
pub use error::AppError;
pub use config::{TriggerConfig, TableConfig};
pub use table::{TableSink, TableName, DieselTable, MemoryTable, Database};
pub use nats::NatsTrigger;
