/// NATS JetStream integration module
///
/// Subscribes the sample function to its topic and publishes sample messages

pub mod client;

pub use client::NatsTrigger;
