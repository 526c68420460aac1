//! The sample function: log the inbound message and map it to a table row.

use crate::logger::Logger;
use crate::models::{SampleMessage, SampleTableEntity};

pub const RECEIVED_TEMPLATE: &str = "Received message '{message}' with ID {id}";

/// Handler invoked once per message on the sample subscription
pub struct SampleFunction<L: Logger> {
    logger: L,
}

impl<L: Logger> SampleFunction<L> {
    pub fn new(logger: L) -> Self {
        Self { logger }
    }

    pub fn run(&self, sample: &SampleMessage) -> SampleTableEntity {
        self.logger
            .info(RECEIVED_TEMPLATE, &[sample.message.as_str(), sample.id.as_str()]);

        SampleTableEntity::from(sample)
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }
}
