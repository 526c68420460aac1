//! Turns one raw queue payload into one stored row.

use crate::error::AppError;
use crate::function::SampleFunction;
use crate::logger::Logger;
use crate::models::{SampleMessage, SampleTableEntity};
use crate::table::TableSink;

/// Decode `payload`, run the sample function on it and upsert the row.
///
/// Nothing is written when the payload does not decode.
pub fn dispatch<L, S>(
    payload: &[u8],
    function: &SampleFunction<L>,
    sink: &S,
) -> Result<SampleTableEntity, AppError>
where
    L: Logger,
    S: TableSink + ?Sized,
{
    let sample: SampleMessage = serde_json::from_slice(payload)?;

    let row = function.run(&sample);

    sink.upsert(&row)?;
    tracing::debug!("Stored row {}/{}", row.partition_key, row.row_key);

    Ok(row)
}
