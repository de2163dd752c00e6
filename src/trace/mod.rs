//! Sampling traces (Arrow columnar)
//!
//! A trace is the full record of `(chain, step, loss)` observations produced
//! by one sampling run. Records are stored column-wise in a single Arrow
//! [`RecordBatch`] with a fixed schema:
//!
//! ```text
//! chain: UInt32 (non-null) | step: UInt64 (non-null) | loss: Float64 (non-null)
//! ```
//!
//! Traces are append-only values: samplers build them once, the estimator
//! reads them, nothing mutates them afterwards.

mod storage;

use crate::{Error, Result};
use arrow::array::{Array, Float64Array, RecordBatch, UInt32Array, UInt64Array};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Column holding the chain identifier
pub const CHAIN_COLUMN: &str = "chain";
/// Column holding the step index within a chain
pub const STEP_COLUMN: &str = "step";
/// Column holding the loss recorded at a draw
pub const LOSS_COLUMN: &str = "loss";

/// Arrow schema shared by every trace
#[must_use]
pub fn trace_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(CHAIN_COLUMN, DataType::UInt32, false),
        Field::new(STEP_COLUMN, DataType::UInt64, false),
        Field::new(LOSS_COLUMN, DataType::Float64, false),
    ]))
}

/// One recorded draw of one chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TraceRecord {
    chain: u32,
    step: u64,
    loss: f64,
}

impl TraceRecord {
    /// Create a new trace record.
    ///
    /// # Arguments
    ///
    /// * `chain` - Chain identifier in `[0, num_chains)`
    /// * `step` - Step index within the chain
    /// * `loss` - Loss evaluated at the draw's parameter state
    #[must_use]
    pub const fn new(chain: u32, step: u64, loss: f64) -> Self {
        Self { chain, step, loss }
    }

    /// Get the chain identifier.
    #[must_use]
    pub const fn chain(&self) -> u32 {
        self.chain
    }

    /// Get the step index.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the recorded loss.
    #[must_use]
    pub const fn loss(&self) -> f64 {
        self.loss
    }
}

/// Columnar trace of one sampling run.
#[derive(Debug, Clone)]
pub struct Trace {
    batch: RecordBatch,
    chain: UInt32Array,
    step: UInt64Array,
    loss: Float64Array,
}

impl Trace {
    /// Create a trace with no records.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(trace_schema()),
            chain: UInt32Array::from(Vec::<u32>::new()),
            step: UInt64Array::from(Vec::<u64>::new()),
            loss: Float64Array::from(Vec::<f64>::new()),
        }
    }

    /// Build a trace from records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns error if the Arrow batch cannot be assembled
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = TraceRecord>,
    {
        let records = records.into_iter();
        let (lower, _) = records.size_hint();
        let mut chains = Vec::with_capacity(lower);
        let mut steps = Vec::with_capacity(lower);
        let mut losses = Vec::with_capacity(lower);

        for record in records {
            chains.push(record.chain);
            steps.push(record.step);
            losses.push(record.loss);
        }

        let chain = UInt32Array::from(chains);
        let step = UInt64Array::from(steps);
        let loss = Float64Array::from(losses);

        let batch = RecordBatch::try_new(
            trace_schema(),
            vec![
                Arc::new(chain.clone()),
                Arc::new(step.clone()),
                Arc::new(loss.clone()),
            ],
        )?;

        Ok(Self {
            batch,
            chain,
            step,
            loss,
        })
    }

    /// Wrap an existing record batch.
    ///
    /// The batch must carry the trace schema (column names and types) and no
    /// nulls.
    ///
    /// # Errors
    ///
    /// Returns error if the schema does not match or a column holds nulls
    pub fn from_record_batch(batch: RecordBatch) -> Result<Self> {
        let expected = trace_schema();
        let actual = batch.schema();

        let compatible = actual.fields().len() == expected.fields().len()
            && actual
                .fields()
                .iter()
                .zip(expected.fields().iter())
                .all(|(a, e)| a.name() == e.name() && a.data_type() == e.data_type());

        if !compatible {
            return Err(Error::StorageError(format!(
                "Schema mismatch: expected {expected:?}, got {actual:?}"
            )));
        }

        for column in batch.columns() {
            if column.null_count() > 0 {
                return Err(Error::StorageError(
                    "Trace columns must not contain nulls".to_string(),
                ));
            }
        }

        let chain = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| Error::StorageError("Failed to downcast to UInt32Array".to_string()))?
            .clone();
        let step = batch
            .column(1)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .ok_or_else(|| Error::StorageError("Failed to downcast to UInt64Array".to_string()))?
            .clone();
        let loss = batch
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                Error::StorageError("Failed to downcast to Float64Array".to_string())
            })?
            .clone();

        // Normalize to the canonical schema (drops any field metadata)
        let batch = RecordBatch::try_new(trace_schema(), batch.columns().to_vec())?;

        Ok(Self {
            batch,
            chain,
            step,
            loss,
        })
    }

    /// Concatenate traces in order (e.g. one trace per chain).
    ///
    /// # Errors
    ///
    /// Returns error if Arrow concatenation fails
    pub fn concat(traces: &[Self]) -> Result<Self> {
        match traces {
            [] => Ok(Self::empty()),
            [single] => Ok(single.clone()),
            _ => {
                let batch =
                    compute::concat_batches(&trace_schema(), traces.iter().map(|t| &t.batch))
                        .map_err(|e| {
                            Error::StorageError(format!("Failed to combine traces: {e}"))
                        })?;
                Self::from_record_batch(batch)
            }
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    /// Check if the trace has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Borrow the underlying record batch.
    #[must_use]
    pub const fn as_record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consume the trace, returning the underlying record batch.
    #[must_use]
    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    /// Get the record at `index`, if any.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<TraceRecord> {
        (index < self.len()).then(|| {
            TraceRecord::new(
                self.chain.value(index),
                self.step.value(index),
                self.loss.value(index),
            )
        })
    }

    /// Iterate over all records in storage order.
    pub fn records(&self) -> impl Iterator<Item = TraceRecord> + '_ {
        self.chain
            .values()
            .iter()
            .zip(self.step.values().iter())
            .zip(self.loss.values().iter())
            .map(|((&chain, &step), &loss)| TraceRecord::new(chain, step, loss))
    }

    /// Records of one chain, in storage order.
    #[must_use]
    pub fn chain_records(&self, chain: u32) -> Vec<TraceRecord> {
        self.records().filter(|r| r.chain == chain).collect()
    }

    /// Distinct chain ids, ascending.
    #[must_use]
    pub fn chain_ids(&self) -> Vec<u32> {
        self.chain
            .values()
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct chains present.
    #[must_use]
    pub fn num_chains(&self) -> usize {
        self.chain_ids().len()
    }

    /// Verify every loss is finite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteLoss`] for the first NaN or infinite loss
    pub fn check_finite(&self) -> Result<()> {
        match self.records().find(|r| !r.loss.is_finite()) {
            Some(r) => Err(Error::NonFiniteLoss {
                chain: r.chain,
                step: r.step,
            }),
            None => Ok(()),
        }
    }
}

impl PartialEq for Trace {
    fn eq(&self, other: &Self) -> bool {
        self.batch == other.batch
    }
}
