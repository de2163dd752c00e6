//! Trace visualization
//!
//! Groups a trace into one loss-vs-step series per chain and hands the
//! figure to a [`TraceRenderer`]. The crate ships [`JsonRenderer`] for
//! headless use; plotting front-ends implement the trait themselves.

use crate::trace::Trace;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Figure title
pub const TRACE_TITLE: &str = "Learning Coefficient Trace";
/// X axis label
pub const STEP_LABEL: &str = "Step";
/// Y axis label
pub const LOSS_LABEL: &str = "L_n(w)";

/// Free-form styling options forwarded to every series (e.g. `"alpha"`,
/// `"linewidth"`).
pub type PlotStyle = BTreeMap<String, serde_json::Value>;

/// Loss curve of one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSeries {
    /// Legend label, `"Chain <id>"`
    pub label: String,
    /// Chain id
    pub chain: u32,
    /// Step of each point
    pub steps: Vec<u64>,
    /// Loss of each point
    pub losses: Vec<f64>,
}

/// All chains of a trace on one shared figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFigure {
    /// Figure title
    pub title: String,
    /// X axis label
    pub x_label: String,
    /// Y axis label
    pub y_label: String,
    /// One series per chain, ordered by chain id
    pub series: Vec<ChainSeries>,
    /// Styling applied to every series
    pub style: PlotStyle,
}

impl TraceFigure {
    /// Group a trace by chain.
    #[must_use]
    pub fn from_trace(trace: &Trace, style: &PlotStyle) -> Self {
        let mut by_chain: BTreeMap<u32, ChainSeries> = BTreeMap::new();
        for record in trace.records() {
            let series = by_chain
                .entry(record.chain())
                .or_insert_with(|| ChainSeries {
                    label: format!("Chain {}", record.chain()),
                    chain: record.chain(),
                    steps: Vec::new(),
                    losses: Vec::new(),
                });
            series.steps.push(record.step());
            series.losses.push(record.loss());
        }

        Self {
            title: TRACE_TITLE.to_string(),
            x_label: STEP_LABEL.to_string(),
            y_label: LOSS_LABEL.to_string(),
            series: by_chain.into_values().collect(),
            style: style.clone(),
        }
    }
}

/// Rendering backend for trace figures.
pub trait TraceRenderer {
    /// Render a figure.
    ///
    /// # Errors
    ///
    /// Backend-specific rendering failure
    fn render(&mut self, figure: &TraceFigure) -> Result<()>;
}

/// Writes figures as JSON, one document per render call.
#[derive(Debug)]
pub struct JsonRenderer<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonRenderer<W> {
    /// Compact JSON renderer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    /// Pretty-printed JSON renderer.
    pub const fn pretty(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceRenderer for JsonRenderer<W> {
    fn render(&mut self, figure: &TraceFigure) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, figure)?;
        } else {
            serde_json::to_writer(&mut self.writer, figure)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Plot loss against step for every chain of `trace`.
///
/// # Errors
///
/// Propagates the renderer's failure
pub fn plot_learning_coeff_trace<R: TraceRenderer + ?Sized>(
    trace: &Trace,
    style: &PlotStyle,
    renderer: &mut R,
) -> Result<()> {
    let figure = TraceFigure::from_trace(trace, style);
    tracing::debug!(series = figure.series.len(), "rendering trace figure");
    renderer.render(&figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceRecord;

    fn trace() -> Trace {
        Trace::from_records(vec![
            TraceRecord::new(1, 0, 3.0),
            TraceRecord::new(0, 0, 1.0),
            TraceRecord::new(1, 1, 2.5),
            TraceRecord::new(0, 1, 0.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_figure_groups_by_chain() {
        let figure = TraceFigure::from_trace(&trace(), &PlotStyle::new());
        assert_eq!(figure.title, TRACE_TITLE);
        assert_eq!(figure.x_label, "Step");
        assert_eq!(figure.series.len(), 2);
        assert_eq!(figure.series[0].label, "Chain 0");
        assert_eq!(figure.series[0].steps, vec![0, 1]);
        assert_eq!(figure.series[0].losses, vec![1.0, 0.5]);
        assert_eq!(figure.series[1].label, "Chain 1");
    }

    #[test]
    fn test_json_renderer_output() {
        let mut style = PlotStyle::new();
        style.insert("alpha".to_string(), serde_json::json!(0.5));

        let mut renderer = JsonRenderer::new(Vec::new());
        plot_learning_coeff_trace(&trace(), &style, &mut renderer).unwrap();

        let bytes = renderer.into_inner();
        let figure: TraceFigure = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(figure.series.len(), 2);
        assert_eq!(figure.style["alpha"], serde_json::json!(0.5));
    }

    #[test]
    fn test_empty_trace_has_no_series() {
        let figure = TraceFigure::from_trace(&Trace::empty(), &PlotStyle::new());
        assert!(figure.series.is_empty());
    }
}
