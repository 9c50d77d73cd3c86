//! Pipeline orchestrator.
//!
//! Drives one run through extraction, fact building, RFM segmentation and the
//! final merge, tracking progress on an explicit state machine:
//!
//! ```text
//! Idle -> Extracting -> Enriching -> Segmenting -> Merging -> Done
//!   \________\______________\___________\
//!                                         -> Failed
//! ```
//!
//! A run is all-or-nothing: the caller gets either a complete
//! [`EnrichedSales`] or an error, never a partial table.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::NaiveDateTime;
use sales_extract::TableSource;
use serde::Serialize;
use tracing::{error, info};

use crate::cache::TtlCache;
use crate::config::EtlConfig;
use crate::error::EtlError;
use crate::fact::{DataQualityReport, KeyPolicy, build_sales_facts};
use crate::models::fact::{EnrichedSalesLine, SalesFactLine};
use crate::models::raw::RawTables;
use crate::rfm::{self, CustomerSegment};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineState {
    /// Not started (or reset).
    Idle,
    /// Fetching the raw tables.
    Extracting,
    /// Building the sales fact table.
    Enriching,
    /// Scoring and segmenting customers.
    Segmenting,
    /// Attaching segments to sales lines.
    Merging,
    /// Finished successfully.
    Done,
    /// Aborted by an error.
    Failed,
}

impl PipelineState {
    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Extracting)
                | (Extracting, Enriching)
                | (Enriching, Segmenting)
                | (Segmenting, Merging)
                | (Merging, Done)
                | (Idle | Extracting | Enriching | Segmenting, Failed)
                | (Done | Failed, Idle)
        )
    }

    /// `Done` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// Knobs for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Duplicate-key handling in the fact builder joins.
    pub key_policy: KeyPolicy,
}

/// The product of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedSales {
    /// One row per sales line, in fact-table order, with `Segment` attached.
    pub lines: Vec<EnrichedSalesLine>,
    /// Reference date the recency scores were measured from.
    pub snapshot_date: NaiveDateTime,
    /// Data-quality findings from the fact builder.
    pub report: DataQualityReport,
}

/// A reusable orchestrator. Each [`Pipeline::run`] starts from `Idle`.
#[derive(Debug)]
pub struct Pipeline {
    options: PipelineOptions,
    state: PipelineState,
    trail: Vec<PipelineState>,
    failed_in: Option<PipelineState>,
}

impl Pipeline {
    /// A pipeline in the `Idle` state.
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            state: PipelineState::Idle,
            trail: vec![PipelineState::Idle],
            failed_in: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state visited by the latest run, starting at `Idle`.
    pub fn trail(&self) -> &[PipelineState] {
        &self.trail
    }

    /// The stage that was active when the latest run failed.
    pub fn failed_in(&self) -> Option<PipelineState> {
        self.failed_in
    }

    /// Move to `next`, or refuse if the state machine has no such edge.
    pub fn advance(&mut self, next: PipelineState) -> Result<(), EtlError> {
        if !self.state.can_transition_to(next) {
            return Err(EtlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        info!(from = ?self.state, to = ?next, "pipeline transition");
        self.state = next;
        self.trail.push(next);
        Ok(())
    }

    fn reset(&mut self) {
        self.state = PipelineState::Idle;
        self.trail = vec![PipelineState::Idle];
        self.failed_in = None;
    }

    /// Run every stage against `source`.
    ///
    /// On error the pipeline ends in `Failed` (remembering the stage in
    /// [`Pipeline::failed_in`]) and the error is returned unchanged.
    pub fn run(&mut self, source: &dyn TableSource) -> Result<EnrichedSales, EtlError> {
        self.reset();
        info!(source = %source.describe(), "pipeline run starting");

        match self.run_stages(source) {
            Ok(out) => {
                info!(
                    lines = out.lines.len(),
                    snapshot = %out.snapshot_date,
                    "pipeline run complete"
                );
                Ok(out)
            }
            Err(e) => {
                let stage = self.state;
                self.failed_in = Some(stage);
                if self.state.can_transition_to(PipelineState::Failed) {
                    self.state = PipelineState::Failed;
                    self.trail.push(PipelineState::Failed);
                }
                error!(stage = ?stage, kind = ?e.kind(), error = %e, "pipeline run failed");
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, source: &dyn TableSource) -> Result<EnrichedSales, EtlError> {
        self.advance(PipelineState::Extracting)?;
        let raw = RawTables::extract(source)?;

        self.advance(PipelineState::Enriching)?;
        let facts = build_sales_facts(&raw, self.options.key_policy)?;

        self.advance(PipelineState::Segmenting)?;
        let analysis = rfm::score_customers(&facts.lines)?;

        self.advance(PipelineState::Merging)?;
        let lines = merge_segments(facts.lines, &analysis.segments());

        self.advance(PipelineState::Done)?;
        Ok(EnrichedSales {
            lines,
            snapshot_date: analysis.snapshot_date,
            report: facts.report,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

/// Left-join `segments` onto `lines` by customer.
///
/// Row count and order are preserved; lines whose customer was not scored
/// get no segment.
pub fn merge_segments(
    lines: Vec<SalesFactLine>,
    segments: &[CustomerSegment],
) -> Vec<EnrichedSalesLine> {
    let by_customer: HashMap<&str, rfm::Segment> = segments
        .iter()
        .map(|s| (s.customer_id.as_str(), s.segment))
        .collect();

    lines
        .into_iter()
        .map(|fact| {
            let segment = fact
                .customer_id
                .as_deref()
                .and_then(|id| by_customer.get(id).copied());
            EnrichedSalesLine { fact, segment }
        })
        .collect()
}

/// One-shot run with a fresh [`Pipeline`].
pub fn run_pipeline(
    source: &dyn TableSource,
    options: PipelineOptions,
) -> Result<EnrichedSales, EtlError> {
    Pipeline::new(options).run(source)
}

/// A source paired with a [`TtlCache`] of its pipeline output.
///
/// Repeated [`CachedPipeline::get`] calls within the TTL return the same
/// [`Arc`] without touching the source.
pub struct CachedPipeline<S> {
    source: S,
    options: PipelineOptions,
    cache: TtlCache<EnrichedSales>,
}

impl<S: TableSource> CachedPipeline<S> {
    /// Wrap `source`, caching results for `ttl`.
    pub fn new(source: S, options: PipelineOptions, ttl: Duration) -> Self {
        Self {
            source,
            options,
            cache: TtlCache::new(ttl),
        }
    }

    /// Wrap `source` with the join options and `[cache] ttl_secs` of `config`.
    pub fn from_config(source: S, config: &EtlConfig) -> Self {
        Self::new(source, config.pipeline_options(), config.cache.ttl())
    }

    /// How long a result stays fresh.
    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// The enriched table, from cache when fresh.
    pub fn get(&self) -> Result<Arc<EnrichedSales>, EtlError> {
        self.cache
            .get_or_try_refresh(|| run_pipeline(&self.source, self.options))
    }

    /// Forget the cached table so the next [`CachedPipeline::get`] re-runs.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }
}
