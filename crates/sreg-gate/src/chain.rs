use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use sreg_types::Model;
use sreg_view::ViewSet;

use crate::config::GateConfig;
use crate::error::{ValidationError, Violation};
use crate::schema::SchemaRegistry;
use crate::stage::{Candidate, StageDecision, StageResult, ValidationStage};
use crate::stages::{ImmutableTypeStage, ReferentialStage, SchemaStage, StructuralStage};

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

/// The outcome of running a candidate through the chain.
#[derive(Clone, Debug)]
pub struct ValidationReport {
    /// The first violation found, if any.
    pub violation: Option<Violation>,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the chain.
    pub elapsed: Duration,
}

impl ValidationReport {
    pub fn is_accepted(&self) -> bool {
        self.violation.is_none()
    }

    /// The report if accepted, the violation otherwise.
    pub fn into_result(self) -> Result<Self, Violation> {
        match self.violation {
            Some(violation) => Err(violation),
            None => Ok(self),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidatorChain
// ---------------------------------------------------------------------------

/// An ordered, fail-fast pipeline of validation stages.
///
/// One chain serves every entity type: the typed model is turned into a
/// [`Candidate`] up front and the stages only see that.
pub struct ValidatorChain {
    stages: Vec<Box<dyn ValidationStage>>,
    config: GateConfig,
}

impl ValidatorChain {
    /// An empty chain. Use [`Self::add_stage`] or
    /// [`Self::with_default_stages`].
    pub fn new(config: GateConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// The standard pipeline:
    /// Structural -> Referential -> Schema -> ImmutableType (updates only,
    /// when enabled).
    pub fn with_default_stages(
        config: GateConfig,
        views: Arc<ViewSet>,
        schemas: Arc<SchemaRegistry>,
    ) -> Self {
        let mut chain = Self::new(config);
        chain.add_stage(Box::new(StructuralStage::new(
            chain.config.max_description_len,
        )));
        chain.add_stage(Box::new(ReferentialStage::new(views)));
        chain.add_stage(Box::new(SchemaStage::new(schemas)));
        if chain.config.immutable_type {
            chain.add_stage(Box::new(ImmutableTypeStage));
        }
        chain
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn validate_for_create<M: Model>(
        &self,
        candidate: &M,
    ) -> Result<ValidationReport, ValidationError> {
        self.run(Candidate::for_create(candidate))
    }

    pub fn validate_for_update<M: Model>(
        &self,
        candidate: &M,
        existing: &M,
    ) -> Result<ValidationReport, ValidationError> {
        self.run(Candidate::for_update(candidate, existing))
    }

    /// Evaluate a prepared candidate. Stops at the first failing stage.
    pub fn run(&self, candidate: Candidate) -> Result<ValidationReport, ValidationError> {
        let chain_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in self.stages.iter().filter(|s| s.applies_to(candidate.mode)) {
            let stage_start = Instant::now();
            let decision = stage.evaluate(&candidate)?;
            let elapsed = stage_start.elapsed();

            stage_results.push(StageResult {
                stage_name: stage.name().to_string(),
                passed: decision.is_pass(),
                elapsed,
            });

            if let StageDecision::Fail(violation) = decision {
                debug!(
                    stage = stage.name(),
                    key = %candidate.entity.key,
                    %violation,
                    "candidate rejected"
                );
                return Ok(ValidationReport {
                    violation: Some(violation),
                    stage_results,
                    elapsed: chain_start.elapsed(),
                });
            }
        }

        debug!(
            key = %candidate.entity.key,
            stages = stage_results.len(),
            "candidate accepted"
        );
        Ok(ValidationReport {
            violation: None,
            stage_results,
            elapsed: chain_start.elapsed(),
        })
    }
}
