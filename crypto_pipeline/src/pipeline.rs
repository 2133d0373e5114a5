use crate::{
    context::CryptoContext,
    error::{Error, StepFailure},
    model::Direction,
};

/// One unit of the pipeline: performs exactly one external transformation and
/// advances the context's current-file pointer.
///
/// A step reads `context.input_file_name()`, invokes its collaborator, and on
/// success registers the consumed file as a temp file and points
/// `last_file_name` at the file it produced. On failure it returns the cause;
/// the processor tags it with the step's name. Steps never clean up after
/// themselves, cleanup is deferred to context disposal.
#[async_trait::async_trait]
pub trait PipelineStep: Send + Sync {
    /// Name of the logical operation, used to tag failures.
    fn name(&self) -> &'static str;

    /// Execute the step, mutating the context.
    async fn execute(&self, context: &mut CryptoContext) -> Result<(), StepFailure>;
}

/// Accumulates the ordered step lists for both directions.
///
/// Steps are executed in the order they were added. `build` consumes the
/// builder, so an already-built processor can never be affected afterward.
pub struct ProcessorBuilder {
    outbound_line: Vec<Box<dyn PipelineStep>>,
    inbound_line: Vec<Box<dyn PipelineStep>>,
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        Self {
            outbound_line: Vec::new(),
            inbound_line: Vec::new(),
        }
    }

    /// Appends a step to the outbound line.
    pub fn add_outbound_step(&mut self, step: Box<dyn PipelineStep>) {
        self.outbound_line.push(step);
    }

    /// Appends a step to the inbound line.
    pub fn add_inbound_step(&mut self, step: Box<dyn PipelineStep>) {
        self.inbound_line.push(step);
    }

    pub fn build(self) -> CryptoProcessor {
        CryptoProcessor {
            outbound_line: self.outbound_line,
            inbound_line: self.inbound_line,
        }
    }
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the two immutable ordered step lists and executes the one matching a
/// context's direction.
pub struct CryptoProcessor {
    outbound_line: Vec<Box<dyn PipelineStep>>,
    inbound_line: Vec<Box<dyn PipelineStep>>,
}

impl CryptoProcessor {
    /// Runs the step list matching `context.direction` sequentially.
    ///
    /// Each step fully completes before the next starts. The first failing
    /// step aborts the rest; its failure surfaces tagged with the step's
    /// name. There is no retry at this layer.
    pub async fn execute(&self, context: &mut CryptoContext) -> Result<(), Error> {
        let steps = match context.direction {
            Direction::Outbound => &self.outbound_line,
            Direction::Inbound => &self.inbound_line,
        };

        for step in steps {
            tracing::info!("Executing step: {}", step.name());
            if let Err(cause) = step.execute(context).await {
                tracing::error!("Step {} failed: {}", step.name(), cause);
                return Err(Error::new(step.name(), cause));
            }
        }

        Ok(())
    }
}
