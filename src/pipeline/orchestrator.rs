use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, StructuralError};
use crate::ids::{IdGenerator, PromptDigestIds};
use crate::llm::{CompletionMode, TextGenerator, prompts};
use crate::outcome::Outcome;
use crate::pipeline::json::parse_payload;
use crate::pipeline::modernizer::{CodeModernizer, lint};
use crate::pipeline::recovery::JsonRecovery;
use crate::pipeline::review::SemanticReviewer;
use crate::pipeline::validator::StructuralValidator;
use crate::workflow::WorkflowGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Generating,
    Parsing,
    Recovering,
    Validating,
    Rebuilding,
    Reviewing,
    Modernizing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generating => "generating",
            Stage::Parsing => "parsing",
            Stage::Recovering => "recovering",
            Stage::Validating => "validating",
            Stage::Rebuilding => "rebuilding",
            Stage::Reviewing => "reviewing",
            Stage::Modernizing => "modernizing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One pipeline execution: every stage visited, in order, and the outcome.
#[derive(Debug)]
pub struct Run {
    pub stages: Vec<Stage>,
    pub result: Result<WorkflowGraph, PipelineError>,
}

/// Per-request state; each variant owns what the next stage consumes.
enum State {
    Generating,
    Parsing(String),
    Recovering(String),
    Validating(Value),
    Rebuilding(StructuralError),
    Reviewing(WorkflowGraph),
    Modernizing(WorkflowGraph),
    Done(WorkflowGraph),
    Failed(PipelineError),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            State::Generating => Stage::Generating,
            State::Parsing(_) => Stage::Parsing,
            State::Recovering(_) => Stage::Recovering,
            State::Validating(_) => Stage::Validating,
            State::Rebuilding(_) => Stage::Rebuilding,
            State::Reviewing(_) => Stage::Reviewing,
            State::Modernizing(_) => Stage::Modernizing,
            State::Done(_) => Stage::Done,
            State::Failed(_) => Stage::Failed,
        }
    }
}

/// Drives a prompt through generation, recovery, validation, review and
/// modernization. Holds no per-request state and can be shared behind `Arc`.
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    validator: StructuralValidator,
    recovery: JsonRecovery,
    reviewer: SemanticReviewer,
    modernizer: CodeModernizer,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, ids: Arc<dyn IdGenerator>) -> Self {
        let recovery = JsonRecovery::new(generator.clone());
        Self {
            validator: StructuralValidator::new(generator.clone(), ids),
            reviewer: SemanticReviewer::new(generator.clone(), recovery.clone()),
            modernizer: CodeModernizer::new(generator.clone()),
            recovery,
            generator,
        }
    }

    /// Orchestrator with prompt-derived workflow ids.
    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self::new(generator, Arc::new(PromptDigestIds))
    }

    pub async fn generate(&self, prompt: &str) -> Result<WorkflowGraph, PipelineError> {
        self.run(prompt).await.result
    }

    pub async fn run(&self, prompt: &str) -> Run {
        let mut stages = Vec::new();
        let mut state = State::Generating;
        let mut rebuilt = false;
        // Why the primary call produced nothing, if it did.
        let mut primary_cause: Option<PipelineError> = None;

        loop {
            stages.push(state.stage());
            info!(stage = %state.stage(), "Pipeline stage");

            state = match state {
                State::Generating => match self.draft(prompt).await {
                    Ok(text) => State::Parsing(text),
                    Err(cause) => {
                        primary_cause = Some(cause);
                        State::Parsing(String::new())
                    }
                },

                State::Parsing(text) => match parse_payload(&text) {
                    Ok(value) => State::Validating(value),
                    Err(e) => {
                        warn!(error = %e, "Primary response could not be parsed");
                        State::Recovering(text)
                    }
                },

                State::Recovering(text) => {
                    State::Validating(self.recovery.repair(&text).await.into_value())
                }

                State::Validating(value) => match self.validator.validate(&value, prompt).await {
                    Ok(graph) => State::Reviewing(graph),
                    Err(e) if rebuilt => State::Failed(PipelineError::fatal(e.into())),
                    Err(e) => {
                        rebuilt = true;
                        State::Rebuilding(e)
                    }
                },

                State::Rebuilding(cause) => {
                    warn!(error = %cause, "Structural validation failed, rebuilding workflow");
                    match self.rebuild(prompt).await {
                        Ok(next) => next,
                        Err(rebuild_cause) => {
                            let cause = match primary_cause.take() {
                                Some(primary) => {
                                    warn!(error = %rebuild_cause, "Rebuild produced nothing either");
                                    primary
                                }
                                None => rebuild_cause,
                            };
                            State::Failed(PipelineError::fatal(cause))
                        }
                    }
                }

                State::Reviewing(graph) => State::Modernizing(self.review_all(graph, prompt).await),

                State::Modernizing(graph) => {
                    State::Done(self.modernizer.modernize(graph, prompt).await)
                }

                State::Done(graph) => {
                    info!(workflow = %graph.name, nodes = graph.nodes.len(), "Workflow generated");
                    return Run {
                        stages,
                        result: Ok(graph),
                    };
                }

                State::Failed(e) => {
                    error!(error = %e, "Workflow generation failed");
                    return Run {
                        stages,
                        result: Err(e),
                    };
                }
            };
        }
    }

    /// Primary structured call. The error is the cause to report if the
    /// run later fails; the caller still continues with empty text.
    async fn draft(&self, prompt: &str) -> Result<String, PipelineError> {
        match self
            .generator
            .complete(prompts::GENERATE, prompt, CompletionMode::Structured)
            .await
        {
            Ok(text) if text.is_empty() => {
                warn!("Primary generation returned an empty response");
                Err(PipelineError::EmptyResponse("primary generation"))
            }
            Ok(text) => {
                debug!(bytes = text.len(), "Primary generation payload");
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "Primary generation failed");
                Err(e.into())
            }
        }
    }

    /// Next state after the rebuild call, or why it produced nothing.
    async fn rebuild(&self, prompt: &str) -> Result<State, PipelineError> {
        let text = self
            .generator
            .complete(prompts::REBUILD, prompt, CompletionMode::FreeForm)
            .await?;
        if text.is_empty() {
            return Err(PipelineError::EmptyResponse("rebuild"));
        }

        match parse_payload(&text) {
            Ok(value) => Ok(State::Validating(value)),
            Err(e) => {
                warn!(error = %e, "Rebuilt workflow is not valid JSON");
                Ok(State::Recovering(text))
            }
        }
    }

    /// One review pass, then a second one when lint still finds legacy code.
    async fn review_all(&self, graph: WorkflowGraph, prompt: &str) -> WorkflowGraph {
        let graph = self.review_pass(graph, prompt).await;

        let findings = lint(&graph);
        if findings.is_empty() {
            return graph;
        }
        for finding in &findings {
            warn!(node = %finding.node, issue = ?finding.issue, "Lint finding in code node");
        }
        self.review_pass(graph, prompt).await
    }

    async fn review_pass(&self, graph: WorkflowGraph, prompt: &str) -> WorkflowGraph {
        let mut reviewed = match self.reviewer.review(&graph, prompt).await {
            Outcome::Ok(value) => value,
            Outcome::Degraded { reason, .. } => {
                warn!(reason = %reason, "Semantic review skipped");
                return graph;
            }
        };

        // A review that leaves out the edges keeps the ones already validated.
        if let Some(fields) = reviewed.as_object_mut() {
            if !fields.contains_key("connections") {
                debug!("Review dropped connections, keeping previous edges");
                fields.insert("connections".to_string(), json!(graph.connections));
            }
        }

        match self.validator.validate(&reviewed, prompt).await {
            Ok(revised) => revised,
            Err(e) => {
                warn!(error = %e, "Reviewed workflow failed validation, keeping previous graph");
                graph
            }
        }
    }
}
