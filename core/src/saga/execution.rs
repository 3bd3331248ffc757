// storefront-saga/src/saga/execution.rs

use crate::core::context::StepContext;
use crate::core::control::{Flow, Outcome};
use crate::core::step::StepSpec;
use crate::error::SagaError;
use crate::saga::definition::Saga;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

const PHASES: [&str; 3] = ["before", "on", "after"];

impl<TData, E> Saga<TData, E>
where
  TData: 'static + Send + Sync,
  E: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Runs every step in declaration order against `ctx`.
  ///
  /// A hook error stops the run and is returned unchanged. A step that exceeds
  /// its timeout fails with `SagaError::StepTimedOut`, converted into `E`.
  #[instrument(
    name = "Saga::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx: StepContext<TData>) -> Result<Outcome, E> {
    for (step_index, spec) in self.steps.iter().enumerate() {
      if self.hook_count(&spec.name) == 0 {
        if spec.optional {
          debug!(step_name = %spec.name, "Optional step has no hooks, skipping.");
          continue;
        }
        error!(step_name = %spec.name, "Mandatory step has no hooks.");
        return Err(E::from(SagaError::HandlerMissing {
          step_name: spec.name.clone(),
        }));
      }

      let span = info_span!("saga_step", step_name = %spec.name, step_index, optional = spec.optional);
      if self.run_step(spec, &ctx).instrument(span).await? == Flow::Halt {
        info!(step_name = %spec.name, "Saga halted.");
        return Ok(Outcome::Halted);
      }
    }

    debug!("Saga completed.");
    Ok(Outcome::Completed)
  }

  async fn run_step(&self, spec: &StepSpec, ctx: &StepContext<TData>) -> Result<Flow, E> {
    for (phase, table) in PHASES.iter().zip([&self.before, &self.on, &self.after]) {
      let Some(hooks) = table.get(&spec.name) else {
        continue;
      };
      for (hook_index, hook) in hooks.iter().enumerate() {
        let fut = hook(ctx.clone());
        let result = match spec.timeout {
          Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_elapsed) => {
              warn!(phase, hook_index, timeout = ?limit, "Hook exceeded step timeout.");
              return Err(E::from(SagaError::StepTimedOut {
                step_name: spec.name.clone(),
                timeout: limit,
              }));
            }
          },
          None => fut.await,
        };

        match result {
          Ok(Flow::Continue) => {}
          Ok(Flow::Halt) => {
            debug!(phase, hook_index, "Hook requested halt.");
            return Ok(Flow::Halt);
          }
          Err(e) => {
            error!(phase, hook_index, error = %e, "Hook failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(Flow::Continue)
  }
}
