//! Sequential command execution.

use super::{CommandOutcome, CommandRecord, PipelineReport};
use crate::commands::SharedCommand;
use crate::context::Context;
use crate::errors::CommandError;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// Runs `commands` in order against `ctx`.
///
/// A command that records an error does not stop the run; later commands
/// still execute and typically record `MissingKey` for outputs that were
/// never written. Once the context's scope is cancelled, the remaining
/// commands are not started: each gets a `Cancelled` error under its name
/// and a `Skipped` record.
pub async fn run_commands(
    pipeline: &str,
    commands: &[SharedCommand],
    ctx: &mut Context,
) -> PipelineReport {
    let start = Instant::now();
    let run_id = ctx.run_identity().pipeline_run_id;
    let mut records = Vec::with_capacity(commands.len());
    let mut cancelled = false;

    info!(pipeline, run_id = %run_id, commands = commands.len(), "Pipeline started");

    for command in commands {
        let name = command.name();

        if ctx.scope().is_cancelled() {
            let reason = ctx
                .scope()
                .reason()
                .unwrap_or_else(|| "cancelled".to_string());
            warn!(pipeline, command = name, reason = %reason, "Command skipped");
            ctx.add_error(name, CommandError::cancelled(reason));
            records.push(CommandRecord {
                command: name.to_string(),
                outcome: CommandOutcome::Skipped,
                duration_ms: 0.0,
            });
            cancelled = true;
            continue;
        }

        let errors_before = ctx.errors_for(name).len();
        let span = info_span!("command", pipeline, command = name, run_id = %run_id);
        let command_start = Instant::now();

        command.execute(ctx).instrument(span).await;

        let duration_ms = command_start.elapsed().as_secs_f64() * 1000.0;
        let outcome = if ctx.errors_for(name).len() > errors_before {
            CommandOutcome::Failed
        } else {
            CommandOutcome::Succeeded
        };
        info!(pipeline, command = name, %outcome, duration_ms, "Command finished");

        records.push(CommandRecord {
            command: name.to_string(),
            outcome,
            duration_ms,
        });
    }

    let report = PipelineReport {
        pipeline: pipeline.to_string(),
        run_id,
        records,
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        cancelled,
    };

    if ctx.has_errors() {
        warn!(
            pipeline,
            run_id = %run_id,
            errors = ctx.error_count(),
            duration_ms = report.duration_ms,
            "Pipeline finished with errors"
        );
    } else {
        info!(
            pipeline,
            run_id = %run_id,
            duration_ms = report.duration_ms,
            "Pipeline finished"
        );
    }

    report
}
