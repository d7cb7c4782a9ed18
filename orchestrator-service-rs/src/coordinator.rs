// orchestrator-service-rs/src/coordinator.rs
// Execution Coordinator: fan a ToolPlan out to the adapters and fan back in
//
// Every request in the plan becomes one task in a JoinSet, each wrapped in
// its own per-adapter timeout. A single plan-wide deadline bounds the
// fan-in: tasks still running when it expires are aborted and recorded as
// DeadlineExceeded, unless their own timeout had already run out, in which
// case they count as Timeout. Whatever happens, the returned EvidenceSet
// holds exactly one result per request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use config_rs::OrchestratorConfig;
use shared_types::{AdapterId, EvidenceResult, EvidenceSet, FailureKind, ToolParams, ToolPlan};
use tokio::task::{Id, JoinSet};
use tool_sdk::{AdapterRegistry, EvidenceAdapter};

pub struct ExecutionCoordinator {
    registry: Arc<AdapterRegistry>,
    config: Arc<OrchestratorConfig>,
}

impl ExecutionCoordinator {
    pub fn new(registry: Arc<AdapterRegistry>, config: &OrchestratorConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config.clone()),
        }
    }

    /// Run every request in `plan` concurrently and collect one result per
    /// request, in completion order.
    pub async fn execute(&self, plan: &ToolPlan, deadline: Duration) -> EvidenceSet {
        let started = Instant::now();
        let deadline_at = tokio::time::Instant::now() + deadline;

        let mut evidence = EvidenceSet::new();
        let mut tasks = JoinSet::new();
        // Dispatched but not yet collected, in plan order.
        let mut pending: Vec<(Id, AdapterId, Duration)> = Vec::with_capacity(plan.len());

        for request in plan.iter() {
            let id = request.adapter;
            let Some(adapter) = self.registry.get(id) else {
                log::warn!("No adapter registered for {}", id);
                evidence.push(EvidenceResult::failed(
                    id,
                    FailureKind::Unavailable,
                    format!("no adapter registered for {}", id),
                    Duration::ZERO,
                ));
                continue;
            };

            let timeout = self.config.timeout_for(id);
            let params = request.params.clone();
            let handle = tasks.spawn(invoke(id, adapter, params, timeout));
            pending.push((handle.id(), id, timeout));
        }

        log::debug!(
            "Dispatched {} adapter invocations (deadline {}ms)",
            pending.len(),
            deadline.as_millis()
        );

        loop {
            let next = tokio::time::timeout_at(deadline_at, tasks.join_next_with_id()).await;
            match next {
                Ok(Some(Ok((task_id, result)))) => {
                    pending.retain(|(id, _, _)| *id != task_id);
                    evidence.push(result);
                }
                Ok(Some(Err(join_err))) => {
                    let task_id = join_err.id();
                    let Some(pos) = pending.iter().position(|(id, _, _)| *id == task_id) else {
                        continue;
                    };
                    let (_, adapter, _) = pending.remove(pos);
                    let reason = if join_err.is_panic() {
                        "adapter panicked".to_string()
                    } else {
                        format!("adapter task failed: {}", join_err)
                    };
                    log::error!("{} invocation aborted: {}", adapter, reason);
                    evidence.push(EvidenceResult::failed(
                        adapter,
                        FailureKind::Adapter,
                        reason,
                        started.elapsed(),
                    ));
                }
                Ok(None) => break,
                Err(_) => {
                    log::warn!(
                        "Evidence deadline of {}ms expired with {} invocation(s) pending",
                        deadline.as_millis(),
                        pending.len()
                    );
                    tasks.abort_all();
                    let elapsed = started.elapsed();
                    for (_, adapter, timeout) in pending.drain(..) {
                        evidence.push(overdue(adapter, timeout, deadline, elapsed));
                    }
                    break;
                }
            }
        }

        // Aborted tasks are dropped with the set; nothing outlives the call.
        drop(tasks);

        log::info!(
            "Evidence gathered in {}ms: {} succeeded, {} failed",
            started.elapsed().as_millis(),
            evidence.success_count(),
            evidence.failed_count()
        );
        evidence
    }
}

/// Result for an invocation still pending when the deadline fired. Its own
/// timeout started at dispatch, so one that is no longer than the time spent
/// had already expired.
fn overdue(adapter: AdapterId, timeout: Duration, deadline: Duration, elapsed: Duration) -> EvidenceResult {
    if timeout <= elapsed {
        EvidenceResult::failed(
            adapter,
            FailureKind::Timeout,
            format!("timed out after {}ms", timeout.as_millis()),
            elapsed,
        )
    } else {
        EvidenceResult::failed(
            adapter,
            FailureKind::DeadlineExceeded,
            format!("deadline of {}ms exceeded", deadline.as_millis()),
            elapsed,
        )
    }
}

async fn invoke(
    id: AdapterId,
    adapter: Arc<dyn EvidenceAdapter>,
    params: ToolParams,
    timeout: Duration,
) -> EvidenceResult {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, adapter.query(&params, timeout)).await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(payload)) => {
            log::debug!("{} succeeded in {}ms", id, elapsed.as_millis());
            EvidenceResult::succeeded(id, payload, elapsed)
        }
        Ok(Err(err)) => {
            if err.is_transient() {
                log::warn!("{} failed after {}ms: {}", id, elapsed.as_millis(), err);
            } else {
                log::error!("{} failed after {}ms: {}", id, elapsed.as_millis(), err);
            }
            let kind = if err.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::Adapter
            };
            EvidenceResult::failed(id, kind, err.to_string(), elapsed)
        }
        Err(_) => {
            log::warn!("{} timed out after {}ms", id, timeout.as_millis());
            EvidenceResult::failed(
                id,
                FailureKind::Timeout,
                format!("timed out after {}ms", timeout.as_millis()),
                elapsed,
            )
        }
    }
}
