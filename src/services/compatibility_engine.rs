// src/services/compatibility_engine.rs
//
// Compatibility Engine
//
// Recomputes the whole compatibility report whenever the build changes.
//
// CRITICAL RULES:
// - One lookup per rule whose two slots are filled; no incremental merge
// - A failed lookup becomes a "Check failed" verdict, never an error
// - A result is applied only if its generation is still the latest
// - No cancellation: superseded lookups run to completion and are dropped

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::domain::{
    default_rules, BuildSnapshot, CompatibilityReport, CompatibilityRule, CompatibilityVerdict,
    ComponentRef, Generation, RuleVerdict,
};
use crate::events::{BuildConfigurationChanged, CompatibilityReportUpdated, EventBus};
use crate::integrations::CatalogGateway;

#[derive(Debug)]
struct EngineState {
    /// Generation of the most recent snapshot handed to `begin`
    latest: Generation,
    report: CompatibilityReport,
}

/// Lookups for one snapshot, detached from the engine
pub struct CompatibilityJob {
    generation: Generation,
    gateway: Arc<dyn CatalogGateway>,
    checks: Vec<(CompatibilityRule, ComponentRef, ComponentRef)>,
}

/// Verdicts gathered by a job, not yet applied
#[derive(Debug, Clone)]
pub struct CompatibilityOutcome {
    pub generation: Generation,
    pub verdicts: Vec<RuleVerdict>,
}

impl CompatibilityJob {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True when no rule has both of its slots filled
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Issue every lookup concurrently and collect verdicts in rule order
    pub async fn run(self) -> CompatibilityOutcome {
        let mut lookups = JoinSet::new();

        for (index, (_, left, right)) in self.checks.iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let (left, right) = (*left, *right);
            lookups.spawn(async move {
                let verdict = match gateway.check_pair_compatibility(left, right).await {
                    Ok(message) => CompatibilityVerdict::from_message(message),
                    Err(e) => {
                        warn!(
                            "Compatibility lookup {}#{} / {}#{} failed: {}",
                            left.category, left.id, right.category, right.id, e
                        );
                        CompatibilityVerdict::check_failed(e.detail)
                    }
                };
                (index, verdict)
            });
        }

        let mut slots: Vec<Option<CompatibilityVerdict>> = vec![None; self.checks.len()];
        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, verdict)) => slots[index] = Some(verdict),
                Err(e) => warn!("Compatibility lookup task aborted: {}", e),
            }
        }

        let verdicts = self
            .checks
            .into_iter()
            .zip(slots)
            .map(|((rule, _, _), verdict)| RuleVerdict {
                rule,
                verdict: verdict.unwrap_or_else(|| CompatibilityVerdict::check_failed(None)),
            })
            .collect();

        CompatibilityOutcome {
            generation: self.generation,
            verdicts,
        }
    }
}

/// Keeps the compatibility report in step with the build
///
/// Cheap to clone; clones share the same report.
#[derive(Clone)]
pub struct CompatibilityEngine {
    gateway: Arc<dyn CatalogGateway>,
    event_bus: Arc<EventBus>,
    rules: Arc<Vec<CompatibilityRule>>,
    state: Arc<Mutex<EngineState>>,
    applied: Arc<watch::Sender<Generation>>,
}

impl CompatibilityEngine {
    pub fn new(gateway: Arc<dyn CatalogGateway>, event_bus: Arc<EventBus>) -> Self {
        Self::with_rules(gateway, event_bus, default_rules())
    }

    /// Engine checking `rules`, in the given evaluation order
    pub fn with_rules(
        gateway: Arc<dyn CatalogGateway>,
        event_bus: Arc<EventBus>,
        rules: Vec<CompatibilityRule>,
    ) -> Self {
        let (applied, _) = watch::channel(Generation::ZERO);
        Self {
            gateway,
            event_bus,
            rules: Arc::new(rules),
            state: Arc::new(Mutex::new(EngineState {
                latest: Generation::ZERO,
                report: CompatibilityReport::default(),
            })),
            applied: Arc::new(applied),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn rules(&self) -> &[CompatibilityRule] {
        &self.rules
    }

    /// Current report; pending while the latest snapshot is being checked
    pub fn report(&self) -> CompatibilityReport {
        self.lock().report.clone()
    }

    pub fn latest_generation(&self) -> Generation {
        self.lock().latest
    }

    /// Make `snapshot` the latest and prepare its lookups
    ///
    /// The report is reset to an empty pending report right away, so no
    /// verdict of an earlier snapshot remains visible.
    pub fn begin(&self, snapshot: &BuildSnapshot) -> CompatibilityJob {
        let generation = snapshot.generation;
        {
            let mut state = self.lock();
            if generation >= state.latest {
                state.latest = generation;
                state.report = CompatibilityReport::pending(generation);
            } else {
                warn!(
                    "Snapshot {} is older than {}, its report will be discarded",
                    generation, state.latest
                );
            }
        }

        let checks = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.inputs(snapshot)
                    .map(|(left, right)| (*rule, left, right))
            })
            .collect();

        CompatibilityJob {
            generation,
            gateway: Arc::clone(&self.gateway),
            checks,
        }
    }

    /// Store `outcome` if it belongs to the latest snapshot
    ///
    /// Returns false when the outcome was superseded and dropped.
    pub fn apply(&self, outcome: CompatibilityOutcome) -> bool {
        let report = {
            let mut state = self.lock();
            if !outcome.generation.is_current(state.latest) {
                debug!(
                    "Discarding stale compatibility report {} (latest {})",
                    outcome.generation, state.latest
                );
                return false;
            }
            state.report = CompatibilityReport::completed(outcome.generation, outcome.verdicts);
            state.report.clone()
        };

        self.applied.send_replace(report.generation);

        let blocking_rules = report
            .iter()
            .filter(|rv| rv.verdict.blocking)
            .map(|rv| rv.rule.key())
            .collect();
        self.event_bus.emit(CompatibilityReportUpdated::new(
            report.generation,
            report.len(),
            blocking_rules,
        ));
        true
    }

    /// Begin, run and apply on a background task
    ///
    /// A snapshot with no applicable rule is applied immediately. Returns the
    /// task handle (resolving to whether the result was applied), or None
    /// when nothing was spawned.
    pub fn trigger(&self, snapshot: &BuildSnapshot) -> Option<JoinHandle<bool>> {
        let job = self.begin(snapshot);

        if job.is_empty() {
            self.apply(CompatibilityOutcome {
                generation: job.generation(),
                verdicts: Vec::new(),
            });
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime; compatibility report {} stays pending", job.generation());
                return None;
            }
        };

        let engine = self.clone();
        Some(runtime.spawn(async move {
            let outcome = job.run().await;
            engine.apply(outcome)
        }))
    }

    /// Report of the latest snapshot, once its lookups have been applied
    pub async fn settled(&self) -> CompatibilityReport {
        let mut applied = self.applied.subscribe();
        loop {
            {
                let state = self.lock();
                if !state.report.pending && state.report.generation == state.latest {
                    return state.report.clone();
                }
            }
            if applied.changed().await.is_err() {
                return self.report();
            }
        }
    }

    /// Recompute on every build change
    pub fn register_event_handlers(&self) {
        let engine = self.clone();
        self.event_bus
            .subscribe::<BuildConfigurationChanged, _>(move |event| {
                engine.trigger(&event.snapshot);
            });
    }
}
