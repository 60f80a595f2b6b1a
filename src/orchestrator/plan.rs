// ABOUTME: Start planner: which processes a start touches in one domain.
// ABOUTME: Non-workers, uncolored workers, and the active (or requested) color of each pair.

use crate::process_state::{DomainSnapshot, ProcessStateStore, RollingGroupKey};
use crate::rolling::ActiveColorStore;
use crate::types::Color;

/// Names to start, in listing order, plus requested names the domain lacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartPlan {
    pub names: Vec<String>,
    pub unknown: Vec<String>,
}

/// Plan a start.
///
/// Explicit `processes` are started exactly as given. Otherwise every
/// non-worker and every worker without a trustworthy color suffix is
/// started, and for each rolling pair only the member whose color is
/// `state`, or the persisted active color when `state` is `None`. A pair
/// with one member present starts that member unless `state` names the
/// other color.
pub fn plan_start(
    snapshot: &DomainSnapshot,
    states: &ProcessStateStore,
    store: &ActiveColorStore,
    processes: Option<&[String]>,
    state: Option<&Color>,
) -> StartPlan {
    let mut plan = StartPlan::default();

    if let Some(requested) = processes {
        for name in requested {
            match snapshot.find(name) {
                Some(p) => plan.names.push(p.api_name()),
                None => plan.unknown.push(name.clone()),
            }
        }
        return plan;
    }

    for process in snapshot.processes() {
        if !snapshot.is_worker(process) {
            plan.names.push(process.api_name());
            continue;
        }

        let parsed = states.parse(&process.name);
        let Some(color) = parsed.color.clone().filter(|_| !parsed.ambiguous) else {
            plan.names.push(process.api_name());
            continue;
        };

        let key = RollingGroupKey::new(parsed.base, parsed.index);
        let wanted = match state {
            Some(requested) => requested.clone(),
            None => {
                let complete = snapshot
                    .groups()
                    .get(&key)
                    .is_some_and(|pair| pair.is_complete(states.colors()));
                if !complete {
                    plan.names.push(process.api_name());
                    continue;
                }
                store.active(&key)
            }
        };

        if color == wanted {
            plan.names.push(process.api_name());
        } else {
            tracing::debug!(process = %process.name, active = %wanted, "skipping inactive color");
        }
    }

    plan
}
