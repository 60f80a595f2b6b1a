// ABOUTME: Point-in-time view of one domain's processes.
// ABOUTME: Combines the raw descriptors with worker classification and rolling groups.

use crate::supervisor::{ProcessDescriptor, SupervisorError, SupervisorOps};
use crate::types::ColorPair;

use super::classify::WorkerMatcher;
use super::groups::RollingGroups;
use super::naming::{RollingName, parse_rolling_name};

/// Reads and classifies process state for a domain.
#[derive(Debug, Clone, Default)]
pub struct ProcessStateStore {
    matcher: WorkerMatcher,
    colors: ColorPair,
}

impl ProcessStateStore {
    pub fn new(matcher: WorkerMatcher, colors: ColorPair) -> Self {
        Self { matcher, colors }
    }

    pub fn matcher(&self) -> &WorkerMatcher {
        &self.matcher
    }

    pub fn colors(&self) -> &ColorPair {
        &self.colors
    }

    pub fn is_worker(&self, name: &str) -> bool {
        self.matcher.is_worker(name)
    }

    pub fn parse(&self, name: &str) -> RollingName {
        parse_rolling_name(name, &self.colors)
    }

    pub async fn snapshot(&self, ops: &dyn SupervisorOps) -> Result<DomainSnapshot, SupervisorError> {
        let processes = ops.list_processes().await?;
        Ok(self.classify(processes))
    }

    pub fn classify(&self, processes: Vec<ProcessDescriptor>) -> DomainSnapshot {
        let groups = RollingGroups::from_processes(&processes, &self.matcher, &self.colors);
        DomainSnapshot {
            processes,
            groups,
            matcher: self.matcher.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DomainSnapshot {
    processes: Vec<ProcessDescriptor>,
    groups: RollingGroups,
    matcher: WorkerMatcher,
}

impl DomainSnapshot {
    pub fn processes(&self) -> &[ProcessDescriptor] {
        &self.processes
    }

    pub fn groups(&self) -> &RollingGroups {
        &self.groups
    }

    /// Look up by bare name or `group:name`.
    pub fn find(&self, name: &str) -> Option<&ProcessDescriptor> {
        self.processes
            .iter()
            .find(|p| p.name == name || p.api_name() == name)
    }

    pub fn is_worker(&self, process: &ProcessDescriptor) -> bool {
        self.matcher.is_worker(&process.name)
    }

    pub fn workers(&self) -> impl Iterator<Item = &ProcessDescriptor> {
        self.processes.iter().filter(|p| self.is_worker(p))
    }

    pub fn non_workers(&self) -> impl Iterator<Item = &ProcessDescriptor> {
        self.processes.iter().filter(|p| !self.is_worker(p))
    }

    /// Worker processes that belong to a rolling group.
    pub fn is_rolling_member(&self, process: &ProcessDescriptor) -> bool {
        self.groups.locate(&process.api_name()).is_some()
    }
}
