// ABOUTME: Groups colored worker instances into rolling pairs keyed by base name and index.
// ABOUTME: Shape is {base: {index: {color: full name}}}; ambiguous names are kept aside.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::classify::WorkerMatcher;
use super::naming::{DEFAULT_INDEX, parse_rolling_name};
use crate::supervisor::ProcessDescriptor;
use crate::types::{Color, ColorPair};

/// Identity of one rolling pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RollingGroupKey {
    pub base: String,
    pub index: u32,
}

impl RollingGroupKey {
    pub fn new(base: impl Into<String>, index: u32) -> Self {
        Self {
            base: base.into(),
            index,
        }
    }
}

impl fmt::Display for RollingGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == DEFAULT_INDEX {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}#{}", self.base, self.index)
        }
    }
}

/// Members of one rolling group, by color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingPair {
    pub key: RollingGroupKey,
    pub members: BTreeMap<Color, String>,
}

impl RollingPair {
    /// Both configured colors are present.
    pub fn is_complete(&self, colors: &ColorPair) -> bool {
        colors.iter().all(|c| self.members.contains_key(c))
    }

    pub fn member(&self, color: &Color) -> Option<&str> {
        self.members.get(color).map(String::as_str)
    }
}

type GroupMap = BTreeMap<String, BTreeMap<u32, BTreeMap<Color, String>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollingGroups {
    groups: GroupMap,
    ambiguous: Vec<String>,
}

impl RollingGroups {
    /// Group every worker name that carries a color suffix.
    pub fn from_names<'a, I>(names: I, matcher: &WorkerMatcher, colors: &ColorPair) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out = RollingGroups::default();
        for name in names {
            out.insert(name, name.to_string(), matcher, colors);
        }
        out
    }

    /// Group processes by their bare name; members are recorded by the
    /// name the endpoint expects (`group:name`).
    pub fn from_processes(
        processes: &[ProcessDescriptor],
        matcher: &WorkerMatcher,
        colors: &ColorPair,
    ) -> Self {
        let mut out = RollingGroups::default();
        for p in processes {
            out.insert(&p.name, p.api_name(), matcher, colors);
        }
        out
    }

    fn insert(&mut self, name: &str, address: String, matcher: &WorkerMatcher, colors: &ColorPair) {
        if !matcher.is_worker(name) {
            return;
        }
        let parsed = parse_rolling_name(name, colors);
        let Some(color) = parsed.color.clone() else {
            return;
        };
        if parsed.ambiguous {
            self.ambiguous.push(address);
            return;
        }
        self.groups
            .entry(parsed.base)
            .or_default()
            .entry(parsed.index)
            .or_default()
            .insert(color, address);
    }

    pub fn as_map(&self) -> &GroupMap {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Worker names whose color suffix could not be parsed unambiguously.
    pub fn ambiguous(&self) -> &[String] {
        &self.ambiguous
    }

    pub fn get(&self, key: &RollingGroupKey) -> Option<RollingPair> {
        self.groups
            .get(&key.base)
            .and_then(|by_index| by_index.get(&key.index))
            .map(|members| RollingPair {
                key: key.clone(),
                members: members.clone(),
            })
    }

    /// All pairs, ordered by base name then index.
    pub fn pairs(&self) -> Vec<RollingPair> {
        self.groups
            .iter()
            .flat_map(|(base, by_index)| {
                by_index.iter().map(move |(index, members)| RollingPair {
                    key: RollingGroupKey::new(base.clone(), *index),
                    members: members.clone(),
                })
            })
            .collect()
    }

    /// Find the group and color a member address belongs to.
    pub fn locate(&self, name: &str) -> Option<(RollingGroupKey, Color)> {
        self.groups.iter().find_map(|(base, by_index)| {
            by_index.iter().find_map(|(index, members)| {
                members
                    .iter()
                    .find(|(_, member)| member.as_str() == name)
                    .map(|(color, _)| (RollingGroupKey::new(base.clone(), *index), color.clone()))
            })
        })
    }
}
