use std::collections::HashSet;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::common::error::{ArangoError, Result};

/// Host selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Single,
    RoundRobin,
    Random,
}

/// Picks the host a request is sent to
#[derive(Debug)]
pub enum HostResolver {
    Single,
    RoundRobin {
        host_count: usize,
        max_tries: usize,
        index: Mutex<Option<usize>>,
    },
    Random {
        host_count: usize,
        max_tries: usize,
    },
}

impl HostResolver {
    pub fn single() -> Self {
        HostResolver::Single
    }

    pub fn round_robin(host_count: usize, max_tries: Option<usize>) -> Result<Self> {
        let max_tries = Self::check_tries(host_count, max_tries)?;
        Ok(HostResolver::RoundRobin {
            host_count,
            max_tries,
            index: Mutex::new(None),
        })
    }

    pub fn random(host_count: usize, max_tries: Option<usize>) -> Result<Self> {
        let max_tries = Self::check_tries(host_count, max_tries)?;
        Ok(HostResolver::Random { host_count, max_tries })
    }

    pub fn from_kind(kind: ResolverKind, host_count: usize, max_tries: Option<usize>) -> Result<Self> {
        match kind {
            ResolverKind::Single => Ok(Self::single()),
            ResolverKind::RoundRobin => Self::round_robin(host_count, max_tries),
            ResolverKind::Random => Self::random(host_count, max_tries),
        }
    }

    fn check_tries(host_count: usize, max_tries: Option<usize>) -> Result<usize> {
        if host_count == 0 {
            return Err(ArangoError::Connection("at least one host is required".to_string()));
        }
        let max_tries = max_tries.unwrap_or(host_count * 3);
        if max_tries < host_count {
            return Err(ArangoError::Connection(
                "max_tries cannot be less than host_count".to_string(),
            ));
        }
        Ok(max_tries)
    }

    pub fn host_count(&self) -> usize {
        match self {
            HostResolver::Single => 1,
            HostResolver::RoundRobin { host_count, .. } => *host_count,
            HostResolver::Random { host_count, .. } => *host_count,
        }
    }

    pub fn max_tries(&self) -> usize {
        match self {
            HostResolver::Single => 3,
            HostResolver::RoundRobin { max_tries, .. } => *max_tries,
            HostResolver::Random { max_tries, .. } => *max_tries,
        }
    }

    /// Return the next host index, avoiding indexes in `filter` where possible
    pub fn get_host_index(&self, filter: &HashSet<usize>) -> usize {
        match self {
            HostResolver::Single => 0,
            HostResolver::RoundRobin { host_count, index, .. } => {
                let mut index = index.lock();
                let next = index.map_or(0, |i| (i + 1) % host_count);
                *index = Some(next);
                next
            }
            HostResolver::Random { host_count, .. } => {
                let candidates: Vec<usize> = (0..*host_count)
                    .filter(|i| !filter.contains(i))
                    .collect();
                let mut rng = rand::thread_rng();
                if candidates.is_empty() {
                    rng.gen_range(0..*host_count)
                } else {
                    candidates[rng.gen_range(0..candidates.len())]
                }
            }
        }
    }
}
