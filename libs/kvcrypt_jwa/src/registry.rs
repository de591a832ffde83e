// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use dashmap::DashMap;
use tracing::debug;

use crate::algorithm::Algorithm;

/// Name to [`Algorithm`] lookup table.
///
/// Lookups are case-insensitive. A name that does not resolve has no local
/// implementation and has to be served by a remote key service.
#[derive(Debug)]
pub struct AlgorithmRegistry {
    algorithms: DashMap<String, Algorithm>,
}

impl AlgorithmRegistry {
    /// A registry without any algorithm.
    pub fn empty() -> Self {
        Self {
            algorithms: DashMap::new(),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Algorithm> {
        self.algorithms.get(&normalize(name)).map(|entry| *entry.value())
    }

    /// Registers `algorithm` under `name`, returning the algorithm it replaces.
    pub fn register(&self, name: &str, algorithm: Algorithm) -> Option<Algorithm> {
        debug!(name, algorithm = algorithm.name(), "registering algorithm");
        self.algorithms.insert(normalize(name), algorithm)
    }

    pub fn unregister(&self, name: &str) -> Option<Algorithm> {
        debug!(name, "unregistering algorithm");
        self.algorithms
            .remove(&normalize(name))
            .map(|(_, algorithm)| algorithm)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .algorithms
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        let registry = Self::empty();
        for algorithm in Algorithm::builtins() {
            registry
                .algorithms
                .insert(normalize(algorithm.name()), algorithm);
        }
        registry
    }
}

fn normalize(name: &str) -> String {
    name.to_ascii_uppercase()
}
