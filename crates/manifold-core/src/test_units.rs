//! Instrumented units for resolver and registry tests.

use crate::registry::UnitRegistry;
use crate::resolve::DependencySet;
use crate::unit::{Unit, UnitError};
use manifold_schema::{File, UnitId};
use manifold_store::Storage;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct ProbeState {
    generated: AtomicUsize,
    fail: AtomicBool,
}

/// Handles onto the probes registered by [`probe_registry`].
pub(crate) struct Probes {
    states: HashMap<String, Arc<ProbeState>>,
}

impl Probes {
    /// How many times `id` was generated.
    pub fn count(&self, id: &str) -> usize {
        self.states[id].generated.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.states
            .values()
            .map(|s| s.generated.load(Ordering::SeqCst))
            .sum()
    }

    /// Make every later `generate` of `id` fail.
    pub fn fail(&self, id: &str) {
        self.states[id].fail.store(true, Ordering::SeqCst);
    }
}

/// Unit that records what it saw. `seen` maps each parent id to the address
/// of the parent instance, so tests can check instance identity.
#[derive(Default)]
pub(crate) struct Probe {
    id: String,
    deps: Vec<UnitId>,
    state: Arc<ProbeState>,
    pub seen: BTreeMap<String, usize>,
}

impl Unit for Probe {
    fn name(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> Vec<UnitId> {
        self.deps.clone()
    }

    fn generate(&mut self, parents: &DependencySet) -> Result<(), UnitError> {
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(UnitError::Invalid(format!("{} refused to generate", self.id)));
        }
        for id in parents.ids() {
            if let Some(parent) = parents.get_arc(id) {
                let addr = Arc::as_ptr(&parent).cast::<()>() as usize;
                self.seen.insert(id.to_string(), addr);
            }
        }
        self.state.generated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn files(&self) -> Vec<File> {
        vec![File::new(format!("probe/{}", self.id), self.id.clone())]
    }

    fn load(&mut self, storage: &dyn Storage) -> Result<bool, UnitError> {
        Ok(storage.read(&format!("probe/{}", self.id))?.is_some())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn probe_registry(edges: &[(&str, &[&str])]) -> (UnitRegistry, Probes) {
    let mut registry = UnitRegistry::new();
    let mut states = HashMap::new();
    for (id, deps) in edges {
        let state = Arc::new(ProbeState::default());
        states.insert((*id).to_owned(), Arc::clone(&state));
        let id = (*id).to_owned();
        let deps: Vec<UnitId> = deps.iter().map(|d| UnitId::new(*d)).collect();
        registry
            .register_with(id.clone(), move || {
                Box::new(Probe {
                    id: id.clone(),
                    deps: deps.clone(),
                    state: Arc::clone(&state),
                    seen: BTreeMap::new(),
                })
            })
            .unwrap();
    }
    (registry, Probes { states })
}
