use crate::ast::{Definition, InductiveDecl};
use crate::error::EnvError;
use crate::registry::RecursorRegistry;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fresh tag for a new environment value. Tags are never reused, so two
/// environments derived separately from the same parent get different tags.
fn next_generation() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Global environment containing inductive definitions, constants and the
/// user recursor registry.
///
/// Cloning is cheap: all tables are persistent maps that share structure, so
/// an update on a clone never affects the original value. Every update draws a
/// fresh `generation` tag, which snapshots such as
/// [`crate::registry::HasRecursorsPred`] use to tell which environment they
/// were built from. Clones share the tag of the value they copy.
#[derive(Debug, Clone, Default)]
pub struct Env {
    inductives: im::HashMap<String, Rc<InductiveDecl>>,
    defs: im::HashMap<String, Rc<Definition>>,
    recursors: RecursorRegistry,
    generation: u64,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Register an inductive type definition
    pub fn add_inductive(&mut self, decl: InductiveDecl) -> Result<(), EnvError> {
        if self.inductives.contains_key(&decl.name) {
            return Err(EnvError::DuplicateInductive(decl.name));
        }
        self.inductives.insert(decl.name.clone(), Rc::new(decl));
        self.generation = next_generation();
        Ok(())
    }

    /// Register a global definition
    pub fn add_definition(&mut self, def: Definition) -> Result<(), EnvError> {
        if self.defs.contains_key(&def.name) {
            return Err(EnvError::DuplicateDefinition(def.name));
        }
        self.defs.insert(def.name.clone(), Rc::new(def));
        self.generation = next_generation();
        Ok(())
    }

    /// Get an inductive declaration by name
    pub fn get_inductive(&self, name: &str) -> Option<&InductiveDecl> {
        self.inductives.get(name).map(|decl| &**decl)
    }

    /// Get a definition by name
    pub fn get_definition(&self, name: &str) -> Option<&Definition> {
        self.defs.get(name).map(|def| &**def)
    }

    pub fn recursors(&self) -> &RecursorRegistry {
        &self.recursors
    }

    /// Tag of this environment value; `0` for an empty `Env::new()`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// New environment value with `recursors` swapped in.
    pub(crate) fn with_recursors(&self, recursors: RecursorRegistry) -> Env {
        Env {
            inductives: self.inductives.clone(),
            defs: self.defs.clone(),
            recursors,
            generation: next_generation(),
        }
    }
}
