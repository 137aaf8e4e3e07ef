//! Registry of user defined recursors and the queries over it.
//!
//! Registrations coming from imported modules and registrations made in the
//! current session are kept in separate tables. Queries see both, imports
//! first. Only session entries registered as persistent are exported.

use crate::config::RecursorConfig;
use crate::env::Env;
use crate::error::{RecursorError, RecursorResult};
use crate::recursor::{validate_user_recursor, RecursorInfo};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
struct RecursorTable {
    infos: im::HashMap<String, Rc<RecursorInfo>>,
    /// Family name to recursor names in registration order
    by_type: im::HashMap<String, im::Vector<String>>,
}

impl RecursorTable {
    fn get(&self, name: &str) -> Option<&RecursorInfo> {
        self.infos.get(name).map(|info| &**info)
    }

    fn insert(&mut self, info: RecursorInfo) {
        let name = info.name().to_string();
        self.by_type
            .entry(info.type_name().to_string())
            .or_insert_with(im::Vector::new)
            .push_back(name.clone());
        self.infos.insert(name, Rc::new(info));
    }

    fn names_for(&self, type_name: &str) -> impl Iterator<Item = &String> {
        self.by_type.get(type_name).into_iter().flatten()
    }

    fn len(&self) -> usize {
        self.infos.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecursorRegistry {
    imported: RecursorTable,
    session: RecursorTable,
    /// Persistent session registrations, in registration order
    exported: im::Vector<String>,
}

impl RecursorRegistry {
    pub fn get(&self, name: &str) -> Option<&RecursorInfo> {
        self.imported.get(name).or_else(|| self.session.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Recursor names for `type_name`: imports first, then the session.
    pub fn recursors_for(&self, type_name: &str) -> Vec<String> {
        self.imported
            .names_for(type_name)
            .chain(self.session.names_for(type_name))
            .cloned()
            .collect()
    }

    /// Families with at least one registered recursor.
    pub fn families(&self) -> impl Iterator<Item = &String> {
        self.imported
            .by_type
            .keys()
            .chain(self.session.by_type.keys())
    }

    pub fn len(&self) -> usize {
        self.imported.len() + self.session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records a module exports, in registration order.
    pub fn exported(&self) -> impl Iterator<Item = &RecursorInfo> {
        self.exported.iter().filter_map(|name| self.session.get(name))
    }

    pub(crate) fn with_session(&self, info: RecursorInfo, persistent: bool) -> RecursorRegistry {
        let mut next = self.clone();
        if persistent {
            next.exported.push_back(info.name().to_string());
        }
        next.session.insert(info);
        next
    }

    pub(crate) fn with_imported(&self, infos: Vec<RecursorInfo>) -> RecursorRegistry {
        let mut next = self.clone();
        for info in infos {
            next.imported.insert(info);
        }
        next
    }
}

impl Env {
    /// Number of recursors visible in this environment, imported or not.
    pub fn recursor_count(&self) -> usize {
        self.recursors().len()
    }
}

/// Register `recursor_name` as a user defined recursor.
///
/// The input environment is left untouched; on success the returned
/// environment has one more registration.
pub fn add_user_recursor(
    env: &Env,
    recursor_name: &str,
    major_hint: Option<usize>,
    persistent: bool,
) -> RecursorResult<Env> {
    add_user_recursor_with_config(
        env,
        recursor_name,
        major_hint,
        persistent,
        &RecursorConfig::default(),
    )
}

pub fn add_user_recursor_with_config(
    env: &Env,
    recursor_name: &str,
    major_hint: Option<usize>,
    persistent: bool,
    config: &RecursorConfig,
) -> RecursorResult<Env> {
    let decl = env
        .get_definition(recursor_name)
        .ok_or_else(|| RecursorError::UnknownDeclaration(recursor_name.to_string()))?;
    if env.recursors().contains(recursor_name) {
        return Err(RecursorError::DuplicateRecursor(recursor_name.to_string()));
    }

    let info = validate_user_recursor(env, decl, major_hint, config)?;
    tracing::debug!(
        recursor = recursor_name,
        family = info.type_name(),
        persistent,
        "registered user recursor"
    );
    let recursors = env.recursors().with_session(info, persistent);
    Ok(env.with_recursors(recursors))
}

pub fn get_recursor_info<'e>(env: &'e Env, recursor_name: &str) -> RecursorResult<&'e RecursorInfo> {
    env.recursors()
        .get(recursor_name)
        .ok_or_else(|| RecursorError::NotARecursor(recursor_name.to_string()))
}

pub fn get_recursors_for(env: &Env, type_name: &str) -> Vec<String> {
    env.recursors().recursors_for(type_name)
}

pub fn is_user_recursor(env: &Env, name: &str) -> bool {
    env.recursors().contains(name)
}

/// Point-in-time answer to "does this family have user recursors?".
///
/// The snapshot is never refreshed. Registrations made after it was built are
/// not seen; compare [`HasRecursorsPred::generation`] with the environment, or
/// use [`HasRecursorsPred::is_current_for`], and rebuild when stale.
#[derive(Debug, Clone)]
pub struct HasRecursorsPred {
    families: HashSet<String>,
    generation: u64,
}

impl HasRecursorsPred {
    pub fn new(env: &Env) -> Self {
        HasRecursorsPred {
            families: env.recursors().families().cloned().collect(),
            generation: env.generation(),
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.families.contains(type_name)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current_for(&self, env: &Env) -> bool {
        self.generation == env.generation()
    }
}
