//! User-defined recursors
//!
//! A declaration is accepted as a recursor for an inductive family `I` with
//! `p` parameters and `q` indices when its type has the canonical layout
//!
//! ```text
//! (params : P_0 .. P_{p-1})
//! (motive : (indices) -> [(x : I params indices) ->] Sort u)
//! (minor premises ...)
//! (indices : J_0 .. J_{q-1})
//! (major : I params indices)
//! -> motive indices [major]
//! ```
//!
//! # Example: a user recursor for Nat
//! ```text
//! Nat.recAux : (motive : Nat -> Sort u) -> motive zero
//!            -> ((n : Nat) -> motive n -> motive (succ n))
//!            -> (t : Nat) -> motive t
//! ```
//! registers with no parameters or indices, motive at 0, major premise at 3,
//! motive universe `u` and dependent elimination.

use crate::ast::{normalize_level, Definition, InductiveDecl, Level, Term};
use crate::config::RecursorConfig;
use crate::env::Env;
use crate::error::{RecursorError, RecursorResult, RecursorShapeError};
use crate::reduce::whnf;
use crate::telescope::{analyze_recursor_telescope, analyze_telescope, Telescope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// What an argument of a recursor is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentRole {
    Parameter,
    Motive,
    Minor,
    Index,
    Major,
}

impl fmt::Display for ArgumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentRole::Parameter => "parameter",
            ArgumentRole::Motive => "motive",
            ArgumentRole::Minor => "minor premise",
            ArgumentRole::Index => "index",
            ArgumentRole::Major => "major premise",
        };
        f.write_str(name)
    }
}

/// Information for a user defined recursor.
///
/// Field order is the serialized record layout and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecursorInfo {
    recursor_name: String,
    type_name: String,
    /// If none, the recursor can only eliminate into Prop.
    motive_universe_position: Option<u32>,
    dependent_elimination: bool,
    major_position: u32,
    /// Positions of the family's parameters, in the order they appear in the major premise type.
    parameter_positions: Vec<u32>,
    /// Positions of the family's indices, in the order they appear in the major premise type.
    index_positions: Vec<u32>,
}

impl RecursorInfo {
    pub fn name(&self) -> &str {
        &self.recursor_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.index_positions.len()
    }

    pub fn motive_position(&self) -> usize {
        self.parameter_count()
    }

    pub fn first_index_position(&self) -> usize {
        self.major_position() - self.index_count()
    }

    pub fn major_position(&self) -> usize {
        self.major_position as usize
    }

    /// The major premise is the last argument.
    pub fn argument_count(&self) -> usize {
        self.major_position() + 1
    }

    pub fn motive_universe_position(&self) -> Option<usize> {
        self.motive_universe_position.map(|pos| pos as usize)
    }

    pub fn has_dependent_elimination(&self) -> bool {
        self.dependent_elimination
    }

    pub fn parameter_positions(&self) -> &[u32] {
        &self.parameter_positions
    }

    pub fn index_positions(&self) -> &[u32] {
        &self.index_positions
    }

    pub fn minor_positions(&self) -> Range<usize> {
        self.motive_position() + 1..self.first_index_position()
    }

    pub fn minor_count(&self) -> usize {
        self.minor_positions().len()
    }

    /// Role of the argument at `pos`; positions past the major premise are rejected.
    pub fn role_of(&self, pos: usize) -> RecursorResult<ArgumentRole> {
        if pos >= self.argument_count() {
            return Err(RecursorError::PositionOutOfRange {
                recursor: self.recursor_name.clone(),
                position: pos,
                arity: self.argument_count(),
            });
        }
        let role = if pos < self.motive_position() {
            ArgumentRole::Parameter
        } else if pos == self.motive_position() {
            ArgumentRole::Motive
        } else if pos < self.first_index_position() {
            ArgumentRole::Minor
        } else if pos < self.major_position() {
            ArgumentRole::Index
        } else {
            ArgumentRole::Major
        };
        Ok(role)
    }

    pub fn is_minor(&self, pos: usize) -> RecursorResult<bool> {
        Ok(self.role_of(pos)? == ArgumentRole::Minor)
    }

    /// Check the canonical layout of a record that did not come out of validation.
    pub(crate) fn check_layout(&self) -> RecursorResult<()> {
        let major = self.major_position();
        let layout_ok = self
            .parameter_positions
            .iter()
            .enumerate()
            .all(|(i, pos)| *pos as usize == i)
            && major >= self.index_count()
            && self.first_index_position() > self.motive_position()
            && self
                .index_positions
                .iter()
                .enumerate()
                .all(|(j, pos)| *pos as usize == self.first_index_position() + j);
        if layout_ok {
            Ok(())
        } else {
            Err(RecursorError::InvalidPayload(format!(
                "record for '{}' does not have the canonical argument layout",
                self.recursor_name
            )))
        }
    }
}

impl fmt::Display for RecursorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): params {:?}, motive {}, indices {:?}, major {}, ",
            self.recursor_name,
            self.type_name,
            self.parameter_positions,
            self.motive_position(),
            self.index_positions,
            self.major_position
        )?;
        match self.motive_universe_position {
            Some(pos) => write!(f, "motive universe #{}", pos)?,
            None => f.write_str("Prop only")?,
        }
        if self.dependent_elimination {
            f.write_str(", dependent")
        } else {
            f.write_str(", non-dependent")
        }
    }
}

// =============================================================================
// Shape validation
// =============================================================================

struct MotiveCandidate {
    position: usize,
    dependent: bool,
    level: Level,
}

struct ShapeValidator<'a> {
    env: &'a Env,
    decl: &'a Definition,
    family: &'a InductiveDecl,
    config: &'a RecursorConfig,
    telescope: Telescope,
    num_params: usize,
    num_indices: usize,
}

impl<'a> ShapeValidator<'a> {
    fn recursor(&self) -> String {
        self.decl.name.clone()
    }

    /// Arguments of the family application at `pos`, when the (unfolded) type
    /// of that argument is `I` applied to all parameters and indices.
    fn family_args(&self, pos: usize) -> Option<Vec<Rc<Term>>> {
        let ty = self.telescope.arg_type(pos)?;
        family_app_args(self.env, ty, self.family, self.config)
    }

    fn locate_major(&self, hint: Option<usize>) -> Result<usize, RecursorShapeError> {
        let not_found = || RecursorShapeError::MajorPremiseNotFound {
            recursor: self.recursor(),
            expected: format!("inductive type '{}'", self.family.name),
        };
        if let Some(pos) = hint {
            return self.family_args(pos).map(|_| pos).ok_or_else(not_found);
        }

        let candidates: Vec<usize> = (0..self.telescope.len())
            .filter(|pos| self.family_args(*pos).is_some())
            .collect();
        match candidates.as_slice() {
            [] => Err(not_found()),
            [pos] => Ok(*pos),
            _ => Err(RecursorShapeError::AmbiguousMajorPremise {
                recursor: self.recursor(),
                type_name: self.family.name.clone(),
                positions: candidates,
            }),
        }
    }

    fn match_params_and_indices(
        &self,
        major: usize,
    ) -> Result<(Vec<usize>, Vec<usize>), RecursorShapeError> {
        let args = self.family_args(major).unwrap_or_default();
        let mut positions = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            match Telescope::resolve_var(major, arg) {
                Some(pos) => positions.push(pos),
                None => {
                    return Err(RecursorShapeError::ParamOrIndexNotVariable {
                        recursor: self.recursor(),
                        major_position: major,
                        argument: i,
                    })
                }
            }
        }
        let indices = positions.split_off(self.num_params.min(positions.len()));
        Ok((positions, indices))
    }

    /// A motive is `(indices) -> Sort u` or `(indices) -> (x : I ..) -> Sort u`.
    fn motive_shape(&self, pos: usize) -> Option<MotiveCandidate> {
        let ty = self.telescope.arg_type(pos)?;
        let motive_tele = analyze_telescope(ty);
        let level = match &*whnf(self.env, motive_tele.conclusion.clone(), self.config) {
            Term::Sort(l) => l.clone(),
            _ => return None,
        };
        let arity = motive_tele.len();
        let dependent = if arity == self.num_indices {
            false
        } else if arity == self.num_indices + 1 {
            let major_ty = &motive_tele.arguments[arity - 1].ty;
            if family_app_args(self.env, major_ty, self.family, self.config).is_none() {
                return None;
            }
            true
        } else {
            return None;
        };
        Some(MotiveCandidate {
            position: pos,
            dependent,
            level,
        })
    }

    fn locate_motive(
        &self,
        major: usize,
        params: &[usize],
        indices: &[usize],
    ) -> Result<MotiveCandidate, RecursorShapeError> {
        let mut candidates: Vec<MotiveCandidate> = (0..major)
            .filter(|pos| !params.contains(pos) && !indices.contains(pos))
            .filter_map(|pos| self.motive_shape(pos))
            .collect();
        match candidates.len() {
            0 => Err(RecursorShapeError::MotiveNotFound {
                recursor: self.recursor(),
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(RecursorShapeError::AmbiguousMotive {
                recursor: self.recursor(),
                positions: candidates.iter().map(|c| c.position).collect(),
            }),
        }
    }

    /// The result type must be the motive applied to the indices, followed by
    /// the major premise exactly when the motive is dependent.
    fn check_conclusion(
        &self,
        motive: &MotiveCandidate,
        major: usize,
        indices: &[usize],
    ) -> Result<(), RecursorShapeError> {
        let depth = self.telescope.len();
        let conclusion = whnf(self.env, self.telescope.conclusion.clone(), self.config);
        let (head, args) = conclusion.app_spine();

        let mut expected: Vec<usize> = indices.to_vec();
        if motive.dependent {
            expected.push(major);
        }
        let applied: Vec<Option<usize>> = args
            .iter()
            .map(|arg| Telescope::resolve_var(depth, arg))
            .collect();

        let head_ok = Telescope::resolve_var(depth, &head) == Some(motive.position);
        let args_ok = applied.len() == expected.len()
            && applied.iter().zip(&expected).all(|(a, e)| *a == Some(*e));
        if head_ok && args_ok {
            Ok(())
        } else {
            Err(RecursorShapeError::MotiveNotFound {
                recursor: self.recursor(),
            })
        }
    }

    fn motive_universe(
        &self,
        motive: &MotiveCandidate,
        major: usize,
        params: &[usize],
        indices: &[usize],
    ) -> Result<Option<u32>, RecursorShapeError> {
        let not_free = || RecursorShapeError::MotiveUniverseNotFree {
            recursor: self.recursor(),
            motive_position: motive.position,
        };
        let name = match normalize_level(motive.level.clone()) {
            Level::Zero => return Ok(None),
            Level::Param(name) => name,
            _ => return Err(not_free()),
        };
        let univ_pos = self.decl.univ_param_position(&name).ok_or_else(not_free)?;

        let used_elsewhere = params
            .iter()
            .chain(indices)
            .chain(std::iter::once(&major))
            .filter_map(|pos| self.telescope.arg_type(*pos))
            .any(|ty| ty.mentions_univ_param(&name));
        if used_elsewhere {
            return Err(not_free());
        }
        Ok(Some(univ_pos as u32))
    }

    fn check_layout(
        &self,
        params: &[usize],
        motive: usize,
        indices: &[usize],
        major: usize,
    ) -> Result<(), RecursorShapeError> {
        let misplaced = |position: usize, expected| RecursorShapeError::NonCanonicalLayout {
            recursor: self.recursor(),
            position,
            expected,
        };

        if let Some(i) = params.iter().enumerate().position(|(i, pos)| *pos != i) {
            return Err(misplaced(i, ArgumentRole::Parameter));
        }
        if motive != params.len() {
            return Err(misplaced(params.len(), ArgumentRole::Motive));
        }
        let last = self.telescope.len() - 1;
        if major != last {
            return Err(misplaced(last, ArgumentRole::Major));
        }
        let first_index = major
            .checked_sub(indices.len())
            .ok_or_else(|| misplaced(0, ArgumentRole::Index))?;
        if let Some(j) = indices
            .iter()
            .enumerate()
            .position(|(j, pos)| *pos != first_index + j)
        {
            return Err(misplaced(first_index + j, ArgumentRole::Index));
        }
        Ok(())
    }
}

/// Arguments of `ty` when its weak head normal form is `family` applied to
/// exactly its parameters and indices.
fn family_app_args(
    env: &Env,
    ty: &Rc<Term>,
    family: &InductiveDecl,
    config: &RecursorConfig,
) -> Option<Vec<Rc<Term>>> {
    let ty = whnf(env, ty.clone(), config);
    let (head, args) = ty.app_spine();
    match &*head {
        Term::Ind(name, _)
            if *name == family.name && args.len() == family.num_params + family.num_indices() =>
        {
            Some(args)
        }
        _ => None,
    }
}

/// Check that `decl` is a recursor for `family` and compute its positional
/// information. Deterministic: the same inputs always give the same record.
pub fn validate_recursor(
    env: &Env,
    decl: &Definition,
    family: &InductiveDecl,
    major_hint: Option<usize>,
    config: &RecursorConfig,
) -> Result<RecursorInfo, RecursorShapeError> {
    let telescope = analyze_recursor_telescope(&decl.name, &decl.ty)?;
    let validator = ShapeValidator {
        env,
        decl,
        family,
        config,
        telescope,
        num_params: family.num_params,
        num_indices: family.num_indices(),
    };

    let major = validator.locate_major(major_hint)?;
    tracing::debug!(recursor = %decl.name, family = %family.name, major, "located major premise");
    let (params, indices) = validator.match_params_and_indices(major)?;
    let motive = validator.locate_motive(major, &params, &indices)?;
    tracing::debug!(
        recursor = %decl.name,
        motive = motive.position,
        dependent = motive.dependent,
        "located motive"
    );
    validator.check_conclusion(&motive, major, &indices)?;
    let motive_universe_position = validator.motive_universe(&motive, major, &params, &indices)?;
    validator.check_layout(&params, motive.position, &indices, major)?;

    Ok(RecursorInfo {
        recursor_name: decl.name.clone(),
        type_name: family.name.clone(),
        motive_universe_position,
        dependent_elimination: motive.dependent,
        major_position: major as u32,
        parameter_positions: params.into_iter().map(|pos| pos as u32).collect(),
        index_positions: indices.into_iter().map(|pos| pos as u32).collect(),
    })
}

fn family_of<'e>(env: &'e Env, ty: &Rc<Term>, config: &RecursorConfig) -> Option<&'e InductiveDecl> {
    let (head, _) = whnf(env, ty.clone(), config).app_spine();
    match &*head {
        Term::Ind(name, _) => env.get_inductive(name),
        _ => None,
    }
}

/// Pick the family a candidate eliminates: the head of the (unfolded) type of
/// the hinted argument, or of the last argument, which is where the canonical
/// layout puts the major premise. When the last argument is not of an
/// inductive type, the family is the only one any argument is typed with, so
/// a misplaced major premise is reported by the layout check.
pub fn target_family<'e>(
    env: &'e Env,
    decl: &Definition,
    major_hint: Option<usize>,
    config: &RecursorConfig,
) -> Result<&'e InductiveDecl, RecursorShapeError> {
    let telescope = analyze_recursor_telescope(&decl.name, &decl.ty)?;
    let not_found = || RecursorShapeError::MajorPremiseNotFound {
        recursor: decl.name.clone(),
        expected: "an inductive type".to_string(),
    };
    if let Some(pos) = major_hint {
        let ty = telescope.arg_type(pos).ok_or_else(not_found)?;
        return family_of(env, ty, config).ok_or_else(not_found);
    }

    let last = telescope.len() - 1;
    if let Some(family) = telescope
        .arg_type(last)
        .and_then(|ty| family_of(env, ty, config))
    {
        return Ok(family);
    }

    let mut found: Vec<&'e InductiveDecl> = Vec::new();
    for arg in &telescope.arguments {
        if let Some(family) = family_of(env, &arg.ty, config) {
            if !found.iter().any(|seen| seen.name == family.name) {
                found.push(family);
            }
        }
    }
    match found.as_slice() {
        [family] => Ok(*family),
        _ => Err(not_found()),
    }
}

/// Validate `decl` against the family named by its major premise.
pub fn validate_user_recursor(
    env: &Env,
    decl: &Definition,
    major_hint: Option<usize>,
    config: &RecursorConfig,
) -> Result<RecursorInfo, RecursorShapeError> {
    let family = target_family(env, decl, major_hint, config)?;
    validate_recursor(env, decl, family, major_hint, config)
}
