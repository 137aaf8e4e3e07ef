//! Decomposition of a declaration type into its argument binders.
//!
//! For `(a_0 : A_0) -> ... -> (a_{n-1} : A_{n-1}) -> B` the telescope has `n`
//! arguments and conclusion `B`. Argument `i`'s type is kept as written, under
//! the `i` binders that precede it, so `Var(j)` inside `A_i` names argument
//! `i - 1 - j`. The conclusion lives under all `n` binders.

use crate::ast::{BinderInfo, Term};
use crate::error::RecursorShapeError;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelescopeArg {
    pub ty: Rc<Term>,
    pub info: BinderInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telescope {
    pub arguments: Vec<TelescopeArg>,
    pub conclusion: Rc<Term>,
}

impl Telescope {
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn arg_type(&self, pos: usize) -> Option<&Rc<Term>> {
        self.arguments.get(pos).map(|arg| &arg.ty)
    }

    /// The argument position named by `term` when it is a bare variable seen
    /// under `depth` binders of this telescope.
    pub fn resolve_var(depth: usize, term: &Term) -> Option<usize> {
        match term {
            Term::Var(j) if *j < depth => Some(depth - 1 - j),
            _ => None,
        }
    }
}

/// Strip the outermost chain of Pi binders. Definitions inside argument types
/// are never unfolded.
pub fn analyze_telescope(ty: &Rc<Term>) -> Telescope {
    let mut arguments = Vec::new();
    let mut current = ty.clone();
    while let Term::Pi(arg_ty, body, info) = &*current {
        arguments.push(TelescopeArg {
            ty: arg_ty.clone(),
            info: *info,
        });
        let next = body.clone();
        current = next;
    }
    Telescope {
        arguments,
        conclusion: current,
    }
}

/// Telescope of a recursor candidate; a type without arguments cannot be one.
pub fn analyze_recursor_telescope(
    recursor: &str,
    ty: &Rc<Term>,
) -> Result<Telescope, RecursorShapeError> {
    let telescope = analyze_telescope(ty);
    if telescope.is_empty() {
        return Err(RecursorShapeError::NotAFunction {
            recursor: recursor.to_string(),
        });
    }
    Ok(telescope)
}
