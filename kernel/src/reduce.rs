//! Weak-head normalization used to look through definitions in argument types.

use crate::ast::{Definition, Level, Term, Transparency};
use crate::config::RecursorConfig;
use crate::env::Env;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    FuelExhausted,
}

struct Budget {
    remaining: usize,
}

impl Budget {
    fn tick(&mut self) -> Result<(), ReduceError> {
        if self.remaining == 0 {
            Err(ReduceError::FuelExhausted)
        } else {
            self.remaining -= 1;
            Ok(())
        }
    }
}

fn can_unfold(def: &Definition, transparency: Transparency) -> bool {
    def.value.is_some()
        && match transparency {
            Transparency::All => true,
            Transparency::Reducible => def.transparency != Transparency::None,
            Transparency::None => false,
        }
}

/// Replace universe parameters of an unfolded definition by the levels it was used at.
fn instantiate_level(level: &Level, params: &[String], levels: &[Level]) -> Level {
    match level {
        Level::Zero => Level::Zero,
        Level::Param(name) => params
            .iter()
            .position(|p| p == name)
            .and_then(|i| levels.get(i).cloned())
            .unwrap_or_else(|| level.clone()),
        Level::Succ(inner) => Level::succ(instantiate_level(inner, params, levels)),
        Level::Max(a, b) => Level::Max(
            Box::new(instantiate_level(a, params, levels)),
            Box::new(instantiate_level(b, params, levels)),
        ),
        Level::IMax(a, b) => Level::IMax(
            Box::new(instantiate_level(a, params, levels)),
            Box::new(instantiate_level(b, params, levels)),
        ),
    }
}

fn instantiate_levels(ls: &[Level], params: &[String], levels: &[Level]) -> Vec<Level> {
    ls.iter().map(|l| instantiate_level(l, params, levels)).collect()
}

pub fn instantiate_univ_params(t: &Rc<Term>, params: &[String], levels: &[Level]) -> Rc<Term> {
    if params.is_empty() || levels.is_empty() {
        return t.clone();
    }
    match &**t {
        Term::Var(_) => t.clone(),
        Term::Sort(l) => Term::sort(instantiate_level(l, params, levels)),
        Term::Const(n, ls) => Rc::new(Term::Const(n.clone(), instantiate_levels(ls, params, levels))),
        Term::Ind(n, ls) => Rc::new(Term::Ind(n.clone(), instantiate_levels(ls, params, levels))),
        Term::Ctor(n, idx, ls) => Rc::new(Term::Ctor(n.clone(), *idx, instantiate_levels(ls, params, levels))),
        Term::App(f, a) => Term::app(
            instantiate_univ_params(f, params, levels),
            instantiate_univ_params(a, params, levels),
        ),
        Term::Lam(ty, body, info) => Term::lam(
            instantiate_univ_params(ty, params, levels),
            instantiate_univ_params(body, params, levels),
            *info,
        ),
        Term::Pi(ty, body, info) => Term::pi(
            instantiate_univ_params(ty, params, levels),
            instantiate_univ_params(body, params, levels),
            *info,
        ),
        Term::LetE(ty, v, b) => Rc::new(Term::LetE(
            instantiate_univ_params(ty, params, levels),
            instantiate_univ_params(v, params, levels),
            instantiate_univ_params(b, params, levels),
        )),
    }
}

/// Weak head normal form: beta, zeta (let) and delta (definition unfolding
/// under `transparency`). Each reduction step consumes one unit of fuel.
pub fn whnf_with_fuel(
    env: &Env,
    t: Rc<Term>,
    transparency: Transparency,
    fuel: usize,
) -> Result<Rc<Term>, ReduceError> {
    let mut budget = Budget { remaining: fuel };
    whnf_core(env, t, transparency, &mut budget)
}

/// Like [`whnf_with_fuel`] with the budget and transparency of `config`.
/// When the budget runs out the input is returned unreduced.
pub fn whnf(env: &Env, t: Rc<Term>, config: &RecursorConfig) -> Rc<Term> {
    match whnf_with_fuel(env, t.clone(), config.transparency, config.whnf_fuel) {
        Ok(reduced) => reduced,
        Err(ReduceError::FuelExhausted) => {
            tracing::debug!(fuel = config.whnf_fuel, "whnf ran out of fuel");
            t
        }
    }
}

fn whnf_core(
    env: &Env,
    t: Rc<Term>,
    transparency: Transparency,
    budget: &mut Budget,
) -> Result<Rc<Term>, ReduceError> {
    match &*t {
        Term::App(f, a) => {
            let f_norm = whnf_core(env, f.clone(), transparency, budget)?;
            if let Term::Lam(_, body, _) = &*f_norm {
                budget.tick()?;
                whnf_core(env, body.subst(0, a), transparency, budget)
            } else if Rc::ptr_eq(&f_norm, f) {
                Ok(t)
            } else {
                Ok(Term::app(f_norm, a.clone()))
            }
        }
        Term::LetE(_, val, body) => {
            budget.tick()?;
            whnf_core(env, body.subst(0, val), transparency, budget)
        }
        Term::Const(name, levels) => match env.get_definition(name) {
            Some(def) if can_unfold(def, transparency) => {
                budget.tick()?;
                let value = match &def.value {
                    Some(value) => instantiate_univ_params(value, &def.univ_params, levels),
                    None => return Ok(t),
                };
                whnf_core(env, value, transparency, budget)
            }
            _ => Ok(t),
        },
        _ => Ok(t),
    }
}
