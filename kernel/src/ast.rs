use std::collections::HashSet;
use std::rc::Rc;

// =============================================================================
// Declarations
// =============================================================================

/// Transparency levels for reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transparency {
    None,      // Opaque / Irreducible
    Reducible, // Standard definitions (Transparent)
    All,       // Unfold everything with a value, including opaque definitions
}

/// A global declaration as the elaborator hands it to the kernel.
///
/// The kernel assumes `ty` (and `value`, when present) were already checked;
/// nothing in this crate re-typechecks a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    /// Universe parameters, in declaration order.
    pub univ_params: Vec<String>,
    pub ty: Rc<Term>,
    pub value: Option<Rc<Term>>, // None for axioms
    /// Unfolding transparency hint
    pub transparency: Transparency,
}

impl Definition {
    /// Create a transparent definition
    pub fn total(name: String, ty: Rc<Term>, value: Rc<Term>) -> Self {
        Definition {
            name,
            univ_params: vec![],
            ty,
            value: Some(value),
            transparency: Transparency::Reducible,
        }
    }

    /// Create a theorem: it has a value, but does not unfold under the default transparency
    pub fn theorem(name: String, ty: Rc<Term>, value: Rc<Term>) -> Self {
        Definition {
            name,
            univ_params: vec![],
            ty,
            value: Some(value),
            transparency: Transparency::None,
        }
    }

    /// Create an axiom (assumed without proof)
    pub fn axiom(name: String, ty: Rc<Term>) -> Self {
        Definition {
            name,
            univ_params: vec![],
            ty,
            value: None,
            transparency: Transparency::None, // Axioms don't unfold
        }
    }

    pub fn with_univ_params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.univ_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Position of a universe parameter in `univ_params`.
    pub fn univ_param_position(&self, name: &str) -> Option<usize> {
        self.univ_params.iter().position(|p| p == name)
    }
}

// =============================================================================
// Universe Levels
// =============================================================================

/// Universe levels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Zero,
    Succ(Box<Level>),
    Max(Box<Level>, Box<Level>),
    IMax(Box<Level>, Box<Level>),
    Param(String),
}

impl Level {
    pub fn succ(l: Level) -> Level {
        Level::Succ(Box::new(l))
    }

    pub fn param(name: impl Into<String>) -> Level {
        Level::Param(name.into())
    }

    /// Whether universe parameter `name` occurs anywhere in this level.
    pub fn mentions_param(&self, name: &str) -> bool {
        match self {
            Level::Zero => false,
            Level::Param(p) => p == name,
            Level::Succ(inner) => inner.mentions_param(name),
            Level::Max(a, b) | Level::IMax(a, b) => a.mentions_param(name) || b.mentions_param(name),
        }
    }
}

fn level_key(level: &Level) -> String {
    match level {
        Level::Zero => "0".to_string(),
        Level::Param(name) => format!("P({})", name),
        Level::Succ(inner) => format!("S({})", level_key(inner)),
        Level::Max(a, b) => format!("M({}, {})", level_key(a), level_key(b)),
        Level::IMax(a, b) => format!("I({}, {})", level_key(a), level_key(b)),
    }
}

fn collect_max(level: Level, out: &mut Vec<Level>) {
    match level {
        Level::Max(a, b) => {
            collect_max(*a, out);
            collect_max(*b, out);
        }
        other => out.push(other),
    }
}

fn normalize_max(levels: Vec<Level>) -> Level {
    let mut flat = Vec::new();
    for level in levels {
        collect_max(level, &mut flat);
    }

    flat.retain(|level| !matches!(level, Level::Zero));

    if flat.len() <= 1 {
        return flat.pop().unwrap_or(Level::Zero);
    }

    if flat.iter().all(|level| matches!(level, Level::Succ(_))) {
        let inners: Vec<Level> = flat
            .into_iter()
            .filter_map(|level| match level {
                Level::Succ(inner) => Some(*inner),
                _ => None,
            })
            .collect();
        return Level::Succ(Box::new(normalize_max(inners)));
    }

    let mut seen = HashSet::new();
    flat.retain(|level| seen.insert(level.clone()));
    flat.sort_by_key(level_key);

    let mut iter = flat.into_iter();
    let first = iter.next().unwrap_or(Level::Zero);
    iter.fold(first, |acc, level| Level::Max(Box::new(acc), Box::new(level)))
}

pub fn normalize_level(level: Level) -> Level {
    match level {
        Level::Zero | Level::Param(_) => level,
        Level::Succ(inner) => Level::Succ(Box::new(normalize_level(*inner))),
        Level::IMax(a, b) => {
            let a_norm = normalize_level(*a);
            let b_norm = normalize_level(*b);
            if matches!(b_norm, Level::Zero) {
                Level::Zero
            } else {
                normalize_max(vec![a_norm, b_norm])
            }
        }
        Level::Max(a, b) => {
            let a_norm = normalize_level(*a);
            let b_norm = normalize_level(*b);
            normalize_max(vec![a_norm, b_norm])
        }
    }
}

// =============================================================================
// Terms
// =============================================================================

/// Binder information (explicit or implicit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinderInfo {
    Default,
    Implicit,
}

impl BinderInfo {
    pub fn is_explicit(self) -> bool {
        matches!(self, BinderInfo::Default)
    }
}

/// The core terms of the calculus, using de Bruijn indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Bound variable (de Bruijn index)
    Var(usize),
    /// Universe
    Sort(Level),
    /// Constant (global definition)
    Const(String, Vec<Level>),
    /// Application: (f a)
    App(Rc<Term>, Rc<Term>),
    /// Lambda abstraction: \x:A. b
    Lam(Rc<Term>, Rc<Term>, BinderInfo),
    /// Pi type: (x:A) -> B
    Pi(Rc<Term>, Rc<Term>, BinderInfo),
    /// Let binding: let x:A = v in b
    LetE(Rc<Term>, Rc<Term>, Rc<Term>),
    /// Inductive type reference: (Ind "Nat" [levels])
    Ind(String, Vec<Level>),
    /// Constructor: (Ctor "Nat" 0 [levels]) = Nat.zero
    Ctor(String, usize, Vec<Level>),
}

/// A single constructor of an inductive type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub name: String,
    pub ty: Rc<Term>, // Type relative to inductive params
}

/// Inductive type definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InductiveDecl {
    pub name: String,
    pub univ_params: Vec<String>,
    pub num_params: usize,
    pub ty: Rc<Term>, // The "arity" (e.g., Type 0 for Nat)
    pub ctors: Vec<Constructor>,
}

impl InductiveDecl {
    /// Create a parameterless inductive declaration
    pub fn new(name: String, ty: Rc<Term>, ctors: Vec<Constructor>) -> Self {
        InductiveDecl {
            name,
            univ_params: vec![],
            num_params: 0,
            ty,
            ctors,
        }
    }

    pub fn with_params(mut self, num_params: usize) -> Self {
        self.num_params = num_params;
        self
    }

    /// Number of indices: arity binders that are not parameters.
    pub fn num_indices(&self) -> usize {
        self.ty.pi_arity().saturating_sub(self.num_params)
    }
}

// Helper constructors for convenience
impl Term {
    pub fn var(n: usize) -> Rc<Self> {
        Rc::new(Term::Var(n))
    }

    pub fn sort(l: Level) -> Rc<Self> {
        Rc::new(Term::Sort(l))
    }

    pub fn prop() -> Rc<Self> {
        Term::sort(Level::Zero)
    }

    pub fn constant(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Term::Const(name.into(), vec![]))
    }

    pub fn app(f: Rc<Term>, a: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::App(f, a))
    }

    /// Left-nested application `f a_1 ... a_n`.
    pub fn app_many(f: Rc<Term>, args: impl IntoIterator<Item = Rc<Term>>) -> Rc<Self> {
        args.into_iter().fold(f, Term::app)
    }

    pub fn lam(ty: Rc<Term>, body: Rc<Term>, info: BinderInfo) -> Rc<Self> {
        Rc::new(Term::Lam(ty, body, info))
    }

    pub fn pi(ty: Rc<Term>, body: Rc<Term>, info: BinderInfo) -> Rc<Self> {
        Rc::new(Term::Pi(ty, body, info))
    }

    pub fn ind(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Term::Ind(name.into(), vec![]))
    }

    pub fn ctor(ind_name: impl Into<String>, idx: usize) -> Rc<Self> {
        Rc::new(Term::Ctor(ind_name.into(), idx, vec![]))
    }

    /// Split an application spine into its head and arguments (in application order).
    pub fn app_spine(self: &Rc<Term>) -> (Rc<Term>, Vec<Rc<Term>>) {
        let mut args = Vec::new();
        let mut current = self.clone();
        while let Term::App(f, a) = &*current {
            args.push(a.clone());
            let next = f.clone();
            current = next;
        }
        args.reverse();
        (current, args)
    }

    /// Number of leading Pi binders.
    pub fn pi_arity(&self) -> usize {
        let mut count = 0;
        let mut current = self;
        while let Term::Pi(_, body, _) = current {
            count += 1;
            current = body;
        }
        count
    }

    /// Whether universe parameter `name` occurs anywhere in this term.
    pub fn mentions_univ_param(&self, name: &str) -> bool {
        let any_level = |ls: &[Level]| ls.iter().any(|l| l.mentions_param(name));
        match self {
            Term::Var(_) => false,
            Term::Sort(l) => l.mentions_param(name),
            Term::Const(_, ls) | Term::Ind(_, ls) | Term::Ctor(_, _, ls) => any_level(ls),
            Term::App(f, a) => f.mentions_univ_param(name) || a.mentions_univ_param(name),
            Term::Lam(ty, body, _) | Term::Pi(ty, body, _) => {
                ty.mentions_univ_param(name) || body.mentions_univ_param(name)
            }
            Term::LetE(ty, v, b) => {
                ty.mentions_univ_param(name)
                    || v.mentions_univ_param(name)
                    || b.mentions_univ_param(name)
            }
        }
    }

    /// Shift indices in a term by `d` above cutoff `c`.
    pub fn shift(&self, c: usize, d: usize) -> Rc<Term> {
        match self {
            Term::Var(k) => {
                if *k < c {
                    Rc::new(Term::Var(*k))
                } else {
                    Rc::new(Term::Var(k + d))
                }
            }
            Term::Sort(l) => Rc::new(Term::Sort(l.clone())),
            Term::Const(n, ls) => Rc::new(Term::Const(n.clone(), ls.clone())),
            Term::App(f, a) => Rc::new(Term::App(f.shift(c, d), a.shift(c, d))),
            Term::Lam(ty, body, info) => Rc::new(Term::Lam(ty.shift(c, d), body.shift(c + 1, d), *info)),
            Term::Pi(ty, body, info) => Rc::new(Term::Pi(ty.shift(c, d), body.shift(c + 1, d), *info)),
            Term::LetE(ty, v, b) => {
                Rc::new(Term::LetE(ty.shift(c, d), v.shift(c, d), b.shift(c + 1, d)))
            }
            Term::Ind(n, ls) => Rc::new(Term::Ind(n.clone(), ls.clone())),
            Term::Ctor(n, idx, ls) => Rc::new(Term::Ctor(n.clone(), *idx, ls.clone())),
        }
    }

    /// Substitute `s` for variable `k` in `t`.
    pub fn subst(&self, k: usize, s: &Rc<Term>) -> Rc<Term> {
        match self {
            Term::Var(i) => {
                if *i == k {
                    s.clone()
                } else if *i > k {
                    Rc::new(Term::Var(i - 1))
                } else {
                    Rc::new(Term::Var(*i))
                }
            }
            Term::Sort(l) => Rc::new(Term::Sort(l.clone())),
            Term::Const(n, ls) => Rc::new(Term::Const(n.clone(), ls.clone())),
            Term::App(f, a) => Rc::new(Term::App(f.subst(k, s), a.subst(k, s))),
            Term::Lam(ty, body, info) => Rc::new(Term::Lam(
                ty.subst(k, s),
                body.subst(k + 1, &s.shift(0, 1)),
                *info,
            )),
            Term::Pi(ty, body, info) => Rc::new(Term::Pi(
                ty.subst(k, s),
                body.subst(k + 1, &s.shift(0, 1)),
                *info,
            )),
            Term::LetE(ty, v, b) => Rc::new(Term::LetE(
                ty.subst(k, s),
                v.subst(k, s),
                b.subst(k + 1, &s.shift(0, 1)),
            )),
            // Ind and Ctor have no bound variables
            Term::Ind(n, ls) => Rc::new(Term::Ind(n.clone(), ls.clone())),
            Term::Ctor(n, idx, ls) => Rc::new(Term::Ctor(n.clone(), *idx, ls.clone())),
        }
    }
}
