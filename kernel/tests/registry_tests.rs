//! Registration order, visibility and module import/export of user recursors

use kernel::ast::{Definition, InductiveDecl, Level, Term};
use kernel::env::Env;
use kernel::error::RecursorError;
use kernel::parser::parse_term;
use kernel::payload::{decode_recursor_payload, export_recursors, import_recursors};
use kernel::registry::{
    add_user_recursor, get_recursor_info, get_recursors_for, is_user_recursor, HasRecursorsPred,
};

// (motive : Nat -> Sort u) -> motive zero -> ((n : Nat) -> motive n -> motive (succ n))
//   -> (t : Nat) -> motive t
const NAT_REC: &str = "(pi (pi (ind Nat) (sort u))
    (pi (app 0 (ctor Nat 0))
      (pi (pi (ind Nat) (pi (app 2 0) (app 3 (app (ctor Nat 1) 1))))
        (pi (ind Nat) (app 3 0)))))";

// (motive : Nat -> Prop) -> motive zero -> (t : Nat) -> motive t
const NAT_IND_ZERO: &str =
    "(pi (pi (ind Nat) Prop) (pi (app 0 (ctor Nat 0)) (pi (ind Nat) (app 2 0))))";

// (motive : Bool -> Sort u) -> motive true -> motive false -> (b : Bool) -> motive b
const BOOL_CASES: &str = "(pi (pi (ind Bool) (sort u))
    (pi (app 0 (ctor Bool 0))
      (pi (app 1 (ctor Bool 1))
        (pi (ind Bool) (app 3 0)))))";

fn base_env() -> Env {
    let mut env = Env::new();
    let type0 = Term::sort(Level::succ(Level::Zero));
    for name in ["Nat", "Bool"] {
        env.add_inductive(InductiveDecl::new(name.to_string(), type0.clone(), vec![]))
            .expect("Failed to add inductive");
    }
    env
}

fn declare(env: &mut Env, name: &str, ty: &str) {
    let ty = parse_term(ty).expect("Failed to parse");
    let univ_params: &[&str] = if ty.mentions_univ_param("u") { &["u"] } else { &[] };
    let def = Definition::axiom(name.to_string(), ty).with_univ_params(univ_params.iter().copied());
    env.add_definition(def).expect("Failed to add declaration");
}

fn register(env: &Env, name: &str, persistent: bool) -> Env {
    add_user_recursor(env, name, None, persistent).expect("Failed to register")
}

#[test]
fn recursors_listed_in_registration_order() {
    let mut env = base_env();
    declare(&mut env, "Nat.rec2", NAT_REC);
    declare(&mut env, "Nat.rec1", NAT_REC);
    declare(&mut env, "Nat.indZero", NAT_IND_ZERO);
    declare(&mut env, "Bool.cases", BOOL_CASES);

    let env = register(&env, "Nat.rec2", false);
    let env = register(&env, "Bool.cases", false);
    let env = register(&env, "Nat.rec1", true);
    let env = register(&env, "Nat.indZero", false);

    assert_eq!(
        get_recursors_for(&env, "Nat"),
        vec!["Nat.rec2", "Nat.rec1", "Nat.indZero"]
    );
    assert_eq!(get_recursors_for(&env, "Bool"), vec!["Bool.cases"]);
    assert!(get_recursors_for(&env, "List").is_empty());
    assert_eq!(env.recursor_count(), 4);
}

#[test]
fn failed_registration_leaves_env_unchanged() {
    let mut env = base_env();
    declare(&mut env, "Nat.rec", NAT_REC);
    // (t : Nat) -> Nat : no motive
    declare(&mut env, "Nat.pred", "(pi (ind Nat) (ind Nat))");
    let env = register(&env, "Nat.rec", false);
    let generation = env.generation();

    assert!(add_user_recursor(&env, "Nat.pred", None, false).is_err());
    assert!(add_user_recursor(&env, "Nat.rec", None, false).is_err());
    assert_eq!(env.generation(), generation);
    assert_eq!(get_recursors_for(&env, "Nat"), vec!["Nat.rec"]);
    assert!(!is_user_recursor(&env, "Nat.pred"));
    assert_eq!(
        get_recursor_info(&env, "Nat.pred"),
        Err(RecursorError::NotARecursor("Nat.pred".to_string()))
    );
}

#[test]
fn earlier_environments_do_not_see_registrations() {
    let mut env = base_env();
    declare(&mut env, "Nat.rec", NAT_REC);
    let before = env.clone();
    let after = register(&env, "Nat.rec", true);

    assert!(is_user_recursor(&after, "Nat.rec"));
    assert!(!is_user_recursor(&before, "Nat.rec"));
    assert!(!is_user_recursor(&env, "Nat.rec"));
    assert!(after.generation() > env.generation());
}

#[test]
fn snapshot_matches_queries_at_construction() {
    let mut env = base_env();
    declare(&mut env, "Nat.rec", NAT_REC);
    declare(&mut env, "Bool.cases", BOOL_CASES);
    let env = register(&env, "Nat.rec", false);

    let pred = HasRecursorsPred::new(&env);
    for family in ["Nat", "Bool", "List"] {
        assert_eq!(
            pred.contains(family),
            !get_recursors_for(&env, family).is_empty(),
            "{family}"
        );
    }
    assert_eq!(pred.generation(), env.generation());

    let newer = register(&env, "Bool.cases", false);
    assert!(!pred.is_current_for(&newer));
    assert!(!pred.contains("Bool"));
    let rebuilt = HasRecursorsPred::new(&newer);
    assert!(rebuilt.contains("Bool"));
    assert!(rebuilt.is_current_for(&newer));
}

#[test]
fn snapshot_is_not_current_for_sibling_environment() {
    let mut env = base_env();
    declare(&mut env, "Nat.rec", NAT_REC);
    declare(&mut env, "Bool.cases", BOOL_CASES);

    // Two environments derived separately from the same parent.
    let with_nat = register(&env, "Nat.rec", false);
    let with_bool = register(&env, "Bool.cases", false);
    assert_ne!(with_nat.generation(), with_bool.generation());

    let pred = HasRecursorsPred::new(&with_nat);
    assert!(pred.contains("Nat"));
    assert!(pred.is_current_for(&with_nat));
    assert!(pred.is_current_for(&with_nat.clone()));
    assert!(!pred.is_current_for(&with_bool));
    assert!(!pred.is_current_for(&env));
}

#[test]
fn only_persistent_session_entries_are_exported() {
    let mut env = base_env();
    declare(&mut env, "Nat.rec", NAT_REC);
    declare(&mut env, "Nat.indZero", NAT_IND_ZERO);
    declare(&mut env, "Bool.cases", BOOL_CASES);
    let env = register(&env, "Nat.rec", true);
    let env = register(&env, "Nat.indZero", false);
    let env = register(&env, "Bool.cases", true);

    let bytes = export_recursors(&env).expect("export");
    let infos = decode_recursor_payload(&bytes)
        .expect("decode result")
        .expect("payload missing");
    let names: Vec<&str> = infos.iter().map(|info| info.name()).collect();
    assert_eq!(names, vec!["Nat.rec", "Bool.cases"]);

    // Re-exporting an importer does not forward imported entries.
    let importer = import_recursors(&base_env(), &bytes).expect("import");
    let forwarded = decode_recursor_payload(&export_recursors(&importer).expect("export"))
        .expect("decode result")
        .expect("payload missing");
    assert!(forwarded.is_empty());
}

#[test]
fn imports_come_before_session_registrations() {
    let mut module = base_env();
    declare(&mut module, "Nat.recA", NAT_REC);
    let module = register(&module, "Nat.recA", true);
    let bytes = export_recursors(&module).expect("export");

    let mut env = base_env();
    declare(&mut env, "Nat.recB", NAT_REC);
    let env = register(&env, "Nat.recB", false);
    let env = import_recursors(&env, &bytes).expect("import");

    assert_eq!(get_recursors_for(&env, "Nat"), vec!["Nat.recA", "Nat.recB"]);
    assert_eq!(
        get_recursor_info(&env, "Nat.recA"),
        get_recursor_info(&module, "Nat.recA")
    );
    assert!(HasRecursorsPred::new(&env).contains("Nat"));
}

#[test]
fn conflicting_imports_are_rejected() {
    let mut first = base_env();
    declare(&mut first, "Nat.elim", NAT_REC);
    let first = register(&first, "Nat.elim", true);

    let mut second = base_env();
    declare(&mut second, "Nat.elim", NAT_IND_ZERO);
    let second = register(&second, "Nat.elim", true);

    let env = import_recursors(&base_env(), &export_recursors(&first).expect("export"))
        .expect("import");
    // Same module again through another path.
    let env = import_recursors(&env, &export_recursors(&first).expect("export"))
        .expect("import again");
    assert_eq!(env.recursor_count(), 1);

    let err = import_recursors(&env, &export_recursors(&second).expect("export")).unwrap_err();
    assert_eq!(err, RecursorError::DuplicateRecursor("Nat.elim".to_string()));
}

#[test]
fn registering_an_imported_name_is_rejected() {
    let mut module = base_env();
    declare(&mut module, "Nat.rec", NAT_REC);
    let module = register(&module, "Nat.rec", true);

    let mut env = base_env();
    declare(&mut env, "Nat.rec", NAT_REC);
    let env = import_recursors(&env, &export_recursors(&module).expect("export")).expect("import");
    assert_eq!(
        add_user_recursor(&env, "Nat.rec", None, false).unwrap_err(),
        RecursorError::DuplicateRecursor("Nat.rec".to_string())
    );
}

#[test]
fn bytes_without_footer_import_nothing() {
    let env = base_env();
    let imported = import_recursors(&env, b"not a recursor payload").expect("import");
    assert_eq!(imported.recursor_count(), 0);
    assert_eq!(imported.generation(), env.generation());
}
