pub mod ast;
pub mod config;
pub mod env;
pub mod error;
pub mod parser;
pub mod payload;
pub mod recursor;
pub mod reduce;
pub mod registry;
pub mod telescope;

pub use ast::*;
pub use config::RecursorConfig;
pub use env::Env;
pub use error::{EnvError, RecursorError, RecursorResult, RecursorShapeError};
pub use payload::{export_recursors, import_recursors};
pub use recursor::{validate_recursor, validate_user_recursor, ArgumentRole, RecursorInfo};
pub use registry::{
    add_user_recursor, add_user_recursor_with_config, get_recursor_info, get_recursors_for,
    is_user_recursor, HasRecursorsPred,
};
