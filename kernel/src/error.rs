//! Error types for recursor validation and registration

use crate::recursor::ArgumentRole;
use thiserror::Error;

/// Result type for recursor operations
pub type RecursorResult<T> = Result<T, RecursorError>;

/// Why a declaration's type does not have the shape of a recursor.
///
/// Every variant names the candidate declaration so the message can be shown
/// to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecursorShapeError {
    #[error("invalid user defined recursor '{recursor}', its type must take at least one argument")]
    NotAFunction { recursor: String },

    /// `expected` describes the type the major premise should have.
    #[error("invalid user defined recursor '{recursor}', no argument is a major premise of {expected}")]
    MajorPremiseNotFound { recursor: String, expected: String },

    #[error("invalid user defined recursor '{recursor}', arguments at positions {positions:?} all have type '{type_name}', the major premise position must be given explicitly")]
    AmbiguousMajorPremise {
        recursor: String,
        type_name: String,
        positions: Vec<usize>,
    },

    #[error("invalid user defined recursor '{recursor}', argument #{argument} in the type of the major premise (position {major_position}) must be a bound argument")]
    ParamOrIndexNotVariable {
        recursor: String,
        major_position: usize,
        argument: usize,
    },

    #[error("invalid user defined recursor '{recursor}', result type must be a motive applied to the indices and, optionally, the major premise")]
    MotiveNotFound { recursor: String },

    #[error("invalid user defined recursor '{recursor}', arguments at positions {positions:?} could all be the motive")]
    AmbiguousMotive {
        recursor: String,
        positions: Vec<usize>,
    },

    #[error("invalid user defined recursor '{recursor}', motive at position {motive_position} must eliminate into Prop or into Sort u for a universe parameter u used nowhere else")]
    MotiveUniverseNotFree {
        recursor: String,
        motive_position: usize,
    },

    #[error("invalid user defined recursor '{recursor}', argument at position {position} must be the {expected}")]
    NonCanonicalLayout {
        recursor: String,
        position: usize,
        expected: ArgumentRole,
    },
}

/// Errors produced by the recursor registry and its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecursorError {
    #[error(transparent)]
    Shape(#[from] RecursorShapeError),

    #[error("'{0}' is not a user defined recursor")]
    NotARecursor(String),

    #[error("unknown declaration '{0}'")]
    UnknownDeclaration(String),

    #[error("recursor '{0}' is already registered")]
    DuplicateRecursor(String),

    #[error("position {position} is out of range for recursor '{recursor}' with {arity} arguments")]
    PositionOutOfRange {
        recursor: String,
        position: usize,
        arity: usize,
    },

    /// Error serializing or deserializing a recursor record
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unsupported recursor payload version: expected {expected}, got {actual}")]
    UnsupportedPayloadVersion { expected: u32, actual: u32 },

    #[error("invalid recursor payload: {0}")]
    InvalidPayload(String),
}

/// Errors raised while populating an environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("inductive '{0}' is already declared")]
    DuplicateInductive(String),
    #[error("definition '{0}' is already declared")]
    DuplicateDefinition(String),
}
