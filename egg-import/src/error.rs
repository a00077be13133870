//! EGG parsing error and warning types

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal EGG parsing errors
#[derive(Debug, Error)]
pub enum EggError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected end of file while parsing {context}")]
    UnexpectedEof { context: &'static str },

    #[error("line {line}: unexpected end of block while parsing {context}")]
    UnexpectedEndOfBlock { line: usize, context: &'static str },

    #[error("line {line}: expected {expected}, found `{found}`")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: invalid number `{token}`")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: vertex reference {index} is out of range ({count} vertices, first index {base})")]
    VertexIndexOutOfRange {
        line: usize,
        index: i64,
        base: i64,
        count: usize,
    },

    #[error("line {line}: vertex reference before any <Vertex> declaration")]
    MissingVertexBase { line: usize },

    #[error("line {line}: polygon has {count} vertices (only triangles and quads are supported)")]
    UnsupportedPolygon { line: usize, count: usize },

    #[error("line {line}: skeleton has more than {max} joints")]
    TooManyJoints { line: usize, max: usize },

    #[error("line {line}: joint name `{name}` is longer than {max} bytes")]
    JointNameTooLong {
        line: usize,
        name: String,
        max: usize,
    },

    #[error("model has no skeleton; animations need a model with <Joint> data")]
    MissingSkeleton,

    #[error("no <Table> \"<skeleton>\" block found")]
    MissingSkeletonTable,

    #[error("line {line}: channels for joint `{joint}` appear before any fps declaration")]
    MissingFrameRate { line: usize, joint: String },

    #[error("line {line}: invalid frame rate `{value}`")]
    InvalidFrameRate { line: usize, value: String },

    #[error("line {line}: <Table> nesting deeper than {max} levels")]
    NestingTooDeep { line: usize, max: usize },
}

/// Result alias for EGG parsing
pub type Result<T> = std::result::Result<T, EggError>;

/// Non-fatal conditions reported while parsing
///
/// Each warning is also emitted through `tracing` when it is recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// A vertex already had all of its influence slots filled; the extra
    /// influence was discarded without renormalizing the others.
    DroppedInfluence {
        vertex: usize,
        joint: usize,
        weight: f32,
    },
    /// A membership weight of zero or below was ignored.
    IgnoredInfluence {
        vertex: usize,
        joint: usize,
        weight: f32,
    },
    /// An animation table named a joint the skeleton does not have.
    UnknownJoint { name: String },
    /// A later `fps` scalar disagreed with the frame count already allocated.
    FrameRateMismatch {
        joint: String,
        expected: u32,
        found: u32,
    },
    /// `<CoordinateSystem>` named a system without a converter.
    UnsupportedCoordinateSystem { name: String },
    /// A transform order string contained a code outside `srpht`.
    UnknownOrderCode { joint: String, code: char },
    /// An `<Xfm$Anim_S$>` table has channels but no `order`; none are applied.
    MissingOrder { joint: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::DroppedInfluence {
                vertex,
                joint,
                weight,
            } => write!(
                f,
                "vertex {} is influenced by more than 4 joints; dropped joint {} (weight {})",
                vertex, joint, weight
            ),
            ParseWarning::IgnoredInfluence {
                vertex,
                joint,
                weight,
            } => write!(
                f,
                "ignored non-positive weight {} of joint {} on vertex {}",
                weight, joint, vertex
            ),
            ParseWarning::UnknownJoint { name } => {
                write!(f, "animation table `{}` has no matching joint", name)
            }
            ParseWarning::FrameRateMismatch {
                joint,
                expected,
                found,
            } => write!(
                f,
                "joint `{}` declares fps {} but the animation already has {} frames",
                joint, found, expected
            ),
            ParseWarning::UnsupportedCoordinateSystem { name } => {
                write!(f, "unsupported coordinate system `{}`, using Y-Up", name)
            }
            ParseWarning::UnknownOrderCode { joint, code } => {
                write!(f, "joint `{}`: unknown transform order code `{}`", joint, code)
            }
            ParseWarning::MissingOrder { joint } => write!(
                f,
                "joint `{}` has channels but no transform order; its frames stay identity",
                joint
            ),
        }
    }
}
