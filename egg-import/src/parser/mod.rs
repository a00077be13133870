//! EGG model and animation parsers
//!
//! - `model` - top-level model scan: coordinate system, texture, vertices, polygons
//! - `joint` - recursive `<Joint>` hierarchy and vertex memberships
//! - `anim` - recursive `<Table>` walk and per-frame pose synthesis
//! - `cursor` - token cursor with brace-scoped helpers

mod anim;
mod cursor;
mod joint;
mod model;


use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use tracing::{info, warn};

use crate::animation::Animation;
use crate::coords::CoordinateSystem;
use crate::error::{EggError, ParseWarning, Result};
use crate::mesh::Model;
use crate::tokenizer::Token;

use cursor::{Cursor, parse_index};

/// Settings shared by every parse call
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Directory that relative asset paths are resolved against
    pub root: PathBuf,
    /// Also convert vertex positions, normals and joint transforms when the
    /// file declares a Z-up coordinate system. Rotation axes of animation
    /// channels are always converted.
    pub convert_geometry: bool,
}

impl ParseOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            convert_geometry: false,
        }
    }

    pub fn with_geometry_conversion(mut self, convert: bool) -> Self {
        self.convert_geometry = convert;
        self
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// State scoped to a single parse call
pub(crate) struct ParserState {
    /// Index of the first `<Vertex>`; every vertex reference is relative to it
    first_vertex_index: Option<i64>,
    coords: CoordinateSystem,
    convert_geometry: bool,
    warnings: Vec<ParseWarning>,
}

impl ParserState {
    fn new(options: &ParseOptions) -> Self {
        Self {
            first_vertex_index: None,
            coords: CoordinateSystem::default(),
            convert_geometry: options.convert_geometry,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, warning: ParseWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn geometry_vec3(&self, v: Vec3) -> Vec3 {
        if self.convert_geometry {
            self.coords.convert_vec3(v)
        } else {
            v
        }
    }

    fn geometry_mat4(&self, m: Mat4) -> Mat4 {
        if self.convert_geometry {
            self.coords.change_basis(m)
        } else {
            m
        }
    }

    /// Turn a file vertex index into a position in the vertex list
    fn normalize_index(&self, token: Token<'_>, vertex_count: usize) -> Result<usize> {
        let index = parse_index(token)?;
        let base = self
            .first_vertex_index
            .ok_or(EggError::MissingVertexBase { line: token.line })?;
        index
            .checked_sub(base)
            .and_then(|relative| usize::try_from(relative).ok())
            .filter(|&relative| relative < vertex_count)
            .ok_or(EggError::VertexIndexOutOfRange {
                line: token.line,
                index,
                base,
                count: vertex_count,
            })
    }
}

/// `<CoordinateSystem> { name }`
fn parse_coordinate_system(cursor: &mut Cursor<'_>, state: &mut ParserState) -> Result<()> {
    cursor.expect_open("<CoordinateSystem> block")?;
    let name = cursor.expect_token("<CoordinateSystem> block")?;
    if name.is_close() {
        return Err(EggError::UnexpectedEndOfBlock {
            line: name.line,
            context: "<CoordinateSystem> block",
        });
    }
    cursor.expect_close("<CoordinateSystem> block")?;

    match CoordinateSystem::from_egg_name(name.unquoted()) {
        Some(coords) => state.coords = coords,
        None => state.warn(ParseWarning::UnsupportedCoordinateSystem {
            name: name.unquoted().to_string(),
        }),
    }
    Ok(())
}

/// Contents of a `<VertexRef>` block
struct VertexRef {
    /// Positions in the vertex list
    indices: Vec<usize>,
    /// `<Scalar> membership { w }`, only meaningful inside a `<Joint>`
    membership: Option<f32>,
}

/// Read the body of a `<VertexRef>` block whose `{` was already consumed
fn parse_vertex_ref(
    cursor: &mut Cursor<'_>,
    state: &ParserState,
    vertex_count: usize,
) -> Result<VertexRef> {
    let mut vertex_ref = VertexRef {
        indices: Vec::new(),
        membership: None,
    };
    loop {
        let token = cursor.expect_token("<VertexRef> block")?;
        match token.text {
            "}" => return Ok(vertex_ref),
            "{" => cursor.skip_block("<VertexRef> block")?,
            "<Scalar>" => {
                let name = cursor.expect_token("<Scalar> name")?;
                if name.unquoted() == "membership" {
                    cursor.expect_open("membership scalar")?;
                    vertex_ref.membership = Some(cursor.expect_f32("membership scalar")?);
                    cursor.expect_close("membership scalar")?;
                } else {
                    cursor.skip_tagged_block("<Scalar> block")?;
                }
            }
            // <Ref> { pool }
            _ if token.is_tag() => cursor.skip_tagged_block("<VertexRef> attribute")?,
            _ => vertex_ref
                .indices
                .push(state.normalize_index(token, vertex_count)?),
        }
    }
}

fn read_source(path: &Path, options: &ParseOptions) -> Result<String> {
    let full = options.resolve(path);
    std::fs::read_to_string(&full).map_err(|source| EggError::Io { path: full, source })
}

/// Parse an EGG model file located relative to `options.root`
pub fn parse_model(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Model> {
    let path = path.as_ref();
    let source = read_source(path, options)?;
    let model = parse_model_str(&source, options)?;
    info!(
        "Parsed model {:?}: {} vertices, {} triangles, {} joints",
        path,
        model.vertices.len(),
        model.triangle_count(),
        model.skeleton.as_ref().map(|s| s.len()).unwrap_or(0)
    );
    Ok(model)
}

/// Parse EGG model text
pub fn parse_model_str(source: &str, options: &ParseOptions) -> Result<Model> {
    model::parse(source, options)
}

/// Parse an EGG animation file against an already parsed model
///
/// Joint tables are matched to the model's skeleton by name.
pub fn parse_animation(
    path: impl AsRef<Path>,
    model: &Model,
    options: &ParseOptions,
) -> Result<Animation> {
    let path = path.as_ref();
    let source = read_source(path, options)?;
    let animation = parse_animation_str(&source, model, options)?;
    info!(
        "Parsed animation {:?}: {} frames at rate {}, {} joints",
        path,
        animation.frame_count(),
        animation.rate,
        animation.joint_count()
    );
    Ok(animation)
}

/// Parse EGG animation text against an already parsed model
pub fn parse_animation_str(source: &str, model: &Model, options: &ParseOptions) -> Result<Animation> {
    anim::parse(source, model, options)
}
