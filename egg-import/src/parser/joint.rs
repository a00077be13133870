//! Recursive `<Joint>` parsing

use glam::Mat4;
use tracing::debug;

use super::cursor::{Cursor, unexpected};
use super::{ParserState, parse_vertex_ref};
use crate::MAX_JOINT_NAME_LEN;
use crate::error::{EggError, ParseWarning, Result};
use crate::mesh::Vertex;
use crate::skeleton::SkeletonBuilder;

/// EGG's implicit membership when a `<VertexRef>` has no `membership` scalar
const DEFAULT_MEMBERSHIP: f32 = 1.0;

/// Parse `name { ... }` after a `<Joint>` tag and return the joint's index
///
/// Nested joints are parsed recursively with this joint as their parent, so
/// every child is appended after its parent.
pub(super) fn parse_joint(
    cursor: &mut Cursor<'_>,
    vertices: &mut [Vertex],
    skeleton: &mut SkeletonBuilder,
    state: &mut ParserState,
    parent: Option<usize>,
) -> Result<usize> {
    let name = cursor.expect_token("<Joint> name")?;
    if name.is_open() || name.is_close() {
        return Err(unexpected(name, "a joint name"));
    }
    let joint_name = name.unquoted();
    if joint_name.len() > MAX_JOINT_NAME_LEN {
        return Err(EggError::JointNameTooLong {
            line: name.line,
            name: joint_name.to_string(),
            max: MAX_JOINT_NAME_LEN,
        });
    }
    cursor.expect_open("<Joint> block")?;

    let index = skeleton.push(joint_name, parent, name.line)?;
    debug!("Joint {} `{}` (parent {:?})", index, joint_name, parent);

    loop {
        let token = cursor.expect_token("<Joint> block")?;
        match token.text {
            "}" => break,
            "{" => cursor.skip_block("<Joint> block")?,
            "<Transform>" => {
                if let Some(local) = parse_transform(cursor)? {
                    skeleton.set_local(index, state.geometry_mat4(local));
                }
            }
            "<VertexRef>" => {
                cursor.skip_to_open("<VertexRef> block")?;
                let vertex_ref = parse_vertex_ref(cursor, state, vertices.len())?;
                let weight = vertex_ref.membership.unwrap_or(DEFAULT_MEMBERSHIP);
                for vertex in vertex_ref.indices {
                    assign_influence(vertices, vertex, index, weight, state);
                }
            }
            "<Joint>" => {
                let child = parse_joint(cursor, vertices, skeleton, state, Some(index))?;
                debug_assert!(child > index, "child joint {} precedes parent {}", child, index);
            }
            // <DefaultPose>, <Scalar> ...
            _ if token.is_tag() => cursor.skip_tagged_block("<Joint> attribute")?,
            _ => return Err(unexpected(token, "a tag or `}`")),
        }
    }

    Ok(index)
}

/// `<Transform> { <Matrix4> { 16 values } }`
///
/// Returns the last matrix in the block. Componentwise transforms
/// (`<Translate>`, `<Rotate>`, ...) are not interpreted.
fn parse_transform(cursor: &mut Cursor<'_>) -> Result<Option<Mat4>> {
    cursor.skip_to_open("<Transform> block")?;
    let mut matrix = None;
    loop {
        let token = cursor.expect_token("<Transform> block")?;
        match token.text {
            "}" => return Ok(matrix),
            "{" => cursor.skip_block("<Transform> block")?,
            "<Matrix4>" => {
                cursor.skip_to_open("<Matrix4> block")?;
                let values = cursor.read_fixed::<16>("<Matrix4> block")?;
                matrix = Some(Mat4::from_cols_array(&values));
            }
            _ if token.is_tag() => {
                debug!("Ignoring {} in joint transform (line {})", token.text, token.line);
                cursor.skip_tagged_block("<Transform> component")?;
            }
            _ => return Err(unexpected(token, "a transform component")),
        }
    }
}

fn assign_influence(
    vertices: &mut [Vertex],
    vertex: usize,
    joint: usize,
    weight: f32,
    state: &mut ParserState,
) {
    if weight > 0.0 {
        if !vertices[vertex].add_influence(joint as u32, weight) {
            state.warn(ParseWarning::DroppedInfluence {
                vertex,
                joint,
                weight,
            });
        }
    } else {
        state.warn(ParseWarning::IgnoredInfluence {
            vertex,
            joint,
            weight,
        });
    }
}
