//! Top-level model scan

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use tracing::debug;

use super::cursor::{Cursor, parse_f32, parse_index, unexpected};
use super::joint::parse_joint;
use super::{ParseOptions, ParserState, parse_coordinate_system, parse_vertex_ref};
use crate::error::{EggError, Result};
use crate::mesh::{Model, Vertex};
use crate::skeleton::SkeletonBuilder;
use crate::{FORMAT_COLOR, FORMAT_NORMAL, FORMAT_SKINNED, FORMAT_UV};

pub(super) fn parse(source: &str, options: &ParseOptions) -> Result<Model> {
    let mut cursor = Cursor::new(source);
    let mut state = ParserState::new(options);
    let mut model = Model::default();
    let mut skeleton: Option<SkeletonBuilder> = None;

    // Braces of containers this scan does not interpret (<Group>, <VertexPool>, ...)
    let mut open_blocks = 0usize;

    while let Some(token) = cursor.next() {
        match token.text {
            "{" => open_blocks += 1,
            "}" => {
                if open_blocks == 0 {
                    return Err(unexpected(token, "a tag"));
                }
                open_blocks -= 1;
            }
            "<CoordinateSystem>" => parse_coordinate_system(&mut cursor, &mut state)?,
            "<Texture>" => model.texture = Some(parse_texture(&mut cursor)?),
            "<Vertex>" => {
                let vertex = parse_vertex(&mut cursor, &mut state, &mut model.format)?;
                model.vertices.push(vertex);
            }
            "<Polygon>" => parse_polygon(&mut cursor, &state, &mut model, token.line)?,
            "<Joint>" => {
                model.format |= FORMAT_SKINNED;
                let builder = skeleton.get_or_insert_with(SkeletonBuilder::default);
                parse_joint(&mut cursor, &mut model.vertices, builder, &mut state, None)?;
            }
            // Group-level data this importer has no use for; their contents
            // carry no tags of interest.
            "<Comment>" | "<Material>" | "<Transform>" | "<DefaultPose>" | "<Dart>" => {
                cursor.skip_tagged_block("tagged block")?
            }
            _ => {}
        }
    }

    if open_blocks > 0 {
        return Err(EggError::UnexpectedEof {
            context: "group block",
        });
    }

    if let Some(builder) = skeleton {
        debug!("Resolving bind pose for {} joints", builder.len());
        model.skeleton = Some(Arc::new(builder.build()));
    }
    model.coordinate_system = state.coords;
    model.warnings = state.warnings;
    Ok(model)
}

/// `<Texture> name { "file" ... }`
fn parse_texture(cursor: &mut Cursor<'_>) -> Result<String> {
    cursor.skip_to_open("<Texture> block")?;
    let file = cursor.expect_token("<Texture> block")?;
    if file.is_close() {
        return Err(EggError::UnexpectedEndOfBlock {
            line: file.line,
            context: "<Texture> file name",
        });
    }
    // Texture attributes (<Scalar> wrap, ...) are not used
    cursor.skip_block("<Texture> block")?;
    Ok(file.unquoted().to_string())
}

/// `<Vertex> index { x y z [<Normal> {...}] [<UV> {...}] [<RGBA> {...}] }`
fn parse_vertex(cursor: &mut Cursor<'_>, state: &mut ParserState, format: &mut u8) -> Result<Vertex> {
    let index_token = cursor.expect_token("<Vertex> index")?;
    let index = parse_index(index_token)?;
    if state.first_vertex_index.is_none() {
        debug!("First vertex index is {}", index);
        state.first_vertex_index = Some(index);
    }

    cursor.expect_open("<Vertex> block")?;
    let position = Vec3::new(
        cursor.expect_f32("vertex position")?,
        cursor.expect_f32("vertex position")?,
        cursor.expect_f32("vertex position")?,
    );
    let mut vertex = Vertex::new(state.geometry_vec3(position));

    loop {
        let token = cursor.expect_token("<Vertex> block")?;
        match token.text {
            "}" => break,
            "{" => cursor.skip_block("<Vertex> block")?,
            "<Normal>" => {
                cursor.skip_to_open("<Normal> block")?;
                let [x, y, z] = cursor.read_fixed::<3>("<Normal> block")?;
                vertex.normal = state.geometry_vec3(Vec3::new(x, y, z));
                *format |= FORMAT_NORMAL;
            }
            "<UV>" => {
                cursor.skip_to_open("<UV> block")?;
                let [u, v] = cursor.read_fixed::<2>("<UV> block")?;
                vertex.uv = Vec2::new(u, v);
                *format |= FORMAT_UV;
            }
            "<RGBA>" => {
                cursor.skip_to_open("<RGBA> block")?;
                let rgba = cursor.read_numbers("<RGBA> block")?;
                if rgba.len() < 3 {
                    return Err(EggError::UnexpectedEndOfBlock {
                        line: cursor.line(),
                        context: "<RGBA> block",
                    });
                }
                vertex.color = Vec4::new(rgba[0], rgba[1], rgba[2], rgba.get(3).copied().unwrap_or(1.0));
                *format |= FORMAT_COLOR;
            }
            _ if token.is_tag() => cursor.skip_tagged_block("<Vertex> attribute")?,
            // A fourth (homogeneous) position component
            _ => {
                parse_f32(token)?;
            }
        }
    }

    Ok(vertex)
}

/// `<Polygon> { ... <VertexRef> { a b c [d] <Ref> { pool } } }`
///
/// Triangles are emitted as (a, b, c) and, for quads, (a, c, d).
fn parse_polygon(
    cursor: &mut Cursor<'_>,
    state: &ParserState,
    model: &mut Model,
    line: usize,
) -> Result<()> {
    cursor.skip_to_open("<Polygon> block")?;

    let mut refs = Vec::with_capacity(4);
    loop {
        let token = cursor.expect_token("<Polygon> block")?;
        match token.text {
            "}" => break,
            "{" => cursor.skip_block("<Polygon> block")?,
            "<VertexRef>" => {
                cursor.skip_to_open("<VertexRef> block")?;
                let vertex_ref = parse_vertex_ref(cursor, state, model.vertices.len())?;
                refs.extend(vertex_ref.indices);
            }
            // <TRef>, <MRef>, <Normal>, <BFace>, ...
            _ if token.is_tag() => cursor.skip_tagged_block("<Polygon> attribute")?,
            _ => return Err(unexpected(token, "a tag or `}`")),
        }
    }

    let refs: Vec<u32> = refs.into_iter().map(|i| i as u32).collect();
    match refs.as_slice() {
        &[a, b, c] => model.indices.extend_from_slice(&[a, b, c]),
        &[a, b, c, d] => model.indices.extend_from_slice(&[a, b, c, a, c, d]),
        _ => {
            return Err(EggError::UnsupportedPolygon {
                line,
                count: refs.len(),
            });
        }
    }
    Ok(())
}
