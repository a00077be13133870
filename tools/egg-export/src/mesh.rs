//! Mesh converter (EGG -> .eggmesh)

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result, bail};
use egg_import::{
    FORMAT_COLOR, FORMAT_NORMAL, FORMAT_SKINNED, FORMAT_UV, Model, ParseOptions, Vertex,
    parse_model,
};

use crate::formats::{vertex_stride, write_egg_mesh};

/// Result of in-memory mesh conversion
#[derive(Debug, Clone)]
pub struct ConvertedMesh {
    pub format: u8,
    pub vertex_count: u32,
    /// Packed vertex data (vertex_count × stride bytes)
    pub vertex_data: Vec<u8>,
    pub indices: Vec<u32>,
}

/// Pack a parsed model's vertices and indices
pub fn convert_mesh_to_memory(model: &Model) -> Result<ConvertedMesh> {
    if model.vertices.is_empty() {
        bail!("Model has no vertices");
    }
    if model.indices.is_empty() {
        bail!("Model has no polygons");
    }

    let format = model.format;
    let mut vertex_data = Vec::with_capacity(model.vertices.len() * vertex_stride(format));
    for vertex in &model.vertices {
        pack_vertex(&mut vertex_data, vertex, format)?;
    }

    Ok(ConvertedMesh {
        format,
        vertex_count: model.vertices.len() as u32,
        vertex_data,
        indices: model.indices.clone(),
    })
}

fn push_f32s(out: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Append one vertex in the attribute order of the mesh format
fn pack_vertex(out: &mut Vec<u8>, vertex: &Vertex, format: u8) -> Result<()> {
    push_f32s(out, &vertex.position.to_array());
    if format & FORMAT_NORMAL != 0 {
        push_f32s(out, &vertex.normal.to_array());
    }
    if format & FORMAT_UV != 0 {
        push_f32s(out, &vertex.uv.to_array());
    }
    if format & FORMAT_COLOR != 0 {
        push_f32s(out, &vertex.color.to_array());
    }
    if format & FORMAT_SKINNED != 0 {
        let mut joints = [0u8; 4];
        for (slot, &joint) in joints.iter_mut().zip(&vertex.joints) {
            *slot = u8::try_from(joint)
                .with_context(|| format!("Joint index {} does not fit in a byte", joint))?;
        }
        out.extend_from_slice(&joints);
        push_f32s(out, &vertex.weights);
    }
    Ok(())
}

/// Convert an EGG model file to an EggMesh file
pub fn convert_egg_mesh(input: &Path, output: &Path, options: &ParseOptions) -> Result<()> {
    let model = parse_model(input, options)
        .with_context(|| format!("Failed to parse EGG model: {:?}", input))?;
    let mesh = convert_mesh_to_memory(&model)?;

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_egg_mesh(&mut writer, mesh.format, &mesh.vertex_data, &mesh.indices)?;

    tracing::info!(
        "Exported mesh: {} vertices, {} indices, format {:#06b}",
        mesh.vertex_count,
        mesh.indices.len(),
        mesh.format
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use egg_import::parse_model_str;

    const QUAD: &str = r#"
<Vertex> 1 { 0 0 0 <UV> { 0 0 } }
<Vertex> 2 { 1 0 0 <UV> { 1 0 } }
<Vertex> 3 { 1 1 0 <UV> { 1 1 } }
<Vertex> 4 { 0 1 0 <UV> { 0 1 } }
<Polygon> { <VertexRef> { 1 2 3 4 } }
"#;

    #[test]
    fn test_convert_quad() {
        let model = parse_model_str(QUAD, &ParseOptions::default()).unwrap();
        let mesh = convert_mesh_to_memory(&model).unwrap();
        assert_eq!(mesh.format, FORMAT_UV);
        assert_eq!(mesh.vertex_count, 4);
        assert_eq!(mesh.vertex_data.len(), 4 * vertex_stride(FORMAT_UV));
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);

        // Third vertex: position (1, 1, 0) then uv (1, 1)
        let v = &mesh.vertex_data[40..60];
        assert_eq!(&v[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&v[16..20], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_skinned_vertex_layout() {
        let mut vertex = Vertex::default();
        vertex.add_influence(3, 0.5);
        let mut out = Vec::new();
        pack_vertex(&mut out, &vertex, FORMAT_SKINNED).unwrap();
        assert_eq!(out.len(), vertex_stride(FORMAT_SKINNED));
        assert_eq!(&out[12..16], &[3, 0, 0, 0]);
        assert_eq!(&out[16..20], &0.5f32.to_le_bytes());
    }

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(convert_mesh_to_memory(&Model::default()).is_err());
    }
}
