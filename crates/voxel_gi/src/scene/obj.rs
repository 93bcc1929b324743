//! Minimal Wavefront OBJ loader
//!
//! Reads `v`, `vn`, `vt` and `f` records. The `vt` set is taken as the
//! lightmap UV1 set. Polygons are fan-triangulated and every face corner
//! becomes its own vertex.

use std::fs;
use std::path::Path;

use crate::foundation::math::{Vec2, Vec3};
use crate::scene::{Mesh, SceneError};

/// Load an OBJ file from disk
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh, SceneError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let mesh = load_obj_str(&text)?;
    log::info!(
        "Loaded OBJ {:?}: {} vertices, {} triangles, uv1: {}",
        path,
        mesh.positions.len(),
        mesh.triangle_count(),
        mesh.has_uv1()
    );
    Ok(mesh)
}

/// Parse OBJ text
pub fn load_obj_str(text: &str) -> Result<Mesh, SceneError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut tex_coords = Vec::new();

    let mut out_positions = Vec::new();
    let mut out_normals = Vec::new();
    let mut out_uv1 = Vec::new();
    let mut indices = Vec::new();
    let mut every_corner_has_uv = true;

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => positions.push(parse_vec3(&parts, line_no)?),
            "vn" => normals.push(parse_vec3(&parts, line_no)?),
            "vt" => {
                let u = parse_float(parts.get(1), line_no)?;
                let v = parse_float(parts.get(2), line_no)?;
                tex_coords.push(Vec2::new(u, v));
            }
            "f" => {
                if parts.len() < 4 {
                    return Err(obj_error(line_no, "face needs at least 3 vertices"));
                }
                let mut face = Vec::with_capacity(parts.len() - 1);
                for corner in &parts[1..] {
                    let mut fields = corner.split('/');
                    let position = resolve_index(fields.next(), positions.len(), line_no)?
                        .ok_or_else(|| obj_error(line_no, "missing position index"))?;
                    let tex = resolve_index(fields.next(), tex_coords.len(), line_no)?;
                    let normal = resolve_index(fields.next(), normals.len(), line_no)?;

                    out_positions.push(positions[position]);
                    out_normals.push(normal.map_or_else(Vec3::zeros, |i| normals[i]));
                    match tex {
                        Some(i) => out_uv1.push(tex_coords[i]),
                        None => {
                            every_corner_has_uv = false;
                            out_uv1.push(Vec2::zeros());
                        }
                    }
                    face.push((out_positions.len() - 1) as u32);
                }

                for i in 1..face.len() - 1 {
                    indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if indices.is_empty() {
        return Err(obj_error(0, "no faces found"));
    }

    fill_missing_normals(&out_positions, &mut out_normals, &indices);

    let uv1 = every_corner_has_uv.then_some(out_uv1);
    Mesh::new(out_positions, out_normals, uv1, indices)
}

/// Replace zero normals with the geometric normal of their triangle
fn fill_missing_normals(positions: &[Vec3], normals: &mut [Vec3], indices: &[u32]) {
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(&(positions[c] - positions[a]));
        let Some(face) = face.try_normalize(f32::EPSILON) else {
            continue;
        };
        for i in [a, b, c] {
            if normals[i].norm_squared() <= f32::EPSILON {
                normals[i] = face;
            }
        }
    }
}

fn parse_vec3(parts: &[&str], line: usize) -> Result<Vec3, SceneError> {
    Ok(Vec3::new(
        parse_float(parts.get(1), line)?,
        parse_float(parts.get(2), line)?,
        parse_float(parts.get(3), line)?,
    ))
}

fn parse_float(part: Option<&&str>, line: usize) -> Result<f32, SceneError> {
    let part = part.ok_or_else(|| obj_error(line, "missing component"))?;
    part.parse()
        .map_err(|_| obj_error(line, &format!("invalid number '{part}'")))
}

/// Resolve a 1-based (or negative, relative) OBJ index
fn resolve_index(field: Option<&str>, len: usize, line: usize) -> Result<Option<usize>, SceneError> {
    let Some(field) = field.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let raw: i64 = field
        .parse()
        .map_err(|_| obj_error(line, &format!("invalid index '{field}'")))?;
    let index = if raw < 0 { len as i64 + raw } else { raw - 1 };
    if index < 0 || index >= len as i64 {
        return Err(obj_error(line, &format!("index {raw} out of bounds")));
    }
    Ok(Some(index as usize))
}

fn obj_error(line: usize, message: &str) -> SceneError {
    SceneError::Obj {
        line,
        message: message.to_string(),
    }
}
