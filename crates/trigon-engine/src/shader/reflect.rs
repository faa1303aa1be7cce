use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Handle, Module, ScalarKind, Type, TypeInner};

use crate::geometry::{ComponentType, VertexLayout};

use super::ShaderStage;

/// Scalar kind and component count of an interface variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotType {
    Float(u8),
    Sint(u8),
    Uint(u8),
    Bool(u8),
    /// Matrices, arrays and other types that cannot cross a stage boundary.
    Other,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scalar, n) = match *self {
            Self::Float(n) => ("f32", n),
            Self::Sint(n) => ("i32", n),
            Self::Uint(n) => ("u32", n),
            Self::Bool(n) => ("bool", n),
            Self::Other => return f.write_str("<unsupported type>"),
        };
        if n == 1 {
            f.write_str(scalar)
        } else {
            write!(f, "vec{n}<{scalar}>")
        }
    }
}

/// One user-defined `@location` binding of an entry point.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InterfaceSlot {
    pub location: u32,
    pub ty: SlotType,
}

/// What a compiled stage consumes and produces.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StageInterface {
    pub stage: ShaderStage,
    pub entry_point: String,
    /// Sorted by location. Built-ins are not listed.
    pub inputs: Vec<InterfaceSlot>,
    /// Sorted by location. Built-ins are not listed.
    pub outputs: Vec<InterfaceSlot>,
}

/// Parses and validates WGSL for one stage.
///
/// On failure the error is the front end's rendered diagnostic, with source
/// excerpts, ready to surface as a compile log.
pub fn compile_wgsl(stage: ShaderStage, source: &str) -> Result<StageInterface, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.to_naga())
        .ok_or_else(|| format!("error: source declares no @{stage} entry point"))?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_slots(&module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = entry.function.result.as_ref() {
        collect_slots(&module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    inputs.sort_by_key(|s| s.location);
    outputs.sort_by_key(|s| s.location);

    Ok(StageInterface {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
    })
}

/// Checks that two compiled stages and a vertex layout fit together.
///
/// - every vertex input is fed by a layout attribute of the same shape
/// - every fragment input is written by the vertex stage with the same type
/// - the fragment stage writes a color at location 0
///
/// All mismatches are reported, one per line.
pub fn check_link(
    vertex: &StageInterface,
    fragment: &StageInterface,
    layout: &VertexLayout,
) -> Result<(), String> {
    let mut problems = Vec::new();

    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        problems.push(format!(
            "error: cannot link a {} stage as vertex and a {} stage as fragment",
            vertex.stage, fragment.stage
        ));
    }

    for input in &vertex.inputs {
        match layout.attribute(input.location) {
            None => problems.push(format!(
                "error: vertex input @location({}) {} has no attribute in the vertex layout",
                input.location, input.ty
            )),
            Some(attr) => {
                let supplied = match attr.component_type {
                    ComponentType::Float32 => SlotType::Float(attr.components),
                };
                if supplied != input.ty {
                    problems.push(format!(
                        "error: vertex input @location({}) expects {} but the layout supplies {}",
                        input.location, input.ty, supplied
                    ));
                }
            }
        }
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|o| o.location == input.location) {
            None => problems.push(format!(
                "error: fragment input @location({}) {} is not written by the vertex stage",
                input.location, input.ty
            )),
            Some(output) if output.ty != input.ty => problems.push(format!(
                "error: fragment input @location({}) is {} but the vertex stage writes {}",
                input.location, input.ty, output.ty
            )),
            Some(_) => {}
        }
    }

    if !fragment.outputs.iter().any(|o| o.location == 0) {
        problems.push("error: fragment stage writes no @location(0) color output".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}

fn collect_slots(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<InterfaceSlot>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceSlot {
            location: *location,
            ty: slot_type(&module.types[ty].inner),
        }),
        Some(_) => {}
        // Unbound arguments/results are structs whose members carry the bindings.
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_slots(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn slot_type(inner: &TypeInner) -> SlotType {
    let (kind, components) = match inner {
        TypeInner::Scalar(scalar) => (scalar.kind, 1),
        TypeInner::Vector { size, scalar } => (scalar.kind, *size as u8),
        _ => return SlotType::Other,
    };

    match kind {
        ScalarKind::Float => SlotType::Float(components),
        ScalarKind::Sint => SlotType::Sint(components),
        ScalarKind::Uint => SlotType::Uint(components),
        ScalarKind::Bool => SlotType::Bool(components),
        _ => SlotType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ColorVertex, PositionVertex, Vertex};
    use crate::shader::ShaderSources;

    const BROKEN_FRAGMENT: &str = "@fragment\nfn fs_main() -> @location(0) vec4<f32> {\n    return vec4<f32>(1.0, 0.0, 0.0, 1.0)\n}\n";

    #[test]
    fn plain_sources_compile() {
        let sources = ShaderSources::plain();
        let vs = compile_wgsl(ShaderStage::Vertex, &sources.vertex).unwrap();
        let fs = compile_wgsl(ShaderStage::Fragment, &sources.fragment).unwrap();

        assert_eq!(vs.entry_point, "vs_main");
        assert_eq!(
            vs.inputs,
            vec![InterfaceSlot { location: 0, ty: SlotType::Float(3) }]
        );
        assert!(vs.outputs.is_empty());
        assert!(fs.inputs.is_empty());
        assert_eq!(fs.outputs[0].ty, SlotType::Float(4));
    }

    #[test]
    fn gradient_vertex_outputs_come_from_struct_members() {
        let sources = ShaderSources::gradient();
        let vs = compile_wgsl(ShaderStage::Vertex, &sources.vertex).unwrap();

        assert_eq!(vs.inputs.len(), 2);
        assert_eq!(
            vs.outputs,
            vec![InterfaceSlot { location: 0, ty: SlotType::Float(3) }]
        );
    }

    #[test]
    fn syntax_error_yields_nonempty_log() {
        let log = compile_wgsl(ShaderStage::Fragment, BROKEN_FRAGMENT).unwrap_err();
        assert!(!log.trim().is_empty());
    }

    #[test]
    fn source_without_stage_entry_point_fails() {
        let sources = ShaderSources::plain();
        let log = compile_wgsl(ShaderStage::Fragment, &sources.vertex).unwrap_err();
        assert!(log.contains("@fragment"));
    }

    #[test]
    fn matching_stages_link() {
        for (sources, layout) in [
            (ShaderSources::plain(), PositionVertex::layout()),
            (ShaderSources::gradient(), ColorVertex::layout()),
        ] {
            let vs = compile_wgsl(ShaderStage::Vertex, &sources.vertex).unwrap();
            let fs = compile_wgsl(ShaderStage::Fragment, &sources.fragment).unwrap();
            assert_eq!(check_link(&vs, &fs, &layout), Ok(()));
        }
    }

    #[test]
    fn fragment_input_without_vertex_output_fails_to_link() {
        let plain = ShaderSources::plain();
        let gradient = ShaderSources::gradient();
        let vs = compile_wgsl(ShaderStage::Vertex, &plain.vertex).unwrap();
        let fs = compile_wgsl(ShaderStage::Fragment, &gradient.fragment).unwrap();

        let log = check_link(&vs, &fs, &PositionVertex::layout()).unwrap_err();
        assert!(log.contains("fragment input @location(0)"));
    }

    #[test]
    fn vertex_input_missing_from_layout_fails_to_link() {
        let gradient = ShaderSources::gradient();
        let vs = compile_wgsl(ShaderStage::Vertex, &gradient.vertex).unwrap();
        let fs = compile_wgsl(ShaderStage::Fragment, &gradient.fragment).unwrap();

        let log = check_link(&vs, &fs, &PositionVertex::layout()).unwrap_err();
        assert!(log.contains("@location(1)"));
    }

    #[test]
    fn slot_types_render_like_wgsl() {
        assert_eq!(SlotType::Float(3).to_string(), "vec3<f32>");
        assert_eq!(SlotType::Uint(1).to_string(), "u32");
    }
}
