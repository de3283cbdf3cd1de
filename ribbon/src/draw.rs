// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw arguments, uniforms and the fixed function state of the line pipeline.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use ribbon_encoding::{Dimensions, IndexFormat};

use crate::low_level::{BufferProxy, PipelineProxy};
use crate::{Error, Result};

const FLOAT_BYTES: u64 = 4;

pub const ASPECT: &str = "aspect";
pub const THICKNESS: &str = "thickness";
pub const MITER_LIMIT: &str = "miter_limit";
pub const ADJUST_PROJECTED_THICKNESS: &str = "adjust_projected_thickness";
pub const MODEL: &str = "model";
pub const TINT: &str = "tint";

pub const PREV_POSITION: &str = "prev_position";
pub const CURR_POSITION: &str = "curr_position";
pub const NEXT_POSITION: &str = "next_position";
pub const OFFSET: &str = "offset";
pub const AUX: &str = "aux";
pub const COLOR: &str = "color";

/// Shader locations of the attributes the default shader reads.
/// Any other attribute gets a location after these, in name order.
const ATTRIBUTE_LOCATIONS: [&str; 6] =
    [PREV_POSITION, CURR_POSITION, NEXT_POSITION, OFFSET, AUX, COLOR];

/// Parameters of a single draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Size of the viewport in pixels. Its ratio is the `aspect` uniform.
    pub viewport: [f32; 2],
    /// Line width scale applied on top of the encoded half widths.
    pub thickness: f32,
    /// Longest miter allowed, as a multiple of the line width.
    pub miter_limit: f32,
    /// Transform to clip space, typically projection, view and model combined.
    pub model: Mat4,
    /// Multiplied with every vertex color.
    pub tint: [f32; 4],
    /// Keep the width constant in screen space under perspective.
    pub adjust_projected_thickness: bool,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            viewport: [1.0, 1.0],
            thickness: 1.0,
            miter_limit: 4.0,
            model: Mat4::IDENTITY,
            tint: [1.0; 4],
            adjust_projected_thickness: false,
        }
    }
}

impl DrawParams {
    pub fn aspect(&self) -> f32 {
        let [width, height] = self.viewport;
        if height == 0.0 {
            return 1.0;
        }
        width / height
    }
}

/// A field of [`DrawParams`] that feeds a uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawParam {
    Aspect,
    Thickness,
    MiterLimit,
    AdjustProjectedThickness,
    Model,
    Tint,
}

/// Source of a uniform value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Uniform {
    /// Read from the [`DrawParams`] of each draw.
    Param(DrawParam),
    Float(f32),
    Vec4([f32; 4]),
    Mat4(Mat4),
}

impl Uniform {
    fn float(&self, params: &DrawParams) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Param(DrawParam::Aspect) => Some(params.aspect()),
            Self::Param(DrawParam::Thickness) => Some(params.thickness),
            Self::Param(DrawParam::MiterLimit) => Some(params.miter_limit),
            Self::Param(DrawParam::AdjustProjectedThickness) => {
                Some(if params.adjust_projected_thickness { 1.0 } else { 0.0 })
            }
            _ => None,
        }
    }

    fn vec4(&self, params: &DrawParams) -> Option<[f32; 4]> {
        match self {
            Self::Vec4(value) => Some(*value),
            Self::Param(DrawParam::Tint) => Some(params.tint),
            _ => None,
        }
    }

    fn mat4(&self, params: &DrawParams) -> Option<Mat4> {
        match self {
            Self::Mat4(value) => Some(*value),
            Self::Param(DrawParam::Model) => Some(params.model),
            _ => None,
        }
    }
}

/// The uniform block shared by both shader stages.
#[derive(Copy, Clone, Debug, Default, Zeroable, Pod)]
#[repr(C)]
pub struct LineUniforms {
    pub model: [f32; 16],
    pub tint: [f32; 4],
    pub aspect: f32,
    pub thickness: f32,
    pub miter_limit: f32,
    pub adjust_projected_thickness: f32,
}

/// Buffer an attribute reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeBuffer {
    Position,
    Offset,
    Color,
    Aux,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub fn size(self) -> u64 {
        let components = match self {
            Self::Float32 => 1,
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
            Self::Float32x4 => 4,
        };
        components * FLOAT_BYTES
    }

    #[cfg(feature = "wgpu")]
    pub fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            Self::Float32 => wgpu::VertexFormat::Float32,
            Self::Float32x2 => wgpu::VertexFormat::Float32x2,
            Self::Float32x3 => wgpu::VertexFormat::Float32x3,
            Self::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// A vertex attribute: a strided view into one of the line buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub buffer: AttributeBuffer,
    /// Byte offset of the first element.
    pub offset: u64,
    /// Bytes between consecutive GPU vertices.
    pub stride: u64,
    pub format: VertexFormat,
}

impl Attribute {
    fn position(dimensions: Dimensions, slot_offset: u64) -> Self {
        let dims = dimensions.count() as u64;
        Self {
            buffer: AttributeBuffer::Position,
            offset: FLOAT_BYTES * dims * slot_offset,
            stride: FLOAT_BYTES * dims,
            format: match dimensions {
                Dimensions::Two => VertexFormat::Float32x2,
                Dimensions::Three => VertexFormat::Float32x3,
            },
        }
    }

    fn packed(buffer: AttributeBuffer, format: VertexFormat) -> Self {
        Self {
            buffer,
            offset: 0,
            stride: format.size(),
            format,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthState {
    pub enable: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CullState {
    pub enable: bool,
    pub face: Face,
}

impl CullState {
    #[cfg(feature = "wgpu")]
    pub fn to_wgpu(self) -> Option<wgpu::Face> {
        if !self.enable {
            return None;
        }
        Some(match self.face {
            Face::Front => wgpu::Face::Front,
            Face::Back => wgpu::Face::Back,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

#[cfg(feature = "wgpu")]
impl BlendFactor {
    fn to_wgpu(self) -> wgpu::BlendFactor {
        match self {
            Self::Zero => wgpu::BlendFactor::Zero,
            Self::One => wgpu::BlendFactor::One,
            Self::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            Self::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            Self::DstAlpha => wgpu::BlendFactor::DstAlpha,
            Self::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendState {
    pub enable: bool,
    pub equation: BlendEquation,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendState {
    #[cfg(feature = "wgpu")]
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        if !self.enable {
            return None;
        }
        let component = wgpu::BlendComponent {
            src_factor: self.src.to_wgpu(),
            dst_factor: self.dst.to_wgpu(),
            operation: match self.equation {
                BlendEquation::Add => wgpu::BlendOperation::Add,
                BlendEquation::Subtract => wgpu::BlendOperation::Subtract,
                BlendEquation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
            },
        };
        Some(wgpu::BlendState {
            color: component,
            alpha: component,
        })
    }
}

/// Everything that configures the line pipeline.
///
/// Built from per-dimension defaults and merged with [`DrawArgsOverrides`].
#[derive(Clone, Debug, PartialEq)]
pub struct DrawArgs {
    /// WGSL source of the vertex stage, entry point `vs_main`.
    pub vert: Cow<'static, str>,
    /// WGSL source of the fragment stage, entry point `fs_main`.
    pub frag: Cow<'static, str>,
    pub uniforms: BTreeMap<String, Uniform>,
    pub attributes: BTreeMap<String, Attribute>,
    pub depth: DepthState,
    pub cull: CullState,
    pub blend: BlendState,
}

/// Replacements for parts of the default [`DrawArgs`].
///
/// `uniforms` and `attributes` are merged key by key, every other field replaces the
/// default wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawArgsOverrides {
    pub vert: Option<Cow<'static, str>>,
    pub frag: Option<Cow<'static, str>>,
    pub uniforms: BTreeMap<String, Uniform>,
    pub attributes: BTreeMap<String, Attribute>,
    pub depth: Option<DepthState>,
    pub cull: Option<CullState>,
    pub blend: Option<BlendState>,
}

impl DrawArgs {
    /// The defaults for lines with `dimensions` components per position.
    pub fn new(dimensions: Dimensions) -> Self {
        let uniforms = [
            (ASPECT, DrawParam::Aspect),
            (THICKNESS, DrawParam::Thickness),
            (MITER_LIMIT, DrawParam::MiterLimit),
            (ADJUST_PROJECTED_THICKNESS, DrawParam::AdjustProjectedThickness),
            (MODEL, DrawParam::Model),
            (TINT, DrawParam::Tint),
        ]
        .into_iter()
        .map(|(name, param)| (name.to_owned(), Uniform::Param(param)))
        .collect();
        // Each raw slot spans two GPU vertices, so the neighbors are two vertices away.
        let attributes = [
            (PREV_POSITION, Attribute::position(dimensions, 0)),
            (CURR_POSITION, Attribute::position(dimensions, 2)),
            (NEXT_POSITION, Attribute::position(dimensions, 4)),
            (
                OFFSET,
                Attribute::packed(AttributeBuffer::Offset, VertexFormat::Float32),
            ),
            (
                AUX,
                Attribute::packed(AttributeBuffer::Aux, VertexFormat::Float32x2),
            ),
            (
                COLOR,
                Attribute::packed(AttributeBuffer::Color, VertexFormat::Float32x4),
            ),
        ]
        .into_iter()
        .map(|(name, attribute)| (name.to_owned(), attribute))
        .collect();
        Self {
            vert: Cow::Borrowed(ribbon_shaders::LINE_VERT),
            frag: Cow::Borrowed(ribbon_shaders::LINE_FRAG),
            uniforms,
            attributes,
            depth: DepthState { enable: true },
            cull: CullState {
                enable: true,
                face: Face::Back,
            },
            blend: BlendState {
                enable: true,
                equation: BlendEquation::Add,
                src: BlendFactor::SrcAlpha,
                dst: BlendFactor::OneMinusSrcAlpha,
            },
        }
    }

    pub fn merge(&mut self, overrides: DrawArgsOverrides) {
        let DrawArgsOverrides {
            vert,
            frag,
            uniforms,
            attributes,
            depth,
            cull,
            blend,
        } = overrides;
        if let Some(vert) = vert {
            self.vert = vert;
        }
        if let Some(frag) = frag {
            self.frag = frag;
        }
        self.uniforms.extend(uniforms);
        self.attributes.extend(attributes);
        if let Some(depth) = depth {
            self.depth = depth;
        }
        if let Some(cull) = cull {
            self.cull = cull;
        }
        if let Some(blend) = blend {
            self.blend = blend;
        }
    }

    fn uniform(&self, name: &str, param: DrawParam) -> Uniform {
        self.uniforms
            .get(name)
            .copied()
            .unwrap_or(Uniform::Param(param))
    }

    /// Evaluates the uniform block for one draw.
    pub fn resolve_uniforms(&self, params: &DrawParams) -> Result<LineUniforms> {
        let mismatch = |name: &str| Error::UnsupportedUniform {
            name: name.to_owned(),
        };
        let float = |name: &str, param| {
            self.uniform(name, param)
                .float(params)
                .ok_or_else(|| mismatch(name))
        };
        Ok(LineUniforms {
            model: self
                .uniform(MODEL, DrawParam::Model)
                .mat4(params)
                .ok_or_else(|| mismatch(MODEL))?
                .to_cols_array(),
            tint: self
                .uniform(TINT, DrawParam::Tint)
                .vec4(params)
                .ok_or_else(|| mismatch(TINT))?,
            aspect: float(ASPECT, DrawParam::Aspect)?,
            thickness: float(THICKNESS, DrawParam::Thickness)?,
            miter_limit: float(MITER_LIMIT, DrawParam::MiterLimit)?,
            adjust_projected_thickness: float(
                ADJUST_PROJECTED_THICKNESS,
                DrawParam::AdjustProjectedThickness,
            )?,
        })
    }

    /// Checks that every uniform has the type its slot in the uniform block needs.
    ///
    /// Uniform names the block has no slot for are reported and ignored.
    pub fn validate(&self) -> Result<()> {
        let known = [
            ASPECT,
            THICKNESS,
            MITER_LIMIT,
            ADJUST_PROJECTED_THICKNESS,
            MODEL,
            TINT,
        ];
        for name in self.uniforms.keys() {
            if !known.contains(&name.as_str()) {
                log::warn!("ignoring uniform `{name}`, the line uniform block has no slot for it");
            }
        }
        self.resolve_uniforms(&DrawParams::default()).map(|_| ())
    }

    /// Vertex buffer bindings in shader location order.
    pub fn vertex_bindings(&self) -> Vec<VertexBinding> {
        let mut next_location = ATTRIBUTE_LOCATIONS.len() as u32;
        let mut bindings: Vec<VertexBinding> = self
            .attributes
            .iter()
            .map(|(name, attribute)| {
                let known = ATTRIBUTE_LOCATIONS
                    .iter()
                    .position(|known| *known == name.as_str());
                let location = match known {
                    Some(location) => location as u32,
                    None => {
                        next_location += 1;
                        next_location - 1
                    }
                };
                VertexBinding {
                    location,
                    attribute: *attribute,
                }
            })
            .collect();
        bindings.sort_by_key(|binding| binding.location);
        bindings
    }

    /// Preprocesses both shader stages and collects the pipeline state.
    pub fn pipeline_descriptor(&self, dimensions: Dimensions) -> Result<PipelineDescriptor> {
        if self.vert.trim().is_empty() {
            return Err(Error::MissingShader("vertex"));
        }
        if self.frag.trim().is_empty() {
            return Err(Error::MissingShader("fragment"));
        }
        let mut defines = HashSet::new();
        if dimensions == Dimensions::Three {
            defines.insert(ribbon_shaders::DIMENSIONS_3.to_owned());
        }
        Ok(PipelineDescriptor {
            vert: ribbon_shaders::preprocess(&self.vert, "line_vert", &defines),
            frag: ribbon_shaders::preprocess(&self.frag, "line_frag", &defines),
            vertex_entry: ribbon_shaders::VERTEX_ENTRY,
            fragment_entry: ribbon_shaders::FRAGMENT_ENTRY,
            vertex_buffers: self.vertex_bindings(),
            depth: self.depth,
            cull: self.cull,
            blend: self.blend,
        })
    }
}

/// An attribute bound to a shader location. Each binding uses its own vertex buffer slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBinding {
    pub location: u32,
    pub attribute: Attribute,
}

/// Engine independent description of a render pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineDescriptor {
    /// Preprocessed WGSL.
    pub vert: String,
    pub frag: String,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub vertex_buffers: Vec<VertexBinding>,
    pub depth: DepthState,
    pub cull: CullState,
    pub blend: BlendState,
}

/// An indexed triangle list draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub pipeline: PipelineProxy,
    pub uniforms: BufferProxy,
    /// Buffer and byte offset for each of the pipeline's vertex buffer slots, in order.
    pub vertex_buffers: Vec<(BufferProxy, u64)>,
    pub index_buffer: BufferProxy,
    pub index_format: IndexFormat,
    pub index_count: u32,
}
