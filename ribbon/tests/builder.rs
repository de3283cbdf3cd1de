// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End to end tests of [`LineBuilder`], checked on the recordings it produces.

#![allow(clippy::missing_assert_message, reason = "Deferred")]

use std::f64::consts::PI;

use anyhow::{bail, Result};
use ribbon::low_level::{BufferUsage, Command, DrawCommand, PipelineDescriptor, Recording};
use ribbon::{
    names, AnyLineBuilder, BuilderOptions, Capabilities, Dimensions, DrawArgsOverrides,
    DrawParams, EncodingError, IndexFormat, LineBuilder, Planar, Spatial, Uniform,
};

fn options(buffer_size: usize) -> BuilderOptions {
    BuilderOptions {
        buffer_size,
        ..BuilderOptions::default()
    }
}

fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn upload<'a>(recording: &'a Recording, name: &str) -> Option<&'a [u8]> {
    recording.commands.iter().find_map(|command| match command {
        Command::Upload(buf, bytes) if buf.name == name => Some(bytes.as_slice()),
        _ => None,
    })
}

fn last_draw(recording: &Recording) -> Result<&DrawCommand> {
    match recording.commands.last() {
        Some(Command::Draw(draw)) => Ok(draw),
        other => bail!("expected a draw, got {other:?}"),
    }
}

fn pipeline(recording: &Recording) -> Result<&PipelineDescriptor> {
    for command in &recording.commands {
        if let Command::CreatePipeline(_, descriptor) = command {
            return Ok(descriptor);
        }
    }
    bail!("no pipeline was created")
}

#[test]
fn polyline_is_drawn_with_every_quad() -> Result<()> {
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(64))?;
    let mut ctx = lines.context();
    ctx.begin_path();
    ctx.move_to(0.0, 0.0)?;
    ctx.line_to(1.0, 0.0)?;
    ctx.line_to(1.0, 1.0)?;
    ctx.line_to(0.0, 1.0)?;
    ctx.stroke()?;

    let cursor = *lines.cursor();
    assert_eq!((cursor.vertex, cursor.element, cursor.quad), (6, 12, 3));
    assert_eq!(lines.paths().len(), 1);
    assert_eq!(lines.paths()[0].count, 4);
    assert!(lines.active_path().is_none());

    let recording = lines.draw(&DrawParams::default())?;
    let draw = last_draw(&recording)?;
    assert_eq!(draw.index_count, 18);
    assert_eq!(draw.index_format, IndexFormat::Uint16);
    Ok(())
}

#[test]
fn uploads_mirror_the_encoding() -> Result<()> {
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(32))?;
    lines.context().stroke_rect(-0.5, -0.5, 1.0, 1.0)?;
    let recording = lines.draw(&DrawParams {
        viewport: [200.0, 100.0],
        thickness: 3.0,
        ..DrawParams::default()
    })?;

    let Some(position) = upload(&recording, "position") else {
        bail!("positions were not uploaded");
    };
    assert_eq!(floats(position), lines.resources().position);
    let Some(indices) = upload(&recording, "indices") else {
        bail!("indices were not uploaded");
    };
    assert_eq!(indices, lines.resources().indices.as_bytes());

    let Some(uniforms) = upload(&recording, "uniforms") else {
        bail!("uniforms were not uploaded");
    };
    let uniforms = floats(uniforms);
    assert_eq!(uniforms.len(), 24);
    // Identity model, then the default white tint.
    assert_eq!(uniforms[0], 1.0);
    assert_eq!(uniforms[16..20], [1.0; 4]);
    assert_eq!(uniforms[20], 2.0);
    assert_eq!(uniforms[21], 3.0);
    assert_eq!(uniforms[22], 4.0);
    assert_eq!(uniforms[23], 0.0);
    Ok(())
}

#[test]
fn overrides_reach_the_pipeline() -> Result<()> {
    let mut overrides = DrawArgsOverrides::default();
    overrides
        .uniforms
        .insert(names::THICKNESS.to_owned(), Uniform::Float(5.0));
    overrides
        .uniforms
        .insert(names::TINT.to_owned(), Uniform::Vec4([1.0, 0.0, 0.0, 0.5]));
    overrides.depth = Some(ribbon::low_level::DepthState { enable: false });
    let options = BuilderOptions {
        buffer_size: 32,
        draw_args: Some(overrides),
    };
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options)?;
    assert_eq!(lines.draw_args().uniforms.len(), 6);

    let recording = lines.draw(&DrawParams {
        thickness: 1.0,
        ..DrawParams::default()
    })?;
    let descriptor = pipeline(&recording)?;
    assert!(!descriptor.depth.enable);
    assert!(descriptor.cull.enable);
    assert_eq!(descriptor.vertex_buffers.len(), 6);

    let Some(uniforms) = upload(&recording, "uniforms") else {
        bail!("uniforms were not uploaded");
    };
    let uniforms = floats(uniforms);
    assert_eq!(uniforms[16..20], [1.0, 0.0, 0.0, 0.5]);
    assert_eq!(uniforms[21], 5.0);
    Ok(())
}

#[test]
fn mismatched_override_is_rejected() {
    let mut overrides = DrawArgsOverrides::default();
    overrides
        .uniforms
        .insert(names::MODEL.to_owned(), Uniform::Float(1.0));
    let options = BuilderOptions {
        buffer_size: 32,
        draw_args: Some(overrides),
    };
    let result = LineBuilder::<Planar>::new(&Capabilities::default(), options);
    assert!(matches!(
        result,
        Err(ribbon::Error::UnsupportedUniform { name }) if name == names::MODEL
    ));
}

#[test]
fn spatial_lines() -> Result<()> {
    let mut lines = LineBuilder::<Spatial>::new(&Capabilities::default(), options(32))?;
    let mut ctx = lines.context();
    ctx.translate(0.0, 0.0, 1.0);
    ctx.begin_path();
    ctx.move_to(0.0, 0.0, 0.0)?;
    ctx.line_to(0.0, 2.0, 0.0)?;
    ctx.stroke()?;

    let position = &lines.resources().position;
    assert_eq!(position[..6], [0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    assert_eq!(position[12..15], [0.0, 2.0, 1.0]);
    // Arc length runs along the transformed segment.
    assert_eq!(lines.resources().aux[4..8], [1.0, 2.0, -1.0, 2.0]);

    let recording = lines.draw(&DrawParams::default())?;
    let descriptor = pipeline(&recording)?;
    assert!(!descriptor.vert.contains("#ifdef"));
    assert!(descriptor.vert.contains("vec3<f32>"));
    let curr = descriptor.vertex_buffers[1].attribute;
    assert_eq!((curr.offset, curr.stride), (4 * 3 * 2, 4 * 3));
    Ok(())
}

#[test]
fn index_width_follows_capabilities() -> Result<()> {
    let no_u32 = Capabilities { u32_indices: false };
    let lines = LineBuilder::<Planar>::new(&no_u32, options(8192))?;
    assert_eq!(lines.resources().indices.format(), IndexFormat::Uint16);

    let result = LineBuilder::<Planar>::new(&no_u32, options(10_000));
    assert!(matches!(
        result,
        Err(ribbon::Error::Encoding(
            EncodingError::IndexWidthUnsupported { capacity: 10_000 }
        ))
    ));

    let lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(10_000))?;
    assert_eq!(lines.resources().indices.format(), IndexFormat::Uint32);
    Ok(())
}

#[test]
fn misuse_is_reported() -> Result<()> {
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(4))?;
    let mut ctx = lines.context();
    assert_eq!(ctx.line_to(1.0, 1.0), Err(EncodingError::NoActivePath));
    assert_eq!(ctx.restore(), Err(EncodingError::EmptySaveStack));
    assert!(matches!(
        ctx.set_stroke_style("not a color"),
        Err(EncodingError::InvalidColor(_))
    ));

    ctx.begin_path();
    ctx.move_to(0.0, 0.0)?;
    ctx.line_to(1.0, 0.0)?;
    ctx.line_to(1.0, 1.0)?;
    let err = ctx.line_to(0.0, 1.0);
    assert!(matches!(err, Err(EncodingError::CapacityExceeded { .. })));
    assert_eq!(lines.cursor().vertex, 4);
    assert_eq!(lines.cursor().quad, 2);

    // Errors convert into the crate error with `?`.
    let converted: ribbon::Error = EncodingError::NoActivePath.into();
    assert!(matches!(
        converted,
        ribbon::Error::Encoding(EncodingError::NoActivePath)
    ));
    Ok(())
}

#[test]
fn arc_through_the_builder() -> Result<()> {
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(64))?;
    let mut ctx = lines.context();
    ctx.begin_path();
    ctx.arc(0.0, 0.0, 1.0, 0.0, PI, false)?;
    ctx.stroke()?;
    assert_eq!(lines.paths()[0].count, 10);
    assert_eq!(lines.cursor().quad, 9);
    let total = lines.paths()[0].total_length;
    assert!(total > 3.0 && total < PI);
    Ok(())
}

#[test]
fn reset_then_redraw() -> Result<()> {
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(64))?;
    lines.context().stroke_rect(0.0, 0.0, 1.0, 1.0)?;
    lines.draw(&DrawParams::default())?;

    lines.reset();
    assert_eq!(lines.cursor().vertex, 0);
    assert!(lines.paths().is_empty());
    let empty = lines.draw(&DrawParams::default())?;
    assert!(upload(&empty, "position").is_none());
    assert_eq!(last_draw(&empty)?.index_count, 0);

    lines.context().stroke_rect(0.0, 0.0, 2.0, 2.0)?;
    let recording = lines.draw(&DrawParams::default())?;
    assert!(upload(&recording, "position").is_some());
    Ok(())
}

#[test]
fn lifecycle_frees_what_it_created() -> Result<()> {
    let mut lines = LineBuilder::<Planar>::new(&Capabilities::default(), options(16))?;
    lines.context().stroke_rect(0.0, 0.0, 1.0, 1.0)?;
    let mut recording = lines.draw(&DrawParams::default())?;
    lines.resize(64)?;
    lines.reset();
    recording.commands.extend(lines.take_recording().commands);
    recording.commands.extend(lines.destroy().commands);

    let mut live = Vec::new();
    let mut pipelines = 0_i32;
    for command in recording.commands {
        match command {
            Command::CreateBuffer(buf) => live.push(buf.id),
            Command::FreeBuffer(buf) => {
                let Some(ix) = live.iter().position(|id| *id == buf.id) else {
                    bail!("freed unknown buffer {}", buf.name);
                };
                live.swap_remove(ix);
            }
            Command::Upload(buf, bytes) => {
                assert!(live.contains(&buf.id), "upload to freed {}", buf.name);
                assert!(bytes.len() as u64 <= buf.size);
                if buf.usage == BufferUsage::Uniform {
                    assert_eq!(bytes.len(), 96);
                }
            }
            Command::CreatePipeline(..) => pipelines += 1,
            Command::FreePipeline(_) => pipelines -= 1,
            Command::Draw(_) => {}
        }
    }
    assert!(live.is_empty());
    assert_eq!(pipelines, 0);
    Ok(())
}

#[test]
fn runtime_dimensions() -> Result<()> {
    let mut lines = AnyLineBuilder::new(3, &Capabilities::default(), options(32))?;
    assert_eq!(lines.dimensions(), Dimensions::Three);
    if let AnyLineBuilder::Spatial(spatial) = &mut lines {
        spatial.context().stroke_rect(0.0, 0.0, 1.0, 1.0)?;
    }
    let recording = lines.draw(&DrawParams::default())?;
    assert_eq!(last_draw(&recording)?.index_count, 24);
    assert!(!lines.destroy().is_empty());
    Ok(())
}
