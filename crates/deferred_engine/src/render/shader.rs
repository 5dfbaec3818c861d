//! Shader constant interface
//!
//! Shaders are compiled and owned by the backend. The binder only sets named
//! uniforms and raw constant-buffer bytes through [`Shader`].

use std::collections::HashMap;

use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Value of a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderConstant {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i32),
    /// Scalar
    Float(f32),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(Mat4),
}

/// A backend shader stage accepting constants
pub trait Shader {
    /// Set a named uniform
    fn set_constant(&mut self, name: &str, value: ShaderConstant);

    /// Upload raw bytes to the constant buffer at `slot`
    fn set_constant_buffer(&mut self, slot: u32, data: &[u8]);
}

/// Vertex and pixel stage of one shader program
pub struct ShaderClass<'a> {
    /// Vertex stage
    pub vertex: &'a mut dyn Shader,
    /// Pixel stage
    pub pixel: &'a mut dyn Shader,
}

impl<'a> ShaderClass<'a> {
    /// Pair two stages
    pub fn new(vertex: &'a mut dyn Shader, pixel: &'a mut dyn Shader) -> Self {
        Self { vertex, pixel }
    }
}

/// Shader stage that keeps the last value written to each constant
#[derive(Debug, Default, Clone)]
pub struct RecordedShader {
    constants: HashMap<String, ShaderConstant>,
    buffers: HashMap<u32, Vec<u8>>,
}

impl RecordedShader {
    /// Empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value of a named constant
    pub fn constant(&self, name: &str) -> Option<ShaderConstant> {
        self.constants.get(name).copied()
    }

    /// Last bytes uploaded to a constant buffer slot
    pub fn buffer(&self, slot: u32) -> Option<&[u8]> {
        self.buffers.get(&slot).map(Vec::as_slice)
    }

    /// Number of distinct named constants written
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.constants.clear();
        self.buffers.clear();
    }
}

impl Shader for RecordedShader {
    fn set_constant(&mut self, name: &str, value: ShaderConstant) {
        self.constants.insert(name.to_string(), value);
    }

    fn set_constant_buffer(&mut self, slot: u32, data: &[u8]) {
        self.buffers.insert(slot, data.to_vec());
    }
}
