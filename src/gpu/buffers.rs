use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::field::FieldParams;

/// Storage and uniform buffers the sieve shader reads
pub struct SieveBuffers {
    /// Encoded crossing flags, one f32 per position
    pub crossed_buffer: Buffer,
    /// Primes by rank (u32)
    pub primes_buffer: Buffer,
    /// Uniform buffer for field parameters
    pub params_buffer: Buffer,
    /// Axis size the storage buffers were sized for
    pub positions: u32,
}

/// Field parameters passed to the render shader (48 bytes, aligned to 16)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FieldUniform {
    // Axis info (16 bytes)
    pub n: u32,
    pub prime_count: u32,
    pub _padding0: [u32; 2],

    // Wavefront parameters (16 bytes)
    pub time: f32,
    pub step: f32,
    pub speed: f32,
    pub decay: f32,

    // Highlight (4 bytes + 12 padding)
    pub highlight_epsilon: f32,
    pub _padding1: [f32; 3],
}

impl FieldUniform {
    pub fn new(params: &FieldParams<'_>, time: f32) -> Self {
        Self {
            n: params.n,
            prime_count: params.primes.len() as u32,
            _padding0: [0, 0],
            time,
            step: params.step,
            speed: params.speed,
            decay: params.decay,
            highlight_epsilon: params.highlight_epsilon,
            _padding1: [0.0, 0.0, 0.0],
        }
    }
}

impl SieveBuffers {
    /// Create buffers sized for the given axis and upload the initial data
    pub fn new(device: &Device, queue: &Queue, encoded: &[f32], primes: &[u32]) -> Self {
        let positions = encoded.len() as u32;

        let crossed_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("crossed-buffer"),
            size: storage_size::<f32>(encoded.len()),
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let primes_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("primes-buffer"),
            size: storage_size::<u32>(primes.len()),
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field-params-buffer"),
            size: std::mem::size_of::<FieldUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        queue.write_buffer(&crossed_buffer, 0, bytemuck::cast_slice(encoded));
        queue.write_buffer(&primes_buffer, 0, bytemuck::cast_slice(primes));

        Self {
            crossed_buffer,
            primes_buffer,
            params_buffer,
            positions,
        }
    }

    /// Whether these buffers can hold a sieve of `n` positions
    pub fn fits(&self, n: u32) -> bool {
        self.positions == n
    }

    /// Upload a fresh encoded crossing buffer
    pub fn upload_crossed(&self, queue: &Queue, encoded: &[f32]) {
        debug_assert_eq!(encoded.len(), self.positions as usize);
        queue.write_buffer(&self.crossed_buffer, 0, bytemuck::cast_slice(encoded));
    }

    /// Update field parameters for this frame
    pub fn update_params(&self, queue: &Queue, params: &FieldParams<'_>, time: f32) {
        let uniform = FieldUniform::new(params, time);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

/// Byte size of a storage array; never zero since wgpu rejects empty bindings
fn storage_size<T>(len: usize) -> u64 {
    (len.max(1) * std::mem::size_of::<T>()) as u64
}
