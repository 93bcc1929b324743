//! Compute device abstraction
//!
//! Kernels are dispatched strictly in program order through a
//! [`DispatchScheduler`] that bounds the number of unsynchronized dispatches.
//! [`CpuDevice`] is the reference device: it runs every kernel on the calling
//! thread.

mod bindings;
mod cpu;
mod device;
mod kernel;
mod memory;
mod scheduler;

pub use bindings::{
    names, slots, DispatchContext, KernelParams, LightFeatures, UniformValue, Uniforms,
};
pub use cpu::CpuDevice;
pub use device::{ComputeDevice, DeviceStats};
pub use kernel::{ComputeKernel, KernelLibrary};
pub use memory::{DeviceBuffer, MemoryStats, MemoryTracker};
pub use scheduler::DispatchScheduler;
