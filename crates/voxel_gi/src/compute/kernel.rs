//! Compute kernels and the kernel registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::compute::DispatchContext;
use crate::core::{BakeError, BakeResult};

/// One compute program, executed once per dispatch over a whole volume
pub trait ComputeKernel: Send + Sync {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Run the kernel against its bindings
    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()>;
}

/// Name to kernel registry
#[derive(Clone, Default)]
pub struct KernelLibrary {
    kernels: HashMap<&'static str, Arc<dyn ComputeKernel>>,
}

impl std::fmt::Debug for KernelLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelLibrary")
            .field("kernels", &self.names())
            .finish()
    }
}

impl KernelLibrary {
    /// Library without kernels
    pub fn empty() -> Self {
        Self::default()
    }

    /// Library holding every kernel the bake pipeline dispatches
    pub fn builtin() -> Self {
        let mut library = Self::empty();
        crate::kernels::register_builtin(&mut library);
        library
    }

    /// Add or replace a kernel
    pub fn register(&mut self, kernel: Arc<dyn ComputeKernel>) -> &mut Self {
        self.kernels.insert(kernel.name(), kernel);
        self
    }

    /// Remove a kernel, returning it
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ComputeKernel>> {
        self.kernels.remove(name)
    }

    /// Whether a kernel is registered
    pub fn contains(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    /// Look up a kernel
    pub fn get(&self, name: &str) -> BakeResult<Arc<dyn ComputeKernel>> {
        self.kernels.get(name).cloned().ok_or_else(|| {
            log::error!("Compute kernel '{}' is not registered", name);
            BakeError::KernelNotFound {
                name: name.to_string(),
            }
        })
    }

    /// Sorted kernel names
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.kernels.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
