//! Builder pattern for Dispatcher construction

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::job::JobSpecBuilder;
use crate::runtime::ContainerRuntime;

use super::executor::Dispatcher;

/// Builder for creating a Dispatcher with proper configuration
///
/// # Example
///
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .image("nipreps/fmriprep:latest")
///     .max_containers(4)
///     .runtime(runtime)
///     .spec_builder(spec_builder)
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    config: DispatchConfig,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    spec_builder: Option<Arc<dyn JobSpecBuilder>>,
}

impl DispatcherBuilder {
    /// Create a new dispatcher builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DispatchConfig::default(),
            runtime: None,
            spec_builder: None,
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the container image
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.config.image = image.into();
        self
    }

    /// Set the admission limit
    pub fn max_containers(mut self, max_containers: usize) -> Self {
        self.config.max_containers = max_containers;
        self
    }

    /// Set the container runtime
    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Set the job spec builder
    pub fn spec_builder(mut self, spec_builder: Arc<dyn JobSpecBuilder>) -> Self {
        self.spec_builder = Some(spec_builder);
        self
    }

    /// Build the dispatcher
    ///
    /// # Errors
    ///
    /// Returns an error if runtime or spec builder are not set, or if
    /// configuration validation fails.
    pub fn build(self) -> Result<Dispatcher> {
        let runtime = self
            .runtime
            .ok_or_else(|| DispatchError::missing_config("runtime"))?;

        let spec_builder = self
            .spec_builder
            .ok_or_else(|| DispatchError::missing_config("spec_builder"))?;

        self.config.validate()?;

        Ok(Dispatcher::new(self.config, runtime, spec_builder))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
