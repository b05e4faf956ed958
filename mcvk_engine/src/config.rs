//! Application configuration
//!
//! One [`Config`] value drives the whole startup: window geometry, validation
//! layers, logging threshold, lifecycle checks and the shader bytecode paths.

use std::path::PathBuf;
use crate::log::LogSeverity;

/// Validation-layer message severity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugSeverity {
    /// Only validation errors
    ErrorsOnly,
    /// Errors and warnings
    #[default]
    ErrorsAndWarnings,
    /// Everything, including informational and verbose messages
    All,
}

/// Engine and application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application name reported to the graphics API
    pub app_name: String,

    /// Window title
    pub window_title: String,

    /// Initial window width in pixels
    pub window_width: u32,

    /// Initial window height in pixels
    pub window_height: u32,

    /// Enable the validation layer and its debug messenger
    pub enable_validation: bool,

    /// Which validation messages reach the logger
    pub debug_severity: DebugSeverity,

    /// Enable construct/use/destroy ordering checks
    pub lifecycle_checks: bool,

    /// Messages below this severity are discarded
    pub min_log_severity: LogSeverity,

    /// Compiled vertex shader bytecode
    pub vertex_shader_path: PathBuf,

    /// Compiled fragment shader bytecode
    pub fragment_shader_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "mcvk".to_string(),
            window_title: "mcvk".to_string(),
            window_width: 500,
            window_height: 500,
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::default(),
            lifecycle_checks: cfg!(debug_assertions),
            min_log_severity: if cfg!(debug_assertions) {
                LogSeverity::Diagnostic
            } else {
                LogSeverity::Info
            },
            vertex_shader_path: PathBuf::from("shaders/vert.spv"),
            fragment_shader_path: PathBuf::from("shaders/frag.spv"),
        }
    }
}

impl Config {
    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    pub fn with_debug_severity(mut self, severity: DebugSeverity) -> Self {
        self.debug_severity = severity;
        self
    }

    pub fn with_lifecycle_checks(mut self, enabled: bool) -> Self {
        self.lifecycle_checks = enabled;
        self
    }

    pub fn with_min_log_severity(mut self, severity: LogSeverity) -> Self {
        self.min_log_severity = severity;
        self
    }

    /// Set both shader paths at once
    pub fn with_shaders(mut self, vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        self.vertex_shader_path = vertex.into();
        self.fragment_shader_path = fragment.into();
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
