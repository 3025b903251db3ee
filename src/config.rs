//! Project configuration and parse options.
//!
//! A project may carry a `specweave.yaml` next to its root document:
//!
//! ```yaml
//! spec: api/openapi.yaml
//! output: dist/openapi.bundled.yaml
//! includes: [server]
//! codegen:
//!   only: [models, repositories]
//!   lint: true
//!   output: generated
//! ```
//!
//! Command-line flags override anything read from the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::inflater::InflateConfig;

/// Default root document name.
pub const DEFAULT_SPEC: &str = "openapi.yaml";

/// Default configuration file name.
pub const CONFIG_FILE: &str = "specweave.yaml";

/// Default recursion budget for nested property processing.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Code generation directives passed through to [`Spec`](crate::spec::Spec).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Generators to run; empty means all.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub only: Vec<String>,
    /// Fail generation on lint warnings.
    pub lint: bool,
    /// Output directory override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Contents of `specweave.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub spec: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub includes: Vec<String>,
    pub codegen: CodegenConfig,
}

impl ProjectConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// `NotFound`/`Io` if unreadable, `Parse` for malformed YAML.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let display = path.display().to_string();
        let data = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SpecError::NotFound {
                    path: display.clone(),
                }
            } else {
                SpecError::Io {
                    path: display.clone(),
                    source,
                }
            }
        })?;
        Self::from_slice(&data, &display)
    }

    /// Load `specweave.yaml` from `dir` if present, else defaults.
    ///
    /// # Errors
    ///
    /// As [`ProjectConfig::load`], except a missing file is not an error.
    pub fn discover(dir: &Path) -> Result<Self, SpecError> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Parse configuration text; `origin` is used in errors.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed YAML.
    pub fn from_slice(data: &[u8], origin: &str) -> Result<Self, SpecError> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(data).map_err(|source| SpecError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Root document path: `flag`, then the file's `spec`, then the default.
    pub fn spec_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.spec.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SPEC))
    }

    /// Includes: flags when any were given, else the file's list.
    pub fn includes(&self, flags: &[String]) -> Vec<String> {
        if flags.is_empty() {
            self.includes.clone()
        } else {
            flags.to_vec()
        }
    }

    /// Parse options derived from this configuration.
    pub fn parse_options(&self, includes: Vec<String>) -> ParseOptions {
        ParseOptions::default()
            .with_includes(includes)
            .with_codegen_only(self.codegen.only.clone())
            .with_codegen_lint(self.codegen.lint)
            .with_codegen_output(self.codegen.output.clone())
    }
}

/// Options threaded through one parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub includes: Vec<String>,
    pub codegen: CodegenConfig,
    pub inflate: InflateConfig,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            codegen: CodegenConfig::default(),
            inflate: InflateConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_codegen_only(mut self, only: Vec<String>) -> Self {
        self.codegen.only = only;
        self
    }

    pub fn with_codegen_lint(mut self, lint: bool) -> Self {
        self.codegen.lint = lint;
        self
    }

    pub fn with_codegen_output(mut self, output: Option<String>) -> Self {
        self.codegen.output = output;
        self
    }

    pub fn with_inflate(mut self, inflate: InflateConfig) -> Self {
        self.inflate = inflate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
