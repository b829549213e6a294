//! Configuration for the expression compiler.

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Compiler settings. Every field has a default so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Deepest parenthesis, call or operator nesting the parser accepts before
    /// failing with [`CompileError::TooDeep`].
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.max_depth == 0 {
            return Err(CompileError::InvalidConfig(
                "max_depth must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
