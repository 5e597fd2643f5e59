//! Serialized job invocation payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// What to run when a recurring job fires.
///
/// Opaque to the scheduler beyond loading it: the job factory decides how a
/// type/method pair maps to real work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(rename = "Type")]
    pub job_type: String,
    #[serde(rename = "Method")]
    pub method: String,
    #[serde(rename = "Arguments", default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn new(job_type: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Load a stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::JobLoad`] when the payload is not valid JSON or
    /// names no job type.
    pub fn from_json(payload: &str) -> CoreResult<Self> {
        let invocation: Invocation =
            serde_json::from_str(payload).map_err(|e| CoreError::JobLoad(e.to_string()))?;
        if invocation.job_type.trim().is_empty() {
            return Err(CoreError::JobLoad("job type is empty".to_string()));
        }
        Ok(invocation)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|e| CoreError::JobLoad(e.to_string()))
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.job_type, self.method)
    }
}
