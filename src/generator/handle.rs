use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

use super::request::GenerationRequest;
use super::traits::{ExclusiveGenerator, SharedGenerator};

/// Which execution discipline a generator requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Exclusive resource, strictly sequential use.
    Local,
    /// Shareable service, safe for concurrent use.
    #[default]
    Remote,
}

impl FromStr for GeneratorKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(GeneratorKind::Local),
            "remote" | "api" => Ok(GeneratorKind::Remote),
            _ => Err(EvalError::Config(format!("Unknown generator kind: {s}"))),
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Local => f.write_str("local"),
            GeneratorKind::Remote => f.write_str("remote"),
        }
    }
}

/// The generation capability an evaluation run drives.
///
/// The variant is fixed when the generator is built from configuration and
/// determines whether samples may be processed concurrently.
pub enum Generator {
    Local(Box<dyn ExclusiveGenerator>),
    /// The handle is cloned into every worker; implementations must be safe
    /// for concurrent use.
    Remote(Arc<dyn SharedGenerator>),
}

impl Generator {
    pub fn local(inner: impl ExclusiveGenerator + 'static) -> Self {
        Generator::Local(Box::new(inner))
    }

    pub fn remote(inner: impl SharedGenerator + 'static) -> Self {
        Generator::Remote(Arc::new(inner))
    }

    pub fn kind(&self) -> GeneratorKind {
        match self {
            Generator::Local(_) => GeneratorKind::Local,
            Generator::Remote(_) => GeneratorKind::Remote,
        }
    }

    /// Runs one generation through whichever variant this is.
    pub async fn generate(&mut self, request: &GenerationRequest) -> Result<String, EvalError> {
        match self {
            Generator::Local(inner) => inner.generate(request).await,
            Generator::Remote(inner) => inner.generate(request).await,
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Generator").field(&self.kind()).finish()
    }
}
