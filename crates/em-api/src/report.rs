use std::fmt;

use em_core::CompileError;

use crate::EndermiteError;

/// User-facing summary of a failed build: where it failed and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub code: String,
    pub labels: Vec<String>,
    pub causes: Vec<String>,
}

impl BuildReport {
    pub fn from_compile_error(error: &CompileError) -> Self {
        let labels = error
            .label_chain()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut causes = Vec::new();
        let mut current = error.innermost_cause();
        if current.is_none() {
            causes.push(error.to_string());
        }
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }

        let code = match error.innermost_cause() {
            Some(cause) => cause
                .downcast_ref::<CompileError>()
                .map(|inner| inner.code().to_string())
                .unwrap_or_else(|| error.code().to_string()),
            None => error.code().to_string(),
        };

        Self {
            code,
            labels,
            causes,
        }
    }

    pub fn from_error(error: &EndermiteError) -> Self {
        match error {
            EndermiteError::Compile(error) => Self::from_compile_error(error),
            other => Self {
                code: other.code().to_string(),
                labels: Vec::new(),
                causes: vec![other.to_string()],
            },
        }
    }

    pub fn headline(&self) -> String {
        if self.labels.is_empty() {
            "Build failed".to_string()
        } else {
            format!("Couldn't build {}", self.labels.join(" > "))
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.headline(), self.code)?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}
