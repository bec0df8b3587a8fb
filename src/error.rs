use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::page::AccessClass;

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error is attributed to in the user-facing diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Compile,
    Profile,
    Trace,
    References,
    Simulate,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Config => "config",
            Stage::Compile => "compile",
            Stage::Profile => "profile",
            Stage::Trace => "trace",
            Stage::References => "references",
            Stage::Simulate => "simulate",
            Stage::Report => "report",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("{0}")]
    Usage(#[from] pico_args::Error),

    #[error("file `{}` does not exist", path.display())]
    MissingResource { stage: Stage, path: PathBuf },

    #[error("`{tool}` exited with {status}: {stderr}")]
    ExternalTool {
        stage: Stage,
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("could not run `{tool}`: {source}")]
    Spawn {
        stage: Stage,
        tool: String,
        source: io::Error,
    },

    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        source: io::Error,
    },

    #[error("{source}")]
    Json {
        stage: Stage,
        source: serde_json::Error,
    },

    #[error("`{}` line {line}: `{text}` is not a hexadecimal page number", path.display())]
    MalformedReference {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("{class} reference stream is empty")]
    EmptyStream { class: AccessClass },
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Configuration(_) | Error::Usage(_) => Stage::Config,
            Error::MissingResource { stage, .. }
            | Error::ExternalTool { stage, .. }
            | Error::Spawn { stage, .. }
            | Error::Io { stage, .. }
            | Error::Json { stage, .. } => *stage,
            Error::MalformedReference { .. } => Stage::References,
            Error::EmptyStream { .. } => Stage::Simulate,
        }
    }

    pub fn io(stage: Stage, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io {
            stage,
            path,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_follows_variant() {
        let err = Error::Configuration("page size 3 is not a power of two".into());
        assert_eq!(err.stage(), Stage::Config);

        let err = Error::MissingResource {
            stage: Stage::Trace,
            path: "trace.log".into(),
        };
        assert_eq!(err.stage(), Stage::Trace);
        assert_eq!(err.to_string(), "file `trace.log` does not exist");

        let err = Error::EmptyStream {
            class: AccessClass::Data,
        };
        assert_eq!(err.stage(), Stage::Simulate);
        assert_eq!(err.to_string(), "data reference stream is empty");
    }

    #[test]
    fn external_tool_surfaces_stderr() {
        let err = Error::ExternalTool {
            stage: Stage::Compile,
            tool: "gcc".into(),
            status: "exit status: 1".into(),
            stderr: "main.c:1:1: error: expected ';'".into(),
        };
        assert_eq!(
            err.to_string(),
            "`gcc` exited with exit status: 1: main.c:1:1: error: expected ';'"
        );
    }
}
