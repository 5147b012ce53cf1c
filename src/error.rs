//! Error types for the Ascend compiler
//!
//! These are the *hard* failures: conditions that put the input outside the
//! supported language subset and abort the run. Recoverable findings are
//! recorded as diagnostics instead (see [`crate::compiler::diagnostics`]).

use thiserror::Error;

/// Ascend compiler errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Front-end errors
    /// Syntax error encountered while scanning or parsing
    ///
    /// **Triggered by:** Malformed source text (unterminated string, missing brace)
    /// **Example:** `class Counter { count: U256;` (missing closing brace)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Unexpected end of file during parsing
    #[error("Unexpected end of file")]
    UnexpectedEof,

    // Analysis errors
    /// A syntax node kind the IR builders have no case for
    ///
    /// **Triggered by:** Constructs outside the supported subset
    /// **Example:** `new Foo()`, `a ? b : c`, `break`
    #[error("Unsupported construct at line {line}: {construct}")]
    UnsupportedConstruct {
        /// Description of the construct
        construct: String,
        /// Source line
        line: usize,
    },

    /// Reference to a struct or type name that does not exist
    #[error("Unknown type '{name}' at line {line}")]
    UnknownType {
        /// Type name as written
        name: String,
        /// Source line
        line: usize,
    },

    /// Reference to a variable, method or declaration that does not exist
    #[error("Undefined symbol '{name}' at line {line}")]
    UndefinedSymbol {
        /// Symbol name
        name: String,
        /// Source line
        line: usize,
    },

    /// A `*Factory` call whose arguments do not have the required shape
    ///
    /// **Triggered by:** Wrong argument count or non-literal arguments
    /// **Example:** `U256Factory.fromString(x)` where `x` is not a string literal
    #[error("Malformed {factory} call at line {line}: {reason}")]
    MalformedFactoryCall {
        /// Factory call target, e.g. `U256Factory.fromString`
        factory: String,
        /// Why the arguments were rejected
        reason: String,
        /// Source line
        line: usize,
    },

    // Source errors
    /// A source file could not be read
    #[error("Cannot read source '{path}': {reason}")]
    SourceUnavailable {
        /// Requested path
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// Validation failed in fail-fast mode; carries the rendered report
    #[error("Validation failed with {count} diagnostic(s):\n{report}")]
    ValidationFailed {
        /// Number of recorded diagnostics
        count: usize,
        /// All diagnostics rendered together
        report: String,
    },

    /// Internal compiler error
    #[error("Compiler error: {0}")]
    CompilerError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The input is outside the supported subset; nothing can be emitted
    Fatal,
    /// The input could be fixed and recompiled
    Recoverable,
}

impl ErrorSeverity {
    /// Process exit status the CLI reports for this severity
    pub fn exit_status(self) -> u8 {
        match self {
            ErrorSeverity::Recoverable => 1,
            ErrorSeverity::Fatal => 2,
        }
    }

    /// Prefix the CLI prints before the error message
    pub fn label(self) -> &'static str {
        match self {
            ErrorSeverity::Recoverable => "error",
            ErrorSeverity::Fatal => "fatal",
        }
    }
}

impl Error {
    /// Create a compiler error with a message
    pub fn compiler(msg: impl Into<String>) -> Self {
        Error::CompilerError(msg.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(construct: impl Into<String>, line: usize) -> Self {
        Error::UnsupportedConstruct {
            construct: construct.into(),
            line,
        }
    }

    /// Create a malformed-factory-call error
    pub fn malformed_factory(
        factory: impl Into<String>,
        reason: impl Into<String>,
        line: usize,
    ) -> Self {
        Error::MalformedFactoryCall {
            factory: factory.into(),
            reason: reason.into(),
            line,
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::UnsupportedConstruct { .. } => ErrorSeverity::Fatal,
            Error::CompilerError(_) => ErrorSeverity::Fatal,
            Error::MalformedFactoryCall { .. } => ErrorSeverity::Fatal,

            Error::SyntaxError { .. } => ErrorSeverity::Recoverable,
            Error::UnexpectedEof => ErrorSeverity::Recoverable,
            Error::ValidationFailed { .. } => ErrorSeverity::Recoverable,
            Error::SourceUnavailable { .. } => ErrorSeverity::Recoverable,

            _ => ErrorSeverity::Fatal,
        }
    }
}

/// Result type for Ascend operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message_carries_line() {
        let err = Error::unsupported("ternary expression", 12);
        assert_eq!(
            err.to_string(),
            "Unsupported construct at line 12: ternary expression"
        );
        assert_eq!(err.classify(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_validation_failed_is_recoverable() {
        let err = Error::ValidationFailed {
            count: 2,
            report: "a\nb".to_string(),
        };
        assert_eq!(err.classify(), ErrorSeverity::Recoverable);
        assert!(err.to_string().starts_with("Validation failed with 2"));
    }

    #[test]
    fn test_severity_picks_exit_status() {
        let ternary = Error::unsupported("ternary expression", 3);
        assert_eq!(ternary.classify().exit_status(), 2);
        assert_eq!(ternary.classify().label(), "fatal");
        assert_eq!(Error::UnexpectedEof.classify(), ErrorSeverity::Recoverable);

        let missing = Error::SourceUnavailable {
            path: "Base.ts".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(missing.classify().exit_status(), 1);
        assert_eq!(missing.classify().label(), "error");
    }
}
