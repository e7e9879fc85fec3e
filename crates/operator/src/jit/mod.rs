//! Kernel compilation.
//!
//! The generated C dialect is small enough to execute directly: `build`
//! lexes and parses a kernel translation unit into a
//! [`program::KernelProgram`], and [`executor`] runs it with C
//! arithmetic semantics. Source text is the only input, so any process
//! holding an operator's source can rebuild its kernel, which is what
//! makes the persistence story work without shipping native artifacts.

pub mod program;

pub(crate) mod executor;

mod lexer;
mod parser;

use crate::error::{Error, Result};
use crate::signature::CompilerSignature;
use program::KernelProgram;

/// Targets this build can compile for.
pub const SUPPORTED_TARGETS: &[&str] = &["core"];

/// Compile kernel source under a signature.
///
/// Fails with [`Error::Recompilation`] for unknown targets and for
/// source that no longer lexes or parses; the caller decides whether
/// that is fatal.
pub(crate) fn build(source: &str, signature: &CompilerSignature) -> Result<KernelProgram> {
    if !SUPPORTED_TARGETS.contains(&signature.target.as_str()) {
        return Err(Error::Recompilation {
            target: signature.target.clone(),
            reason: "unknown compilation target".into(),
        });
    }
    let tokens = lexer::lex(source).map_err(|e| Error::Recompilation {
        target: signature.target.clone(),
        reason: e.to_string(),
    })?;
    parser::parse(&tokens).map_err(|e| Error::Recompilation {
        target: signature.target.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_target_is_rejected_before_lexing() {
        let signature = CompilerSignature::new("gpu-sm90", Vec::<String>::new());
        let err = build("not even source", &signature).unwrap_err();
        match err {
            Error::Recompilation { target, reason } => {
                assert_eq!(target, "gpu-sm90");
                assert!(reason.contains("unknown compilation target"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_source_reports_recompilation() {
        let err = build("@@@", &CompilerSignature::default()).unwrap_err();
        assert!(matches!(err, Error::Recompilation { .. }));
    }
}
