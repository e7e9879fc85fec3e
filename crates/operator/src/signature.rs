//! Compiler configuration that must survive persistence.

/// Target and flags a kernel is compiled with.
///
/// Part of the compilation cache key and of every operator envelope:
/// restoring an operator re-creates its kernel under the same signature
/// it was originally built with. The interpreter backend records flags
/// without acting on them, which keeps signatures comparable across
/// environments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilerSignature {
    pub target: String,
    pub flags: Vec<String>,
}

impl Default for CompilerSignature {
    fn default() -> Self {
        CompilerSignature {
            target: "core".into(),
            flags: vec!["-O3".into()],
        }
    }
}

impl CompilerSignature {
    pub fn new(
        target: impl Into<String>,
        flags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        CompilerSignature {
            target: target.into(),
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }
}
