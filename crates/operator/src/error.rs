//! Operator errors.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operator was built from no equations.
    #[error("operator has no equations")]
    EmptyOperator,

    /// Equations span carriers on different grids.
    #[error("equations reference carriers on incompatible grids")]
    IncompatibleGrids,

    /// Two distinct carriers share one name.
    #[error("distinct carriers share the name `{0}`")]
    DuplicateCarrier(String),

    /// A time shift on a carrier with no time axis.
    #[error("carrier `{0}` has no time axis but is accessed with a time shift")]
    TimeShiftWithoutAxis(String),

    /// Time carriers in one operator must agree on history mode and
    /// slot count.
    #[error("equations mix incompatible time histories")]
    MixedTimeModes,

    /// A space shift larger than the carrier's halo.
    #[error("space shift {shift} on axis {axis} exceeds halo width {halo} of `{function}`")]
    HaloExceeded {
        function: String,
        axis: usize,
        shift: i64,
        halo: usize,
    },

    /// Rebuilding the executable kernel failed. Raised at apply time;
    /// the operator itself stays inspectable.
    #[error("recompilation failed for target `{target}`: {reason}")]
    Recompilation { target: String, reason: String },

    /// A kernel parameter with no value at apply time.
    #[error("no value for parameter `{0}`")]
    MissingBinding(String),

    /// A binding whose dtype differs from the captured parameter.
    #[error("dtype mismatch for `{name}`: kernel expects {expected}, binding is {actual}")]
    DTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A binding whose storage shape differs from the captured
    /// parameter.
    #[error("shape mismatch for `{name}`: kernel expects {expected:?}, binding is {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// One carrier bound under two parameter names.
    #[error("carrier storage for `{0}` is bound more than once")]
    AliasedBinding(String),

    /// Kernel execution indexed outside a buffer.
    #[error("index {index} out of bounds for `{buffer}` of {len} elements")]
    OutOfBounds {
        buffer: String,
        index: i64,
        len: usize,
    },

    /// Integer division or remainder by zero during execution.
    #[error("integer division by zero in kernel")]
    DivisionByZero,

    /// A symbol the kernel references but nothing defines.
    #[error("kernel references undefined symbol `{0}`")]
    UnknownSymbol(String),
}
