//! The OS dimension that `put_breakpoint` dispatches on.

/// Selects the encoding `put_breakpoint` emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetOs {
    Linux,
    Android,
    #[default]
    Other,
}
