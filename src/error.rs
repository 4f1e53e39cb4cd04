use std::io;

/// Malformed level text. Always raised before any search step.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("level has no rows")]
    Empty,
    #[error("no player")]
    NoPlayer,
    #[error("more than one player: ({0}, {1}) and ({2}, {3})")]
    MultiplePlayers(usize, usize, usize, usize),
    #[error("#Boxes != #Goals ({boxes} boxes, {goals} goals)")]
    BoxTargetMismatch { boxes: usize, goals: usize },
    #[error("unknown symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum SolverError {
    #[error("invalid level: {0}")]
    Format(#[from] FormatError),
    #[error("arithmetic overflow: {0} does not fit in 64 bits")]
    ArithmeticOverflow(&'static str),
    #[error("depth bound {requested} exceeds the supported maximum of {max} pushes")]
    DepthLimitTooLarge { requested: u32, max: u32 },
    #[error("invalid solution path at state {step}")]
    InconsistentPath { step: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
