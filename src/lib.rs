//! Exhaustive solver for Sokoban-style box-pushing puzzles.
//!
//! A game state is packed into a single integer: the rank of the sorted set of box fields
//! plus the player's connected region times the number of box placements. Visited states
//! live in two-level sparse bitmaps, and breadth-first history older than the last two
//! depths is spilled to a temporary file. Searches run on a rayon pool.
//!
//! ```no_run
//! use sokoban_solver::{solve, Level, SearchContext, SearchOptions};
//!
//! let level = Level::parse("#######\n#m o :#\n#######")?;
//! let ctx = SearchContext::new(level)?;
//! let outcome = solve(&ctx, &SearchOptions::default())?;
//! if let Some(solution) = outcome.solution() {
//!     println!("{} pushes", solution.num_pushes());
//! }
//! # Ok::<(), sokoban_solver::SolverError>(())
//! ```

pub mod bfs;
pub mod codec;
pub mod context;
pub mod dfs;
pub mod error;
pub mod fieldset;
pub mod indexer;
pub mod paged;
pub mod playfield;
pub mod record_log;
pub mod search;

pub use codec::{Config, Successor};
pub use context::SearchContext;
pub use error::{FormatError, SolverError};
pub use playfield::{Direction, FieldId, Level, NO_FIELD};
pub use search::{
    breadth_first, depth_first, explain_path, replay, solve, BoardRenderer, Push, SearchOptions,
    SearchOutcome, Solution,
};
