//! Search drivers.
//!
//! Breadth-first search expands one depth at a time and finds a solution with the fewest
//! pushes. Depth-first search explores up to a push bound and keeps the shortest solution
//! it sees. Both spread their work over the current rayon pool; all shared mutable state
//! sits behind a single lock per search.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{Scope, ThreadPoolBuilder};

use crate::bfs::{BfsQueue, Frontier};
use crate::codec::Config;
use crate::context::SearchContext;
use crate::dfs::{DepthMap, DfsStack, MAX_DFS_DEPTH};
use crate::error::SolverError;
use crate::playfield::{Direction, FieldId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Run a depth-first search bounded to this many pushes instead of a breadth-first one.
    pub max_depth: Option<u32>,
    /// Worker threads. `None` leaves the choice to rayon (`RAYON_NUM_THREADS` or one per core).
    pub threads: Option<usize>,
}

/// One step of a solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Push {
    /// Index of the pushed box in the sorted box order of the state before the push.
    pub box_index: usize,
    pub from: FieldId,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    /// Configuration numbers from the start state to a solved state.
    pub states: Vec<u64>,
    /// `pushes[i]` leads from `states[i]` to `states[i + 1]`.
    pub pushes: Vec<Push>,
}

impl Solution {
    pub fn num_pushes(&self) -> usize {
        self.pushes.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Solved(Solution),
    NoSolution,
}

impl SearchOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SearchOutcome::Solved(solution) => Some(solution),
            SearchOutcome::NoSolution => None,
        }
    }
}

/// Runs the search selected by `options` on a dedicated thread pool.
pub fn solve(ctx: &SearchContext, options: &SearchOptions) -> Result<SearchOutcome, SolverError> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(threads) = options.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;
    info!("Searching with {} threads", pool.current_num_threads());

    pool.install(|| match options.max_depth {
        Some(max_depth) => depth_first(ctx, max_depth),
        None => breadth_first(ctx),
    })
}

/// State of one BFS layer that workers update under the lock.
struct Layer<'q> {
    frontier: &'q mut Frontier,
    /// First solution found: its number and the read-generation index of its predecessor.
    goal: Option<(u64, u64)>,
}

/// Breadth-first search. A returned solution uses the fewest pushes possible.
pub fn breadth_first(ctx: &SearchContext) -> Result<SearchOutcome, SolverError> {
    let start = ctx.initial_config();
    if start.is_solution() {
        info!("Start position is solved");
        return explain_path(ctx, vec![start.number()]).map(SearchOutcome::Solved);
    }

    let mut queue = BfsQueue::new(ctx.num_configs())?;
    queue.lookup_and_add(start.number(), 0, 0);
    queue.push_depth()?;

    let n_boxes = ctx.n_boxes();
    let found = AtomicBool::new(false);

    while queue.length() > 0 {
        info!("depth {}: {}", queue.depth(), queue.length());

        let (read, frontier) = queue.split_layer();
        let layer = Mutex::new(Layer { frontier, goal: None });

        (0..read.len()).into_par_iter().for_each(|i| {
            if found.load(Ordering::Relaxed) {
                return;
            }
            let entry = read.get(i);
            let conf = ctx.config(entry.config);
            let last_box = entry.moved_box as usize;
            for b in 0..n_boxes {
                let box_index = (b + last_box) % n_boxes;
                for dir in Direction::ALL {
                    if found.load(Ordering::Relaxed) {
                        return;
                    }
                    let Some(succ) = conf.next_config(box_index, dir) else {
                        continue;
                    };
                    let mut guard = layer.lock();
                    if guard.frontier.lookup_and_add(succ.number, i, succ.moved_box)
                        && ctx.is_solution(succ.number)
                        && guard.goal.is_none()
                    {
                        guard.goal = Some((succ.number, i));
                        found.store(true, Ordering::Relaxed);
                    }
                }
            }
        });

        let goal = layer.into_inner().goal;
        if let Some((goal, pred)) = goal {
            let states = queue.get_path(goal, pred)?;
            queue.statistics();
            info!("Found solution with {} pushes", states.len() - 1);
            return explain_path(ctx, states).map(SearchOutcome::Solved);
        }

        queue.push_depth()?;
    }

    info!("No solution found");
    queue.statistics();
    Ok(SearchOutcome::NoSolution)
}

struct DfsShared {
    map: DepthMap,
    best: Option<Vec<u64>>,
    /// Paths with this many states or more cannot improve on `best`.
    bound: usize,
}

/// Depth-first search over paths of at most `max_depth` pushes. Returns the shortest
/// solution found within the bound.
pub fn depth_first(ctx: &SearchContext, max_depth: u32) -> Result<SearchOutcome, SolverError> {
    if max_depth > MAX_DFS_DEPTH {
        return Err(SolverError::DepthLimitTooLarge { requested: max_depth, max: MAX_DFS_DEPTH });
    }
    let bound = max_depth as usize + 1;
    let start = ctx.initial_config().number();

    let mut map = DepthMap::new();
    map.lookup_and_set(start, 1);
    let shared = Mutex::new(DfsShared { map, best: None, bound });

    rayon::scope(|s| visit(s, ctx, &shared, start, 0, DfsStack::new(bound)));

    let DfsShared { map, best, .. } = shared.into_inner();
    let visited = map.statistics();
    info!("Examined {} configurations", visited);
    match best {
        Some(states) => {
            info!("Found solution with {} pushes", states.len() - 1);
            explain_path(ctx, states).map(SearchOutcome::Solved)
        }
        None => {
            info!("No solution found");
            Ok(SearchOutcome::NoSolution)
        }
    }
}

/// Visits `number` on top of `stack` and spawns a task for each successor whose best
/// known depth improves.
fn visit<'s>(
    scope: &Scope<'s>,
    ctx: &'s SearchContext,
    shared: &'s Mutex<DfsShared>,
    number: u64,
    last_box: usize,
    mut stack: DfsStack,
) {
    stack.push(number);
    let depth = stack.len();

    if ctx.is_solution(number) {
        let mut shared = shared.lock();
        if shared.best.is_none() || depth < shared.bound {
            debug!("Found solution: {} pushes", depth - 1);
            shared.best = Some(stack.path().to_vec());
            shared.bound = depth;
        }
        return;
    }
    if depth >= shared.lock().bound {
        return;
    }

    let conf = ctx.config(number);
    let n_boxes = ctx.n_boxes();
    for b in 0..n_boxes {
        let box_index = (b + last_box) % n_boxes;
        for dir in Direction::ALL {
            let Some(succ) = conf.next_config(box_index, dir) else {
                continue;
            };
            // `depth + 1 <= bound <= MAX_DFS_DEPTH + 1` fits a byte.
            if shared.lock().map.lookup_and_set(succ.number, (depth + 1) as u8) {
                let stack = stack.clone();
                scope.spawn(move |s| visit(s, ctx, shared, succ.number, succ.moved_box, stack));
            }
        }
    }
}

/// Checks that `states` starts at the level's start position, ends solved and that each
/// state follows from the previous one by a single legal push, and names those pushes.
pub fn explain_path(ctx: &SearchContext, states: Vec<u64>) -> Result<Solution, SolverError> {
    if states.first() != Some(&ctx.initial_config().number()) {
        return Err(SolverError::InconsistentPath { step: 0 });
    }

    let mut pushes = Vec::with_capacity(states.len() - 1);
    for (step, pair) in states.windows(2).enumerate() {
        let conf = ctx.config(pair[0]);
        let push = (0..ctx.n_boxes()).find_map(|box_index| {
            conf.successors(box_index)
                .into_iter()
                .find(|(_, succ)| succ.number == pair[1])
                .map(|(direction, _)| Push {
                    box_index,
                    from: conf.box_positions()[box_index],
                    direction,
                })
        });
        pushes.push(push.ok_or(SolverError::InconsistentPath { step: step + 1 })?);
    }

    match states.last() {
        Some(&last) if ctx.is_solution(last) => Ok(Solution { states, pushes }),
        _ => Err(SolverError::InconsistentPath { step: states.len() - 1 }),
    }
}

/// Receives the states of a solution in order.
pub trait BoardRenderer {
    /// `push` is the push that led to `conf`, `None` for the start position.
    fn render(&mut self, step: usize, conf: &Config<'_>, push: Option<&Push>) -> io::Result<()>;
}

pub fn replay<R>(ctx: &SearchContext, solution: &Solution, renderer: &mut R) -> Result<(), SolverError>
where
    R: BoardRenderer + ?Sized,
{
    for (step, &number) in solution.states.iter().enumerate() {
        let conf = ctx.config(number);
        let push = step.checked_sub(1).and_then(|i| solution.pushes.get(i));
        renderer.render(step, &conf, push)?;
    }
    Ok(())
}
