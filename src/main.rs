use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use log::info;

use sokoban_solver::{
    replay, solve, BoardRenderer, Config, FieldId, Level, Push, SearchContext, SearchOptions,
    SearchOutcome, SolverError, NO_FIELD,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the level file
    level_file: PathBuf,

    /// Search depth-first up to this many pushes instead of breadth-first
    max_depth: Option<u32>,

    /// Number of worker threads (defaults to RAYON_NUM_THREADS or one per core)
    #[clap(short, long)]
    threads: Option<usize>,

    /// Highlight boxes and reachable fields with ANSI colors
    #[clap(long)]
    color: bool,

    /// Only print the number of pushes, not every state
    #[clap(short, long)]
    quiet: bool,
}

const RED: &str = "\x1b[1;31m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[1;34m";
const CYAN: &str = "\x1b[1;36m";
const NORMAL: &str = "\x1b[0m";

/// Draws a state as text. Fields the player cannot reach are shown as `-`.
struct TextRenderer<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> TextRenderer<W> {
    fn cell(&mut self, conf: &Config<'_>, level: &Level, pos: FieldId) -> io::Result<()> {
        let reachable = conf.is_reachable(pos);
        let (color, symbol) = if pos == NO_FIELD {
            (NORMAL, '#')
        } else if level.is_goal(pos) {
            match (conf.has_box(pos), reachable) {
                (true, _) => (RED, 'O'),
                (false, true) => (BLUE, ':'),
                (false, false) => (CYAN, ':'),
            }
        } else if level.is_dead(pos) {
            (if reachable { YELLOW } else { CYAN }, '+')
        } else if conf.has_box(pos) {
            (RED, 'o')
        } else if reachable {
            (NORMAL, ' ')
        } else {
            (CYAN, '-')
        };
        if self.color {
            write!(self.out, "{color}{symbol}")
        } else {
            write!(self.out, "{symbol}")
        }
    }
}

impl<W: Write> BoardRenderer for TextRenderer<W> {
    fn render(&mut self, step: usize, conf: &Config<'_>, push: Option<&Push>) -> io::Result<()> {
        match push {
            Some(p) => writeln!(self.out, "Push {}: box {} {:?}", step, p.box_index, p.direction)?,
            None => writeln!(self.out, "Push {step}:")?,
        }
        writeln!(self.out, "Config {} (component {})", conf.number(), conf.player_component())?;
        let level = conf.context().level();
        for row in 0..level.height() {
            for col in 0..level.width() {
                self.cell(conf, level, level.field_at(row, col))?;
            }
            if self.color {
                write!(self.out, "{NORMAL}")?;
            }
            writeln!(self.out)?;
        }
        writeln!(self.out)
    }
}

fn run(args: &Args) -> Result<(), SolverError> {
    let text = fs::read_to_string(&args.level_file)?;
    let level = Level::parse(&text)?;
    let ctx = SearchContext::new(level)?;
    let options = SearchOptions { max_depth: args.max_depth, threads: args.threads };

    let start = Instant::now();
    let outcome = solve(&ctx, &options)?;
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match &outcome {
        SearchOutcome::Solved(solution) => {
            writeln!(out, "Found solution with {} pushes", solution.num_pushes())?;
            if !args.quiet {
                writeln!(out)?;
                let mut renderer = TextRenderer { out: &mut out, color: args.color };
                replay(&ctx, solution, &mut renderer)?;
            }
        }
        SearchOutcome::NoSolution => writeln!(out, "Found NO solution")?,
    }
    writeln!(out)?;
    writeln!(out, "Total time (s): {:.3}", elapsed.as_secs_f64())?;
    out.flush()?;
    info!("Done in {:?}", elapsed);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
