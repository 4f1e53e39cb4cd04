//! Game states and their configuration numbers.
//!
//! A state is identified by the ranked subset of box fields plus the id of the connected
//! component the player stands in:
//!
//! ```text
//! number = rank(boxes) + component * C(n_pos, n_box)
//! ```
//!
//! Component ids come from a flood fill that numbers components in order of their lowest
//! field id, so the number only depends on the box fields and the player's region.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::context::SearchContext;
use crate::fieldset::FieldSet;
use crate::playfield::{BoxVec, Direction, FieldId, Level, NO_FIELD};

const NO_COMPONENT: u32 = u32::MAX;

/// A legal push: the resulting configuration and the index of the pushed box in the new
/// (sorted) box order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Successor {
    pub number: u64,
    pub moved_box: usize,
}

/// A materialized state. Cheap enough to rebuild from its number whenever needed.
#[derive(Clone, Debug)]
pub struct Config<'a> {
    ctx: &'a SearchContext,
    number: u64,
    boxes: BoxVec,
    occupied: FieldSet,
    components: Vec<u32>,
}

impl<'a> Config<'a> {
    /// The level's start position.
    pub fn initial(ctx: &'a SearchContext) -> Self {
        let level = ctx.level();
        let boxes: BoxVec = level.initial_boxes().into();
        let occupied = FieldSet::from_fields(level.n_fields(), &boxes);
        let mut components = Vec::new();
        label_components(level, &occupied, &mut components, NO_FIELD);
        let component = components[level.initial_player() as usize] as u64;
        let number = ctx.indexer().rank(&boxes) + component * ctx.box_configs();
        Config { ctx, number, boxes, occupied, components }
    }

    pub fn from_number(ctx: &'a SearchContext, number: u64) -> Self {
        debug_assert!(number < ctx.num_configs());
        let level = ctx.level();
        let boxes = ctx.indexer().unrank(number % ctx.box_configs());
        let occupied = FieldSet::from_fields(level.n_fields(), &boxes);
        let mut components = Vec::new();
        label_components(level, &occupied, &mut components, NO_FIELD);
        Config { ctx, number, boxes, occupied, components }
    }

    pub fn context(&self) -> &'a SearchContext {
        self.ctx
    }

    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[inline]
    pub fn player_component(&self) -> u64 {
        self.number / self.ctx.box_configs()
    }

    /// Box fields in ascending order; a box is referred to by its index here.
    pub fn box_positions(&self) -> &[FieldId] {
        &self.boxes
    }

    #[inline]
    pub fn has_box(&self, pos: FieldId) -> bool {
        self.occupied.contains(pos)
    }

    /// Can the player walk to `pos` without pushing anything?
    #[inline]
    pub fn is_reachable(&self, pos: FieldId) -> bool {
        self.ctx.level().is_valid(pos)
            && self.components[pos as usize] as u64 == self.player_component()
    }

    pub fn is_solution(&self) -> bool {
        self.ctx.is_solution(self.number)
    }

    /// Pushes box `box_index` one field towards `dir`, if that is legal and does not put
    /// the box where it could never be moved again. The pushed state is built as a new
    /// value; `self` is never modified.
    pub fn next_config(&self, box_index: usize, dir: Direction) -> Option<Successor> {
        let level = self.ctx.level();
        let pos = self.boxes[box_index];
        let player_pos = level.neighbor(pos, dir.opposite());
        let dest = level.neighbor(pos, dir);

        if !self.is_reachable(player_pos)
            || !level.is_valid(dest)
            || self.occupied.contains(dest)
            || level.is_dead(dest)
        {
            return None;
        }

        let mut occupied = self.occupied.clone();
        occupied.remove(pos);
        occupied.insert(dest);
        if !level.is_goal(dest) {
            let mut path = FieldSet::with_fields(level.n_fields());
            if !can_be_emptied(level, &occupied, dest, &mut path) {
                return None;
            }
        }

        let mut boxes = self.boxes.clone();
        boxes.remove(box_index);
        let moved_box = boxes.partition_point(|&b| b < dest);
        boxes.insert(moved_box, dest);

        // After the push the player stands where the box was.
        let mut components = Vec::with_capacity(level.n_fields());
        label_components(level, &occupied, &mut components, pos);
        let component = components[pos as usize] as u64;

        Some(Successor {
            number: self.ctx.indexer().rank(&boxes) + component * self.ctx.box_configs(),
            moved_box,
        })
    }

    /// All legal pushes of one box.
    pub fn successors(&self, box_index: usize) -> ArrayVec<(Direction, Successor), 4> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.next_config(box_index, dir).map(|s| (dir, s)))
            .collect()
    }
}

/// Can the box on `pos` eventually be pushed away? True if the field is empty, or if both
/// fields on one axis can be emptied. `path` holds the fields under examination further up
/// the recursion and is restored before returning.
fn can_be_emptied(level: &Level, occupied: &FieldSet, pos: FieldId, path: &mut FieldSet) -> bool {
    if !level.is_valid(pos) {
        return false;
    }
    if !occupied.contains(pos) {
        return true;
    }
    if path.contains(pos) {
        return false;
    }
    path.insert(pos);
    let [left, up, right, down] = *level.neighbors(pos);
    let result = (can_be_emptied(level, occupied, left, path)
        && can_be_emptied(level, occupied, right, path))
        || (can_be_emptied(level, occupied, up, path) && can_be_emptied(level, occupied, down, path));
    path.remove(pos);
    result
}

/// Labels box-free fields with their connected component. Components are numbered in
/// order of their lowest field id. Labelling stops once `stop_at` has a label (pass
/// `NO_FIELD` to label everything). Returns the number of components labelled.
pub(crate) fn label_components(
    level: &Level,
    occupied: &FieldSet,
    labels: &mut Vec<u32>,
    stop_at: FieldId,
) -> u32 {
    let n_fields = level.n_fields();
    labels.clear();
    labels.resize(n_fields, NO_COMPONENT);
    let mut queue = VecDeque::with_capacity(n_fields);
    let mut count = 0;

    for start in 0..n_fields as FieldId {
        if labels[start as usize] != NO_COMPONENT || occupied.contains(start) {
            continue;
        }
        labels[start as usize] = count;
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            for &next in level.neighbors(pos) {
                if level.is_valid(next)
                    && labels[next as usize] == NO_COMPONENT
                    && !occupied.contains(next)
                {
                    labels[next as usize] = count;
                    queue.push_back(next);
                }
            }
        }
        count += 1;
        if stop_at != NO_FIELD && labels[stop_at as usize] != NO_COMPONENT {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(text: &str) -> SearchContext {
        SearchContext::new(Level::parse(text).unwrap()).unwrap()
    }

    const CORNER: &str = "\
######
# o  #
#    #
#m  :#
######
";

    const GOAL_CORNER: &str = "\
######
#:o  #
#    #
#m   #
######
";

    const TWO_BOXES: &str = "\
#######
#m    #
# o o #
#  :: #
#######
";

    const CORRIDOR: &str = "\
##########
#m o o ::#
##########
";

    const SQUARE: &str = "\
########
#      #
# oo   #
# o o  #
#      #
#m ::::#
########
";

    const SQUARE_ON_GOAL: &str = "\
########
#      #
# oo   #
# o:o  #
#      #
#m ::: #
########
";

    fn box_at(ctx: &SearchContext, conf: &Config<'_>, row: usize, col: usize) -> usize {
        let pos = ctx.level().field_at(row, col);
        conf.box_positions().iter().position(|&b| b == pos).unwrap()
    }

    #[test]
    fn closing_a_box_square_is_rejected_off_goal() {
        let ctx = context(SQUARE);
        let conf = ctx.initial_config();
        let last = box_at(&ctx, &conf, 3, 4);
        // The four boxes would only block each other.
        assert_eq!(conf.next_config(last, Direction::Left), None);
        assert!(conf.next_config(last, Direction::Right).is_some());
        assert!(conf.next_config(last, Direction::Down).is_some());
    }

    #[test]
    fn closing_a_box_square_onto_a_goal_is_accepted() {
        let ctx = context(SQUARE_ON_GOAL);
        let conf = ctx.initial_config();
        let last = box_at(&ctx, &conf, 3, 4);
        let succ = conf.next_config(last, Direction::Left).unwrap();
        let next = ctx.config(succ.number);
        assert!(next.has_box(ctx.level().field_at(3, 3)));
        assert!(!next.has_box(ctx.level().field_at(3, 4)));
    }

    #[test]
    fn push_into_empty_corner_is_rejected() {
        let ctx = context(CORNER);
        let conf = ctx.initial_config();
        assert_eq!(conf.next_config(0, Direction::Left), None);
        // No room behind the box to push it down, nothing above it to push it into.
        assert_eq!(conf.next_config(0, Direction::Down), None);
        assert_eq!(conf.next_config(0, Direction::Up), None);

        let right = conf.next_config(0, Direction::Right).unwrap();
        let next = ctx.config(right.number);
        assert_eq!(next.box_positions(), &[ctx.level().field_at(1, 3)]);
    }

    #[test]
    fn push_onto_goal_in_corner_is_accepted() {
        let ctx = context(GOAL_CORNER);
        let conf = ctx.initial_config();
        assert!(!conf.is_solution());
        let succ = conf.next_config(0, Direction::Left).unwrap();
        assert!(ctx.is_solution(succ.number));
        assert_eq!(succ.moved_box, 0);
    }

    #[test]
    fn box_blocked_by_unmovable_neighbor_is_rejected() {
        let ctx = context(CORRIDOR);
        let conf = ctx.initial_config();
        for b in 0..2 {
            assert!(conf.successors(b).is_empty());
        }
    }

    #[test]
    fn moved_box_index_follows_sort_order() {
        let ctx = context(TWO_BOXES);
        let level = ctx.level();
        let conf = ctx.initial_config();
        assert_eq!(conf.box_positions(), &[level.field_at(2, 2), level.field_at(2, 4)]);

        let up0 = conf.next_config(0, Direction::Up).unwrap();
        assert_eq!(up0.moved_box, 0);
        assert_eq!(
            ctx.config(up0.number).box_positions(),
            &[level.field_at(1, 2), level.field_at(2, 4)]
        );

        // The second box moves to a field numbered below the first one.
        let up1 = conf.next_config(1, Direction::Up).unwrap();
        assert_eq!(up1.moved_box, 0);
        assert_eq!(
            ctx.config(up1.number).box_positions(),
            &[level.field_at(1, 4), level.field_at(2, 2)]
        );

        assert!(conf.next_config(0, Direction::Down).is_some());
        assert!(conf.next_config(1, Direction::Left).is_some());
    }

    #[test]
    fn number_round_trips() {
        let ctx = context(TWO_BOXES);
        let start = ctx.initial_config();
        let mut numbers = vec![start.number()];
        for b in 0..ctx.n_boxes() {
            numbers.extend(start.successors(b).iter().map(|(_, s)| s.number));
        }
        for n in numbers {
            let conf = ctx.config(n);
            let again = ctx.config(conf.number());
            assert_eq!(again.number(), n);
            assert_eq!(again.box_positions(), conf.box_positions());
            assert_eq!(again.player_component(), conf.player_component());
            for f in 0..ctx.level().n_fields() as FieldId {
                assert_eq!(again.is_reachable(f), conf.is_reachable(f));
            }
        }
    }

    #[test]
    fn initial_number_matches_from_number() {
        let ctx = context(CORNER);
        let start = ctx.initial_config();
        let copy = ctx.config(start.number());
        assert_eq!(copy.box_positions(), start.box_positions());
        assert!(copy.is_reachable(ctx.level().initial_player()));
        assert!(!copy.is_reachable(ctx.level().field_at(1, 2)));
    }

    #[test]
    fn next_config_leaves_state_untouched() {
        let ctx = context(TWO_BOXES);
        let conf = ctx.initial_config();
        let number = conf.number();
        let boxes = conf.box_positions().to_vec();
        for _ in 0..3 {
            for b in 0..2 {
                for dir in Direction::ALL {
                    let _ = conf.next_config(b, dir);
                }
            }
        }
        assert_eq!(conf.number(), number);
        assert_eq!(conf.box_positions(), boxes.as_slice());
        assert_eq!(ctx.config(number).box_positions(), boxes.as_slice());
    }

    #[test]
    fn split_board_gives_player_its_own_component() {
        let ctx = context(CORRIDOR);
        let conf = ctx.initial_config();
        let level = ctx.level();
        assert!(conf.is_reachable(level.field_at(1, 2)));
        assert!(!conf.is_reachable(level.field_at(1, 4)));
        assert!(!conf.is_reachable(level.field_at(1, 7)));
        assert!(conf.has_box(level.field_at(1, 3)));
    }
}
