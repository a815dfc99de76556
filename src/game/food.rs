//! Food placement
//!
//! Rejection sampling is cheap on sparse boards; once the retry budget runs
//! out the free cells are enumerated and one is drawn uniformly, so a crowded
//! board still terminates.

use rand::Rng;
use rand::seq::SliceRandom;

use super::state::Position;

/// Random draws attempted before falling back to a full scan
pub const MAX_RANDOM_ATTEMPTS: usize = 32;

/// Pick a uniformly random cell of a `width` x `height` grid not in `avoid`.
///
/// Returns `None` only when every cell is taken.
pub fn place_food<R: Rng>(
    rng: &mut R,
    width: usize,
    height: usize,
    avoid: &[Position],
) -> Option<Position> {
    if width == 0 || height == 0 {
        return None;
    }

    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let x = rng.gen_range(0..width) as i32;
        let y = rng.gen_range(0..height) as i32;
        let pos = Position::new(x, y);

        if !avoid.contains(&pos) {
            return Some(pos);
        }
    }

    let free: Vec<Position> = (0..height as i32)
        .flat_map(|y| (0..width as i32).map(move |x| Position::new(x, y)))
        .filter(|pos| !avoid.contains(pos))
        .collect();

    free.choose(rng).copied()
}
