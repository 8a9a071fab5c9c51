//! Pure game rules: grid topology, line counting, and the deterministic
//! per-team question shuffle. Nothing in this module touches storage.

pub mod grid;
pub mod shuffle;

/// Number of completed lines a team needs before it is declared a winner.
pub const WIN_LINE_COUNT: u32 = 5;
