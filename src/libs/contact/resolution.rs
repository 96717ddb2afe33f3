/// Pairs up to this distance are compared at the finest resolution
pub const NEAR_MAX_DISTANCE: usize = 100_000;
/// Pairs up to this distance are compared at the middle resolution
pub const MID_MAX_DISTANCE: usize = 1_000_000;

/// Coarsening tier of a position pair, chosen by how far apart the positions are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resolution {
    Near,
    Mid,
    Far,
}

impl Resolution {
    /// ```
    /// use gcmap::libs::contact::Resolution;
    /// assert_eq!(Resolution::for_distance(0), Resolution::Near);
    /// assert_eq!(Resolution::for_distance(100_001), Resolution::Mid);
    /// assert_eq!(Resolution::for_distance(1_000_001), Resolution::Far);
    /// ```
    pub fn for_distance(distance: usize) -> Self {
        if distance <= NEAR_MAX_DISTANCE {
            Resolution::Near
        } else if distance <= MID_MAX_DISTANCE {
            Resolution::Mid
        } else {
            Resolution::Far
        }
    }

    pub fn window_len(&self) -> usize {
        match self {
            Resolution::Near => 10,
            Resolution::Mid => 100,
            Resolution::Far => 1_000,
        }
    }
}

/// Window length used to compare two positions `distance` apart.
pub fn decide(distance: usize) -> usize {
    Resolution::for_distance(distance).window_len()
}
