/// Every level spans the same number of points.
pub const POINTS_PER_LEVEL: u32 = 100;

/// Level reached with `points`. Starts at 1.
pub fn level_for_points(points: u32) -> u32 {
    points / POINTS_PER_LEVEL + 1
}

/// Where a point total sits inside its level, for the dashboard's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub points: u32,
    pub level: u32,
    /// Points earned since the current level started.
    pub into_level: u32,
    /// Points still needed for the next level. Always in `1..=POINTS_PER_LEVEL`.
    pub remaining: u32,
}

impl LevelProgress {
    pub fn from_points(points: u32) -> Self {
        let into_level = points % POINTS_PER_LEVEL;
        Self {
            points,
            level: level_for_points(points),
            into_level,
            remaining: POINTS_PER_LEVEL - into_level,
        }
    }

    /// Fraction of the current level completed, in percent.
    pub fn percent(&self) -> u32 {
        self.into_level * 100 / POINTS_PER_LEVEL
    }

    /// A fixed-width text progress bar.
    pub fn bar(&self, width: usize) -> String {
        let filled = width * self.into_level as usize / POINTS_PER_LEVEL as usize;
        format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
    }
}

impl std::fmt::Display for LevelProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Level {} {} {}%\n\
             \t{} points, need {} points to next level",
            self.level,
            self.bar(20),
            self.percent(),
            self.points,
            self.remaining
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_is_level_one() {
        let progress = LevelProgress::from_points(0);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.into_level, 0);
        assert_eq!(progress.remaining, 100);
        assert!(progress.to_string().contains("need 100 points to next level"));
    }

    #[test]
    fn mid_level_totals() {
        let progress = LevelProgress::from_points(250);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.remaining, 50);
        assert_eq!(progress.percent(), 50);
        assert_eq!(progress.bar(10), "[#####-----]");
    }

    #[test]
    fn remaining_stays_within_one_level() {
        for points in 0..=1_000 {
            let progress = LevelProgress::from_points(points);
            assert!((1..=POINTS_PER_LEVEL).contains(&progress.remaining));
            assert_eq!(progress.remaining == POINTS_PER_LEVEL, points % POINTS_PER_LEVEL == 0);
        }
    }

    #[test]
    fn level_never_decreases() {
        let levels: Vec<u32> = (0..500).map(level_for_points).collect();
        assert!(levels.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
