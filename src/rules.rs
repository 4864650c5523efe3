use anyhow::{ensure, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub(crate) const MIN_COLORS: u8 = 2;
pub(crate) const MAX_COLORS: u8 = 8;

/// Quarter-turn applied to the ant's heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Turn {
    Right,
    Left,
    #[serde(rename = "180")]
    #[value(name = "180")]
    Around,
    None,
}

impl Turn {
    pub(crate) const ALL: [Turn; 4] = [Turn::Right, Turn::Left, Turn::Around, Turn::None];

    /// Steps clockwise, mod 4.
    pub(crate) fn delta(self) -> u8 {
        match self {
            Turn::Right => 1,
            Turn::Left => 3,
            Turn::Around => 2,
            Turn::None => 0,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Turn::Right => "right",
            Turn::Left => "left",
            Turn::Around => "180",
            Turn::None => "none",
        }
    }

    pub(crate) fn cycled(self, by: i32) -> Self {
        let i = Self::ALL.iter().position(|&t| t == self).unwrap_or(0) as i32;
        Self::ALL[(i + by).rem_euclid(Self::ALL.len() as i32) as usize]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RuleSet {
    pub(crate) white: Turn,
    pub(crate) black: Turn,
    pub(crate) multi_color: bool,
    pub(crate) color_count: u8,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            white: Turn::Right,
            black: Turn::Left,
            multi_color: false,
            color_count: 2,
        }
    }
}

impl RuleSet {
    /// Number of distinct cell states the engine cycles through.
    pub(crate) fn states(&self) -> u8 {
        if self.multi_color {
            self.color_count
        } else {
            2
        }
    }

    /// Turn delta for a cell currently in `state`.
    ///
    /// Multi-color mode ignores `white`/`black`: even states turn right,
    /// odd states turn left.
    pub(crate) fn delta_for(&self, state: u8) -> u8 {
        if self.multi_color {
            if state % 2 == 0 {
                Turn::Right.delta()
            } else {
                Turn::Left.delta()
            }
        } else if state == 0 {
            self.white.delta()
        } else {
            self.black.delta()
        }
    }

    /// Delta per state, indexed by cell state.
    pub(crate) fn turn_deltas(&self) -> Vec<u8> {
        (0..self.states()).map(|s| self.delta_for(s)).collect()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_COLORS..=MAX_COLORS).contains(&self.color_count),
            "color count must be between {MIN_COLORS} and {MAX_COLORS}, got {}",
            self.color_count
        );
        Ok(())
    }

    /// Fresh random rules. Color count only changes when multi-color is
    /// picked.
    pub(crate) fn randomized<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let white = Turn::ALL[rng.gen_range(0..Turn::ALL.len())];
        let black = Turn::ALL[rng.gen_range(0..Turn::ALL.len())];
        let multi_color = rng.gen_bool(0.5);
        let color_count = if multi_color {
            rng.gen_range(MIN_COLORS..=MAX_COLORS)
        } else {
            self.color_count
        };
        Self {
            white,
            black,
            multi_color,
            color_count,
        }
    }

    pub(crate) fn describe(&self) -> String {
        if self.multi_color {
            let turns: String = self
                .turn_deltas()
                .iter()
                .map(|&d| if d == Turn::Right.delta() { 'R' } else { 'L' })
                .collect();
            format!("multi x{} {}", self.color_count, turns)
        } else {
            format!("white→{} black→{}", self.white.label(), self.black.label())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn turn_vocabulary() {
        assert_eq!(Turn::Right.delta(), 1);
        assert_eq!(Turn::Left.delta(), 3);
        assert_eq!(Turn::Around.delta(), 2);
        assert_eq!(Turn::None.delta(), 0);
    }

    #[test]
    fn cycled_wraps_both_ways() {
        assert_eq!(Turn::Right.cycled(1), Turn::Left);
        assert_eq!(Turn::None.cycled(1), Turn::Right);
        assert_eq!(Turn::Right.cycled(-1), Turn::None);
    }

    #[test]
    fn binary_deltas_follow_white_black() {
        let r = RuleSet {
            white: Turn::Around,
            black: Turn::None,
            ..RuleSet::default()
        };
        assert_eq!(r.turn_deltas(), vec![2, 0]);
    }

    #[test]
    fn multi_color_uses_parity_and_ignores_white_black() {
        let r = RuleSet {
            white: Turn::None,
            black: Turn::None,
            multi_color: true,
            color_count: 5,
        };
        assert_eq!(r.turn_deltas(), vec![1, 3, 1, 3, 1]);
    }

    #[test]
    fn describe_lists_parity_turns() {
        let r = RuleSet {
            multi_color: true,
            color_count: 3,
            ..RuleSet::default()
        };
        assert_eq!(r.describe(), "multi x3 RLR");
        assert_eq!(RuleSet::default().describe(), "white→right black→left");
    }

    #[test]
    fn validate_color_range() {
        let mut r = RuleSet::default();
        assert!(r.validate().is_ok());
        r.color_count = 1;
        assert!(r.validate().is_err());
        r.color_count = 9;
        assert!(r.validate().is_err());
        r.color_count = 8;
        assert!(r.validate().is_ok());
    }

    #[test]
    fn serde_names_match_control_values() {
        let r = RuleSet {
            white: Turn::Around,
            black: Turn::Left,
            multi_color: true,
            color_count: 4,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"white\":\"180\""), "{json}");
        assert!(json.contains("\"black\":\"left\""), "{json}");
        let partial: RuleSet = serde_json::from_str(r#"{"white":"none"}"#).unwrap();
        assert_eq!(partial.white, Turn::None);
        assert_eq!(partial.black, Turn::Left);
    }

    #[test]
    fn randomized_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let base = RuleSet {
            color_count: 6,
            ..RuleSet::default()
        };
        let mut saw_multi = false;
        let mut saw_binary = false;
        for _ in 0..500 {
            let r = base.randomized(&mut rng);
            assert!(r.validate().is_ok());
            if r.multi_color {
                saw_multi = true;
            } else {
                saw_binary = true;
                assert_eq!(r.color_count, 6);
            }
        }
        assert!(saw_multi && saw_binary);
    }

    #[test]
    fn randomized_covers_every_turn_and_count() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut whites = Vec::new();
        let mut counts = Vec::new();
        for _ in 0..2000 {
            let r = RuleSet::default().randomized(&mut rng);
            whites.push(r.white);
            if r.multi_color {
                counts.push(r.color_count);
            }
        }
        for t in Turn::ALL {
            assert!(whites.contains(&t));
        }
        for c in MIN_COLORS..=MAX_COLORS {
            assert!(counts.contains(&c));
        }
    }
}
