use crate::palette::Rgb;
use crate::rules::{RuleSet, MAX_COLORS, MIN_COLORS};
use anyhow::Result;

/// Ant colors offered when cycling the color field.
pub(crate) const ANT_PRESETS: [Rgb; 6] = [
    Rgb::new(255, 0, 0),
    Rgb::new(255, 140, 0),
    Rgb::new(50, 205, 50),
    Rgb::new(0, 191, 255),
    Rgb::new(255, 20, 147),
    Rgb::new(255, 215, 0),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    AntColor,
    White,
    Black,
    MultiColor,
    ColorCount,
}

const FIELDS: [Field; 5] = [
    Field::AntColor,
    Field::White,
    Field::Black,
    Field::MultiColor,
    Field::ColorCount,
];

/// Uncommitted edits. Nothing reaches the simulation until `commit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Draft {
    pub(crate) ant_color: Rgb,
    pub(crate) rules: RuleSet,
    cursor: usize,
}

impl Draft {
    pub(crate) fn new(rules: &RuleSet, ant_color: Rgb) -> Self {
        Self {
            ant_color,
            rules: rules.clone(),
            cursor: 0,
        }
    }

    pub(crate) fn field(&self) -> Field {
        FIELDS[self.cursor]
    }

    /// Color count is only reachable in multi-color mode.
    fn visible(&self) -> &'static [Field] {
        if self.rules.multi_color {
            &FIELDS
        } else {
            &FIELDS[..4]
        }
    }

    pub(crate) fn move_cursor(&mut self, by: i32) {
        let n = self.visible().len() as i32;
        self.cursor = (self.cursor as i32 + by).rem_euclid(n) as usize;
    }

    pub(crate) fn change(&mut self, by: i32) {
        match self.field() {
            Field::AntColor => {
                let i = ANT_PRESETS
                    .iter()
                    .position(|&c| c == self.ant_color)
                    .map(|i| i as i32 + by)
                    .unwrap_or(0);
                self.ant_color = ANT_PRESETS[i.rem_euclid(ANT_PRESETS.len() as i32) as usize];
            }
            Field::White => self.rules.white = self.rules.white.cycled(by),
            Field::Black => self.rules.black = self.rules.black.cycled(by),
            Field::MultiColor => {
                self.rules.multi_color = !self.rules.multi_color;
                if self.cursor >= self.visible().len() {
                    self.cursor = 0;
                }
            }
            Field::ColorCount => {
                let c = self.rules.color_count as i32 + by;
                self.rules.color_count = c.clamp(MIN_COLORS as i32, MAX_COLORS as i32) as u8;
            }
        }
    }

    pub(crate) fn commit(&self) -> Result<(RuleSet, Rgb)> {
        self.rules.validate()?;
        Ok((self.rules.clone(), self.ant_color))
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (i, f) in self.visible().iter().enumerate() {
            let mark = if i == self.cursor { '>' } else { ' ' };
            let value = match f {
                Field::AntColor => format!("ant color    {}", self.ant_color),
                Field::White => format!("on white     {}", self.rules.white.label()),
                Field::Black => format!("on black     {}", self.rules.black.label()),
                Field::MultiColor => format!(
                    "multi-color  {}",
                    if self.rules.multi_color { "on" } else { "off" }
                ),
                Field::ColorCount => format!("colors       {}", self.rules.color_count),
            };
            out.push(format!("{mark} {value}"));
        }
        out.push(String::new());
        out.push("↑/↓ select  ←/→ change  a apply".to_string());
        out.push("x randomize  Esc cancel".to_string());
        out
    }
}
