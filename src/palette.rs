use anyhow::{bail, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uniform over the whole 24-bit space.
    pub(crate) fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let v: u32 = rng.gen_range(0..=0xFF_FFFF);
        Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("expected a color like #RRGGBB, got {s:?}");
        }
        let v = u32::from_str_radix(hex, 16).with_context(|| format!("bad hex color {s:?}"))?;
        Ok(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }
}

impl TryFrom<String> for Rgb {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

pub(crate) const BACKGROUND: Rgb = Rgb::new(0, 0, 0);
pub(crate) const FILLED: Rgb = Rgb::new(255, 255, 255);
pub(crate) const DEFAULT_ANT: Rgb = Rgb::new(255, 0, 0);

/// Display color per cell state. 0 is background, 1 its complement.
pub(crate) const PALETTE: [Rgb; 8] = [
    BACKGROUND,
    FILLED,
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
];
