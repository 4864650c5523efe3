use crate::palette::{Rgb, DEFAULT_ANT};
use crate::rules::{RuleSet, Turn};
use crate::scheduler::{MAX_SPEED, MIN_SPEED};
use anyhow::{ensure, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const MAX_CELL_SIZE: u32 = 16;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Langton's ant with custom turn rules, in the terminal")]
pub(crate) struct Args {
    /// settings file (defaults to the per-user config dir)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// steps per second; above 200 several steps run per frame
    #[arg(long)]
    pub(crate) speed: Option<u32>,

    /// turn taken on a white (0) cell
    #[arg(long, value_enum)]
    pub(crate) white: Option<Turn>,

    /// turn taken on a black (1) cell
    #[arg(long, value_enum)]
    pub(crate) black: Option<Turn>,

    /// cycle through several colors instead of black/white
    #[arg(long)]
    pub(crate) multi_color: bool,

    /// number of colors in multi-color mode (2..=8)
    #[arg(long)]
    pub(crate) colors: Option<u8>,

    /// ant color as #RRGGBB
    #[arg(long)]
    pub(crate) ant_color: Option<Rgb>,

    /// cell edge in half-block pixels
    #[arg(long)]
    pub(crate) cell_size: Option<u32>,

    /// frame rate cap for turbo mode and redraws
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// seed for the randomize key
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// open idle instead of running right away
    #[arg(long)]
    pub(crate) paused: bool,

    /// print the effective settings as JSON and exit
    #[arg(long)]
    pub(crate) print_config: bool,

    /// save the effective settings to the settings file and exit
    #[arg(long)]
    pub(crate) write_config: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) speed: u32,
    pub(crate) ant_color: Rgb,
    pub(crate) rules: RuleSet,
    pub(crate) cell_size: u32,
    pub(crate) fps_cap: u32,
    pub(crate) seed: Option<u64>,
    pub(crate) autostart: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 20,
            ant_color: DEFAULT_ANT,
            rules: RuleSet::default(),
            cell_size: 1,
            fps_cap: 60,
            seed: None,
            autostart: true,
        }
    }
}

impl Settings {
    /// Command-line values win over the file.
    pub(crate) fn apply_args(&mut self, args: &Args) {
        if let Some(v) = args.speed {
            self.speed = v;
        }
        if let Some(v) = args.white {
            self.rules.white = v;
        }
        if let Some(v) = args.black {
            self.rules.black = v;
        }
        if args.multi_color {
            self.rules.multi_color = true;
        }
        if let Some(v) = args.colors {
            self.rules.color_count = v;
        }
        if let Some(v) = args.ant_color {
            self.ant_color = v;
        }
        if let Some(v) = args.cell_size {
            self.cell_size = v;
        }
        if let Some(v) = args.fps {
            self.fps_cap = v;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if args.paused {
            self.autostart = false;
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        ensure!(
            (MIN_SPEED..=MAX_SPEED).contains(&self.speed),
            "speed must be between {MIN_SPEED} and {MAX_SPEED}, got {}",
            self.speed
        );
        ensure!(
            (1..=MAX_CELL_SIZE).contains(&self.cell_size),
            "cell size must be between 1 and {MAX_CELL_SIZE}, got {}",
            self.cell_size
        );
        ensure!(
            (10..=240).contains(&self.fps_cap),
            "fps must be between 10 and 240, got {}",
            self.fps_cap
        );
        Ok(())
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "langton", "Langton")
        .context("could not resolve project directories")?;
    let config_dir = proj.config_dir().to_path_buf();
    let data_dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&config_dir).ok();
    fs::create_dir_all(&data_dir).ok();
    Ok(Paths {
        settings_path: config_dir.join("settings.json"),
        log_path: data_dir.join("langton.log"),
    })
}

/// The terminal owns stdout/stderr, so records go to a file. `RUST_LOG`
/// picks the filter, `warn` otherwise.
fn init_logging(path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}

/// Logging is optional: when the file cannot be opened the run goes on
/// without it and says so on stderr.
pub(crate) fn init_logging_or_warn(path: &Path) -> bool {
    match init_logging(path) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            false
        }
    }
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => {
                log::info!("loaded settings from {}", path.display());
                v
            }
            Err(e) => {
                log::warn!("ignoring unreadable settings {}: {e}", path.display());
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename-over-existing is not atomic on Windows
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("moving {} to {}", from.display(), to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("langton-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.speed, 20);
        assert_eq!(s.rules.white, Turn::Right);
        assert_eq!(s.rules.black, Turn::Left);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = load_settings(&scratch("does-not-exist.json"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let p = scratch("garbage.json");
        fs::write(&p, "{ not json").unwrap();
        assert_eq!(load_settings(&p), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let p = scratch("partial.json");
        fs::write(&p, r##"{"speed": 350, "ant_color": "#00FF00", "rules": {"black": "180"}}"##)
            .unwrap();
        let s = load_settings(&p);
        assert_eq!(s.speed, 350);
        assert_eq!(s.ant_color, Rgb::new(0, 255, 0));
        assert_eq!(s.rules.black, Turn::Around);
        assert_eq!(s.rules.white, Turn::Right);
        assert_eq!(s.fps_cap, 60);
    }

    #[test]
    fn unwritable_log_path_is_not_fatal() {
        let p = scratch("no-such-dir").join("nested").join("langton.log");
        assert!(!init_logging_or_warn(&p));
    }

    #[test]
    fn save_then_load() {
        let p = scratch("saved.json");
        let s = Settings {
            speed: 999,
            seed: Some(5),
            rules: RuleSet {
                multi_color: true,
                color_count: 7,
                ..RuleSet::default()
            },
            ..Settings::default()
        };
        save_settings_atomic(&p, &s).unwrap();
        save_settings_atomic(&p, &s).unwrap();
        assert_eq!(load_settings(&p), s);
    }

    #[test]
    fn cli_overrides_file() {
        let args = Args::try_parse_from([
            "langton",
            "--speed",
            "450",
            "--white",
            "180",
            "--black",
            "none",
            "--multi-color",
            "--colors",
            "5",
            "--ant-color",
            "#123456",
            "--paused",
        ])
        .unwrap();
        let mut s = Settings::default();
        s.apply_args(&args);
        assert_eq!(s.speed, 450);
        assert_eq!(s.rules.white, Turn::Around);
        assert_eq!(s.rules.black, Turn::None);
        assert!(s.rules.multi_color);
        assert_eq!(s.rules.color_count, 5);
        assert_eq!(s.ant_color, Rgb::new(0x12, 0x34, 0x56));
        assert!(!s.autostart);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn cli_rejects_bad_values() {
        assert!(Args::try_parse_from(["langton", "--white", "sideways"]).is_err());
        assert!(Args::try_parse_from(["langton", "--ant-color", "blue"]).is_err());
    }

    #[test]
    fn validate_catches_out_of_range() {
        let mut s = Settings {
            speed: 0,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
        s.speed = 10;
        s.cell_size = 0;
        assert!(s.validate().is_err());
        s.cell_size = 2;
        s.rules.color_count = 12;
        assert!(s.validate().is_err());
    }
}
