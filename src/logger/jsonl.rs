//! Append-only JSONL file with size-based rotation.
//!
//! A record is serialized in full and handed to one `write_all`, so a reader
//! tailing the file never sees half a line. When a destination stops taking
//! writes the writer steps down a tier: primary file, fallback file, stderr,
//! then nothing. Logging never fails a test session.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::LoggingConfig;
use crate::core::errors::{Result, SuiteError};

const STDERR_TAG: &str = "[EVS-JSONL]";

/// Size cap for the live file and how many older generations survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rotation {
    /// Rotate before a write would push the live file past this size.
    max_bytes: u64,
    /// Generations kept as `<name>.1` (newest) through `<name>.<keep>`.
    keep: u32,
}

impl Rotation {
    /// An empty file is never rotated, even for an oversized record.
    const fn is_due(self, len: u64, incoming: usize) -> bool {
        len > 0 && len.saturating_add(incoming as u64) > self.max_bytes
    }

    fn shift(self, live: &Path) {
        if self.keep == 0 {
            let _ = fs::remove_file(live);
            return;
        }
        let _ = fs::remove_file(generation(live, self.keep));
        for n in (1..self.keep).rev() {
            let _ = fs::rename(generation(live, n), generation(live, n + 1));
        }
        let _ = fs::rename(live, generation(live, 1));
    }
}

fn generation(live: &Path, n: u32) -> PathBuf {
    let mut name = live.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Primary,
    Fallback,
    Stderr,
    Discard,
}

impl Tier {
    const fn below(self) -> Self {
        match self {
            Self::Primary => Self::Fallback,
            Self::Fallback => Self::Stderr,
            Self::Stderr | Self::Discard => Self::Discard,
        }
    }
}

#[derive(Debug)]
struct OpenLog {
    path: PathBuf,
    file: File,
    len: u64,
}

impl OpenLog {
    fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| SuiteError::io(dir, source))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SuiteError::io(path, source))?;
        let len = file
            .metadata()
            .map_err(|source| SuiteError::io(path, source))?
            .len();
        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
        })
    }

    fn write(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        self.len += line.len() as u64;
        Ok(())
    }
}

/// JSONL appender used as the activity log sink.
#[derive(Debug)]
pub struct JsonlWriter {
    primary: PathBuf,
    fallback: Option<PathBuf>,
    rotation: Rotation,
    tier: Tier,
    out: Option<OpenLog>,
}

impl JsonlWriter {
    /// Open the log described by the `[logging]` section, stepping down
    /// tiers until one accepts the file.
    #[must_use]
    pub fn open(cfg: &LoggingConfig) -> Self {
        let mut writer = Self {
            primary: cfg.activity_log.clone(),
            fallback: cfg.fallback_log.clone(),
            rotation: Rotation {
                max_bytes: cfg.max_size_bytes,
                keep: cfg.max_rotated_files,
            },
            tier: Tier::Primary,
            out: None,
        };
        writer.settle_from(Tier::Primary);
        writer
    }

    /// Append `record` as one line.
    pub fn append<T: Serialize>(&mut self, record: &T) {
        match serde_json::to_vec(record) {
            Ok(mut line) => {
                line.push(b'\n');
                self.emit(&line);
            }
            Err(err) => {
                let _ = writeln!(io::stderr(), "{STDERR_TAG} unserializable record: {err}");
            }
        }
    }

    fn emit(&mut self, line: &[u8]) {
        loop {
            match self.tier {
                Tier::Primary | Tier::Fallback => {
                    self.rotate_if_due(line.len());
                    if self.out.as_mut().is_some_and(|out| out.write(line).is_ok()) {
                        return;
                    }
                    self.settle_from(self.tier.below());
                }
                Tier::Stderr => {
                    let mut err = io::stderr().lock();
                    let tagged = err
                        .write_all(STDERR_TAG.as_bytes())
                        .and_then(|()| err.write_all(b" "))
                        .and_then(|()| err.write_all(line));
                    if tagged.is_ok() {
                        return;
                    }
                    self.tier = Tier::Discard;
                }
                Tier::Discard => return,
            }
        }
    }

    /// A failed reopen leaves `out` empty so the next write steps down.
    fn rotate_if_due(&mut self, incoming: usize) {
        let Some(out) = self.out.take() else {
            return;
        };
        if !self.rotation.is_due(out.len, incoming) {
            self.out = Some(out);
            return;
        }
        let OpenLog { path, file, .. } = out;
        drop(file);
        self.rotation.shift(&path);
        self.out = OpenLog::open(&path).ok();
    }

    fn settle_from(&mut self, start: Tier) {
        self.out = None;
        let mut tier = start;
        while matches!(tier, Tier::Primary | Tier::Fallback) {
            let path = match tier {
                Tier::Primary => Some(self.primary.clone()),
                _ => self.fallback.clone(),
            };
            if let Some(path) = path {
                match OpenLog::open(&path) {
                    Ok(out) => {
                        self.out = Some(out);
                        break;
                    }
                    Err(err) => {
                        let _ = writeln!(io::stderr(), "{STDERR_TAG} {err}; stepping down");
                    }
                }
            }
            tier = tier.below();
        }
        self.tier = tier;
    }
}
