//! Rolling Writer
//!
//! `MakeWriter` target that appends to `<app>.log`, shifting it to
//! `<app>.1.log`, `<app>.2.log`, ... once it grows past the size limit,
//! and remembers the last lines written.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone)]
pub struct RollingConfig {
    pub dir: PathBuf,
    pub app_name: String,
    /// Rotate once the current file would grow past this
    pub max_file_bytes: u64,
    /// Files kept, the current one included
    pub max_files: usize,
    /// Lines kept in memory
    pub recent_capacity: usize,
}

impl RollingConfig {
    pub fn new(dir: impl Into<PathBuf>, app_name: &str) -> Self {
        Self {
            dir: dir.into(),
            app_name: app_name.to_string(),
            max_file_bytes: 5 * 1024 * 1024,
            max_files: 5,
            recent_capacity: 500,
        }
    }

    /// `<app>.log` for index 0, `<app>.<index>.log` for older files
    pub fn file_path(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(format!("{}.log", self.app_name))
        } else {
            self.dir.join(format!("{}.{}.log", self.app_name, index))
        }
    }
}

struct State {
    config: RollingConfig,
    file: File,
    written: u64,
    recent: VecDeque<String>,
    partial: String,
}

impl State {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        for index in (1..self.config.max_files).rev() {
            let from = self.config.file_path(index - 1);
            let to = self.config.file_path(index);
            if from.exists() {
                if to.exists() {
                    fs::remove_file(&to)?;
                }
                fs::rename(&from, &to)?;
            }
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.config.file_path(0))?;
        self.written = 0;
        Ok(())
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.config.recent_capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=end).collect();
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if self.recent.len() == self.config.recent_capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
    }
}

#[derive(Clone)]
pub struct RollingWriter {
    state: Arc<Mutex<State>>,
}

impl RollingWriter {
    /// Create the log directory if needed and append to the current file
    pub fn open(config: RollingConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.dir)?;
        let path = config.file_path(0);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            state: Arc::new(Mutex::new(State {
                config,
                file,
                written,
                recent: VecDeque::new(),
                partial: String::new(),
            })),
        })
    }

    /// Most recent lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.recent.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn current_file(&self) -> Option<PathBuf> {
        self.state.lock().ok().map(|state| state.config.file_path(0))
    }
}

pub struct RollingGuard {
    state: Arc<Mutex<State>>,
}

impl Write for RollingGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        let len = buf.len() as u64;
        if state.written > 0 && state.written + len > state.config.max_file_bytes {
            state.rotate()?;
        }
        state.file.write_all(buf)?;
        state.written += len;
        state.remember(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RollingGuard {
            state: Arc::clone(&self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(dir: &std::path::Path) -> RollingConfig {
        RollingConfig {
            max_file_bytes: 64,
            max_files: 3,
            recent_capacity: 4,
            ..RollingConfig::new(dir, "test")
        }
    }

    #[test]
    fn test_rotation_keeps_bounded_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let writer = RollingWriter::open(config.clone()).unwrap();

        for n in 0..20 {
            let mut handle = writer.make_writer();
            writeln!(handle, "line number {:02} of the test", n).unwrap();
        }

        assert!(config.file_path(0).exists());
        assert!(config.file_path(1).exists());
        assert!(config.file_path(2).exists());
        assert!(!config.file_path(3).exists());
        assert!(fs::metadata(config.file_path(0)).unwrap().len() <= 64);

        let current = fs::read_to_string(config.file_path(0)).unwrap();
        assert!(current.contains("line number 19"));
    }

    #[test]
    fn test_recent_lines_ring() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RollingWriter::open(small_config(dir.path())).unwrap();

        let mut handle = writer.make_writer();
        // a line may arrive in pieces
        handle.write_all(b"first ").unwrap();
        handle.write_all(b"line\nsecond\n").unwrap();
        for n in 0..3 {
            writeln!(handle, "extra {}", n).unwrap();
        }

        assert_eq!(
            writer.recent_lines(),
            vec!["second", "extra 0", "extra 1", "extra 2"]
        );
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let config = RollingConfig::new(dir.path(), "app");
        {
            let writer = RollingWriter::open(config.clone()).unwrap();
            writeln!(writer.make_writer(), "before restart").unwrap();
        }
        let writer = RollingWriter::open(config.clone()).unwrap();
        writeln!(writer.make_writer(), "after restart").unwrap();

        let content = fs::read_to_string(config.file_path(0)).unwrap();
        assert_eq!(content, "before restart\nafter restart\n");
        assert_eq!(writer.current_file(), Some(config.file_path(0)));
    }
}
