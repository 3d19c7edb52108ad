// Shared fixtures for tests that launch a stand-in encoder
//
// The stand-in is a small /bin/sh script written into a temp dir. It receives
// the real encoder arguments, records each launch in `launches.log`, then runs
// the test's script body. `$ROOT` in the body is the temp dir.

#![allow(dead_code)]

use live_broadcast::BroadcastConfig;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;

// Writing an executable while another test thread forks can leave the file
// busy (ETXTBSY), so process-spawning tests run one at a time.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: BroadcastConfig,
}

impl Fixture {
    /// Web root in a temp dir with no encoder installed
    pub fn without_encoder() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = BroadcastConfig::from_web_root(dir.path());
        config.stop_timeout = Duration::from_secs(2);
        Self { dir, config }
    }

    /// Web root whose encoder is a shell script running `body`
    pub fn with_script(body: &str) -> Self {
        let mut fixture = Self::without_encoder();
        let path = fixture.path("fake-encoder.sh");
        let script = format!(
            "#!/bin/sh\nROOT='{}'\necho launched >> \"$ROOT/launches.log\"\n{}\n",
            fixture.dir.path().display(),
            body
        );
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        fixture.config.encoder_path = path;
        fixture
    }

    /// Encoder that copies stdin into `capture.raw` until EOF
    pub fn capturing() -> Self {
        Self::with_script("exec cat > \"$ROOT/capture.raw\"")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Number of times the stand-in encoder was started
    pub fn launches(&self) -> usize {
        fs::read_to_string(self.path("launches.log"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    /// Bytes the capturing encoder received on stdin
    pub fn captured(&self) -> Vec<u8> {
        fs::read(self.path("capture.raw")).unwrap_or_default()
    }

    /// Sorted file names currently in the output directory
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.output_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Log lines emitted on the current thread while the guard is alive
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's `tracing` output into a buffer until the guard drops
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect()
    }

    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.split_whitespace().nth(1) == Some(level))
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
