//! Fixtures shared by the unit tests: stand-in tool scripts, a synthetic RAW
//! decoder and a recording reporter.

use crate::raw::{DecodeError, RawDecoder};
use crate::report::{ProgressSink, Severity, StatusSink};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Write an executable `/bin/sh` script named `name` into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// An encoder stand-in: answers `--version`, otherwise copies `$1` to `$2`
/// and logs every argument to `<dir>/<name>.log`
#[cfg(unix)]
pub fn fake_encoder(dir: &Path, name: &str) -> PathBuf {
    let log = dir.join(format!("{}.log", name));
    let body = format!(
        "if [ \"$1\" = \"--version\" ]; then echo '{name} v1.0'; exit 0; fi\n\
         echo \"$@\" >> '{log}'\n\
         echo 'encoding done' >&2\n\
         cp \"$1\" \"$2\"\n",
        name = name,
        log = log.display()
    );
    write_script(dir, name, &body)
}

/// A metadata tool stand-in that logs its arguments to `<dir>/<name>.log`
#[cfg(unix)]
pub fn fake_exiftool(dir: &Path, name: &str, exit_code: i32) -> PathBuf {
    let log = dir.join(format!("{}.log", name));
    let body = format!(
        "if [ \"$1\" = \"-ver\" ]; then echo '12.76'; exit 0; fi\n\
         echo \"$@\" >> '{log}'\n\
         echo '    1 image files updated'\n\
         echo 'Warning: [minor] Tag not found' >&2\n\
         exit {code}\n",
        log = log.display(),
        code = exit_code
    );
    write_script(dir, name, &body)
}

/// Decodes any file into a small gradient; files whose name contains
/// `corrupt` fail
pub struct SyntheticDecoder {
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticDecoder {
    fn default() -> Self {
        Self {
            width: 8,
            height: 6,
        }
    }
}

impl RawDecoder for SyntheticDecoder {
    fn decode(&self, path: &Path) -> Result<RgbImage, DecodeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.contains("corrupt") {
            return Err(DecodeError::Engine {
                path: path.to_path_buf(),
                message: "unsupported sensor layout".to_string(),
            });
        }
        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([(x * 20) as u8, (y * 30) as u8, 128])
        }))
    }
}

/// Collects every status and progress report
#[derive(Default)]
pub struct RecordingReporter {
    pub statuses: Mutex<Vec<(String, Severity)>>,
    pub progress: Mutex<Vec<(usize, usize)>>,
}

impl RecordingReporter {
    pub fn status_log(&self) -> Vec<(String, Severity)> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn progress_log(&self) -> Vec<(usize, usize)> {
        self.progress.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.status_log().iter().filter(|(_, s)| *s == severity).count()
    }

    pub fn any_contains(&self, needle: &str) -> bool {
        self.status_log().iter().any(|(m, _)| m.contains(needle))
    }
}

impl StatusSink for RecordingReporter {
    fn status(&self, message: &str, severity: Severity) {
        self.statuses.lock().unwrap().push((message.to_string(), severity));
    }
}

impl ProgressSink for RecordingReporter {
    fn progress(&self, completed: usize, total: usize) {
        self.progress.lock().unwrap().push((completed, total));
    }
}
