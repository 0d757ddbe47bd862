//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};

/// Apply `overrides` on top of `base`, returning the resulting environment.
///
/// Later overrides win over earlier ones and over the base.
pub fn overlay_env<K, V>(
    base: impl IntoIterator<Item = (OsString, OsString)>,
    overrides: impl IntoIterator<Item = (K, V)>,
) -> BTreeMap<OsString, OsString>
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut env: BTreeMap<OsString, OsString> = base.into_iter().collect();
    env.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
    env
}

/// Builder for subprocess execution.
///
/// The child inherits the parent's environment with the configured overrides
/// applied on the `Command`; the parent's own environment is never touched.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Override an environment variable.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// The environment the child will see.
    pub fn environment(&self) -> BTreeMap<OsString, OsString> {
        overlay_env(std::env::vars_os(), self.env.iter().cloned())
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd
    }

    /// Run to completion with stdout and stderr both appended to `log`.
    ///
    /// stdin is closed. The log handle is duplicated for the child, so the
    /// caller keeps ownership and may write to it after the child exits.
    pub fn status_to_log(&self, log: &File) -> Result<ExitStatus> {
        let stdout = log.try_clone().context("failed to duplicate log file handle")?;
        let stderr = log.try_clone().context("failed to duplicate log file handle")?;

        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::from(stdout));
        cmd.stderr(Stdio::from(stderr));

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        child
            .wait()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};
    use tempfile::TempDir;

    #[test]
    fn test_overlay_env() {
        let base = vec![
            (OsString::from("PATH"), OsString::from("/usr/bin")),
            (OsString::from("DL_DIR"), OsString::from("/old")),
        ];
        let env = overlay_env(base, [("DL_DIR", "/new"), ("SSTATE_DIR", "/sstate")]);

        assert_eq!(env[OsStr::new("PATH")], "/usr/bin");
        assert_eq!(env[OsStr::new("DL_DIR")], "/new");
        assert_eq!(env[OsStr::new("SSTATE_DIR")], "/sstate");
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn test_environment_does_not_touch_process_env() {
        let pb = ProcessBuilder::new("true").env("KERNEL_MATRIX_TEST_ONLY", "1");
        assert_eq!(pb.environment()[OsStr::new("KERNEL_MATRIX_TEST_ONLY")], "1");
        assert!(std::env::var("KERNEL_MATRIX_TEST_ONLY").is_err());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("kas").args(["build", "kas/base.yml:kas/release-master.yml"]);
        assert_eq!(pb.display_command(), "kas build kas/base.yml:kas/release-master.yml");
    }

    #[cfg(unix)]
    #[test]
    fn test_status_to_log_captures_both_streams() {
        let tmp = TempDir::new().unwrap();
        let log_path = tmp.path().join("out.log");
        let mut log = File::options()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&log_path)
            .unwrap();

        let status = ProcessBuilder::new("sh")
            .args(["-c", "echo out; echo err >&2; echo $GREETING; exit 3"])
            .env("GREETING", "hello")
            .status_to_log(&log)
            .unwrap();
        assert_eq!(status.code(), Some(3));

        let mut contents = String::new();
        log.seek(SeekFrom::Start(0)).unwrap();
        log.read_to_string(&mut contents).unwrap();
        assert!(contents.contains("out\n"));
        assert!(contents.contains("err\n"));
        assert!(contents.contains("hello\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_values_reach_the_child() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let log = File::create(tmp.path().join("out.log")).unwrap();
        let raw = OsStr::from_bytes(b"/srv/\xff\xfe");

        let status = ProcessBuilder::new("sh")
            .arg("-c")
            .arg("test \"$RAW\" = \"$1\"")
            .arg("sh")
            .arg(raw)
            .env("RAW", raw)
            .status_to_log(&log)
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let log = File::create(tmp.path().join("out.log")).unwrap();
        let err = ProcessBuilder::new("/nonexistent/kernel-matrix-tool")
            .status_to_log(&log)
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
