//! Filesystem Backends
//!
//! The store engine talks to the filesystem through a small trait, so the
//! same cache operations can run either as direct filesystem calls or through
//! a spawned shell. The shell path exists for locked-down hosts where the
//! process may spawn children but direct filesystem syscalls are mediated;
//! the native path is the default everywhere else.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Filesystem operations the store engine needs.
pub trait FsBackend: Send + Sync {
    /// Recursively create the cache directory and open up its permissions.
    /// The loose default mode is a convenience, not a security boundary;
    /// callers that care set a stricter mode themselves.
    fn provision_dir(&self, dir: &Path) -> io::Result<()>;

    /// Create a file holding exactly `data`.
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Read a file's full content.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// List the plain filenames (not full paths) in a directory.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Apply a permission mode to a file.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// Direct `std::fs` implementation, the default backend.
///
/// File creation goes through a temp file persisted into place, so a
/// concurrent reader sees either no file or the complete content, never a
/// partial write.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl FsBackend for NativeBackend {
    fn provision_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o777));
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(mode))
        }
        #[cfg(not(unix))]
        {
            let _ = (path, mode);
            Ok(())
        }
    }
}

/// Runs every operation through `/bin/sh` child processes. Unix only.
///
/// Writes land in place via `cat`, without the temp-file hop the native
/// backend makes, so this backend keeps only the filesystem's own single-file
/// guarantees.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellBackend;

impl ShellBackend {
    fn run(&self, script: &str, stdin: Option<&[u8]>) -> io::Result<Vec<u8>> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(data) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                if let Err(e) = pipe.write_all(data) {
                    // Reap the child before surfacing the pipe error.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!("shell command failed: {script}")));
        }
        Ok(output.stdout)
    }
}

/// Single-quote a path for safe interpolation into a shell script.
fn quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

impl FsBackend for ShellBackend {
    fn provision_dir(&self, dir: &Path) -> io::Result<()> {
        let q = quote(dir);
        self.run(&format!("mkdir -p {q}"), None)?;
        // Best-effort, same as the native default.
        let _ = self.run(&format!("chmod -R 777 {q}"), None);
        Ok(())
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.run(&format!("cat > {}", quote(path)), Some(data))?;
        Ok(())
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.run(&format!("cat {}", quote(path)), None)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.run(&format!("rm {}", quote(path)), None)?;
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        // Entry filenames come from the base64 alphabet plus digits and a
        // dot, so line-splitting ls output is unambiguous here.
        let out = self.run(&format!("ls -1A {}", quote(dir)), None)?;
        Ok(String::from_utf8_lossy(&out)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        self.run(&format!("chmod {:o} {}", mode, quote(path)), None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_write_read_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let backend = NativeBackend;
        let path = dir.path().join("a2V5.0");

        backend.write_file(&path, b"payload").unwrap();
        assert_eq!(backend.read_file(&path).unwrap(), b"payload");
        assert_eq!(backend.list_dir(dir.path()).unwrap(), vec!["a2V5.0"]);

        backend.remove_file(&path).unwrap();
        assert!(backend.list_dir(dir.path()).unwrap().is_empty());
        assert!(backend.read_file(&path).is_err());
    }

    #[test]
    fn test_native_write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let backend = NativeBackend;
        let path = dir.path().join("a2V5.0");

        backend.write_file(&path, b"old").unwrap();
        backend.write_file(&path, b"new").unwrap();
        assert_eq!(backend.read_file(&path).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_backend_matches_native_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ShellBackend;
        let sub = dir.path().join("nested").join("cache dir with spaces");

        backend.provision_dir(&sub).unwrap();
        let path = sub.join("a2V5.123");
        backend.write_file(&path, b"it's quoted").unwrap();
        assert_eq!(backend.read_file(&path).unwrap(), b"it's quoted");
        assert_eq!(backend.list_dir(&sub).unwrap(), vec!["a2V5.123"]);

        backend.remove_file(&path).unwrap();
        assert!(backend.read_file(&path).is_err());
        assert!(backend.remove_file(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_write_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ShellBackend;
        let path = dir.path().join("no-such-dir").join("a2V5.0");

        // The redirect fails before cat reads anything, so a payload larger
        // than the pipe buffer turns into a broken-pipe write error.
        let big = vec![b'x'; 1 << 20];
        assert!(backend.write_file(&path, &big).is_err());
        assert!(backend.write_file(&path, b"small").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_set_mode_applies_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let backend = NativeBackend;
        let path = dir.path().join("a2V5.0");
        backend.write_file(&path, b"x").unwrap();

        backend.set_mode(&path, 0o600).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
