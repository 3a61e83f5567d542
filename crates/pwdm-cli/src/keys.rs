//! Key file I/O.
//!
//! Reading is limited to files the user names. `keygen` writes `private.pem`
//! with owner-only permissions on Unix.

use std::fs;
use std::path::{Path, PathBuf};

use pwdm_crypto::rsa::GeneratedKeyPair;
use thiserror::Error;
use tracing::info;
use zeroize::Zeroizing;

pub const PRIVATE_KEY_FILE: &str = "private.pem";
pub const PUBLIC_KEY_FILE: &str = "public.pem";

/// Largest key file we will read; a 4096-bit PKCS#8 PEM is about 3.3 KiB.
const MAX_KEY_FILE_LEN: u64 = 64 * 1024;

#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("{0} is too large to be a key file")]
    TooLarge(PathBuf),
}

/// Read a PEM file. The contents are wiped from memory on drop.
pub fn read_pem(path: &Path) -> Result<Zeroizing<String>, KeyFileError> {
    let read_err = |source| KeyFileError::Read {
        path: path.to_path_buf(),
        source,
    };
    let len = fs::metadata(path).map_err(read_err)?.len();
    if len > MAX_KEY_FILE_LEN {
        return Err(KeyFileError::TooLarge(path.to_path_buf()));
    }
    fs::read_to_string(path).map(Zeroizing::new).map_err(read_err)
}

#[derive(Debug, Clone)]
pub struct WrittenKeyPair {
    pub private_path: PathBuf,
    pub public_path: PathBuf,
}

/// Write `pair` into `dir` as `private.pem` and `public.pem`.
pub fn write_key_pair(
    dir: &Path,
    pair: &GeneratedKeyPair,
    force: bool,
) -> Result<WrittenKeyPair, KeyFileError> {
    let private_path = dir.join(PRIVATE_KEY_FILE);
    let public_path = dir.join(PUBLIC_KEY_FILE);

    if !force {
        for path in [&private_path, &public_path] {
            if path.exists() {
                return Err(KeyFileError::AlreadyExists(path.clone()));
            }
        }
    }

    fs::create_dir_all(dir).map_err(|source| KeyFileError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    write_private(&private_path, pair.private_pem.as_bytes())?;
    fs::write(&public_path, pair.public_pem.as_bytes()).map_err(|source| KeyFileError::Write {
        path: public_path.clone(),
        source,
    })?;

    info!(dir = %dir.display(), "wrote RSA key pair");
    Ok(WrittenKeyPair {
        private_path,
        public_path,
    })
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<(), KeyFileError> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let write_err = |source| KeyFileError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(write_err)?;
    // mode() only applies on creation; tighten an overwritten file too.
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(write_err)?;
    file.write_all(contents).map_err(write_err)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<(), KeyFileError> {
    fs::write(path, contents).map_err(|source| KeyFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zeroize::Zeroizing;

    fn fake_pair() -> GeneratedKeyPair {
        GeneratedKeyPair {
            private_pem: Zeroizing::new("PRIVATE".to_string()),
            public_pem: "PUBLIC".to_string(),
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let written = write_key_pair(dir.path(), &fake_pair(), false).unwrap();

        assert_eq!(read_pem(&written.private_path).unwrap().as_str(), "PRIVATE");
        assert_eq!(read_pem(&written.public_path).unwrap().as_str(), "PUBLIC");
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        write_key_pair(dir.path(), &fake_pair(), false).unwrap();

        let err = write_key_pair(dir.path(), &fake_pair(), false).unwrap_err();
        assert!(matches!(err, KeyFileError::AlreadyExists(_)));
        assert!(err.to_string().contains("--force"));

        assert!(write_key_pair(dir.path(), &fake_pair(), true).is_ok());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let written = write_key_pair(&nested, &fake_pair(), false).unwrap();
        assert!(written.public_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let written = write_key_pair(dir.path(), &fake_pair(), false).unwrap();
        let mode = fs::metadata(&written.private_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // Overwriting a looser file tightens it.
        fs::set_permissions(&written.private_path, fs::Permissions::from_mode(0o644)).unwrap();
        write_key_pair(dir.path(), &fake_pair(), true).unwrap();
        let mode = fs::metadata(&written.private_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_pem(&dir.path().join("nope.pem")).unwrap_err();
        assert!(matches!(err, KeyFileError::Read { .. }));
    }

    #[test]
    fn test_read_rejects_huge_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.pem");
        fs::write(&path, vec![b'A'; (MAX_KEY_FILE_LEN + 1) as usize]).unwrap();
        assert!(matches!(read_pem(&path), Err(KeyFileError::TooLarge(_))));
    }
}
