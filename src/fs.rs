//! Centralized filesystem access for better testability.
//!
//! Everything the pipeline reads goes through the `FileSystem` trait, so tests
//! can run the parsers and analyzers against in-memory projects.

use std::io;
use std::path::Path;

/// Trait for filesystem operations, enabling dependency injection and testing.
pub trait FileSystem: Send + Sync {
    /// Read the raw bytes of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation using std::fs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Global default filesystem for use when dependency injection isn't practical.
pub fn default_fs() -> &'static RealFs {
    static INSTANCE: RealFs = RealFs;
    &INSTANCE
}

/// Read a source file as text.
///
/// Decodes UTF-8 first and falls back to Latin-1, which accepts any byte
/// sequence, so only I/O failures are reported as errors. A UTF-8 byte order
/// mark is dropped.
pub fn read_source(fs: &dyn FileSystem, path: &Path) -> io::Result<String> {
    let bytes = fs.read(path)?;
    Ok(decode_source(path, bytes))
}

fn decode_source(path: &Path, bytes: Vec<u8>) -> String {
    let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };

    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                valid_up_to = e.utf8_error().valid_up_to(),
                "source is not valid UTF-8, decoding as Latin-1"
            );
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory filesystem for testing.
    #[derive(Debug, Default)]
    pub struct MockFs {
        files: RwLock<HashMap<String, Vec<u8>>>,
    }

    impl MockFs {
        pub fn new() -> Self {
            Self {
                files: RwLock::new(HashMap::new()),
            }
        }

        /// Pre-populate the mock filesystem with files.
        pub fn with_files<I, P, C>(files: I) -> Self
        where
            I: IntoIterator<Item = (P, C)>,
            P: AsRef<Path>,
            C: AsRef<[u8]>,
        {
            let map: HashMap<String, Vec<u8>> = files
                .into_iter()
                .map(|(p, c)| (key(p.as_ref()), c.as_ref().to_vec()))
                .collect();
            Self {
                files: RwLock::new(map),
            }
        }

        pub fn insert(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
            self.files
                .write()
                .unwrap()
                .insert(key(path.as_ref()), content.as_ref().to_vec());
        }
    }

    fn key(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    impl FileSystem for MockFs {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            let key = key(path);
            self.files
                .read()
                .unwrap()
                .get(&key)
                .cloned()
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("file not found: {}", key))
                })
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.read().unwrap().contains_key(&key(path))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_fs_read() {
            let fs = MockFs::new();
            let path = Path::new("/test/file.py");

            assert!(!fs.exists(path));
            assert!(fs.read(path).is_err());

            fs.insert(path, "x = 1");
            assert!(fs.exists(path));
            assert_eq!(read_source(&fs, path).unwrap(), "x = 1");
        }

        #[test]
        fn test_latin1_fallback() {
            // "café" encoded as Latin-1
            let fs = MockFs::with_files([(Path::new("/a.py"), vec![b'c', b'a', b'f', 0xE9])]);
            assert_eq!(read_source(&fs, Path::new("/a.py")).unwrap(), "café");
        }

        #[test]
        fn test_bom_is_stripped() {
            let fs = MockFs::with_files([(Path::new("/a.py"), b"\xEF\xBB\xBFimport os".to_vec())]);
            assert_eq!(read_source(&fs, Path::new("/a.py")).unwrap(), "import os");
        }
    }
}
