use std::io::{self, ErrorKind};
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

/// A document store addressed by relative, `/`-separated paths.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads the document at `path`, or `None` if it doesn't exist.
    async fn read(&self, path: &str) -> io::Result<Option<String>>;

    /// Writes the document at `path`, creating parents as needed.
    async fn write(&self, path: &str, content: &str) -> io::Result<()>;

    /// Returns `true` if a document exists at `path`.
    async fn exists(&self, path: &str) -> io::Result<bool>;
}

/// A [`Storage`] backed by a directory on the local file system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    /// Creates a storage rooted at `base_dir`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|c| !c.is_empty())
            .fold(self.base_dir.clone(), |acc, c| acc.join(c))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn read(&self, path: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.resolve(path)).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write(&self, path: &str, content: &str) -> io::Result<()> {
        let path = self.resolve(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await
    }

    async fn exists(&self, path: &str) -> io::Result<bool> {
        fs::try_exists(self.resolve(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        assert_eq!(storage.read("memory/a.md").await.unwrap(), None);
        assert!(!storage.exists("memory/a.md").await.unwrap());

        storage.write("memory/a.md", "hello").await.unwrap();
        assert!(storage.exists("memory/a.md").await.unwrap());
        assert_eq!(
            storage.read("memory/a.md").await.unwrap().as_deref(),
            Some("hello")
        );
        assert!(dir.path().join("memory").join("a.md").is_file());
    }
}
