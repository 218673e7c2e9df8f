use async_trait::async_trait;
use galleon_api_types::storage::{Bytes, StorageError, StorageProvider, StorageResult};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Store backed by a directory tree; keys map to paths under the root.
pub struct FsStorageProvider {
    root: PathBuf,
}

impl FsStorageProvider {
    pub fn new(root: PathBuf) -> StorageResult<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn abs_path(&self, key: &str) -> StorageResult<PathBuf> {
        let rel = Path::new(key);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::ServiceError(
                io::Error::from(io::ErrorKind::InvalidInput).into(),
            ));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageProvider for FsStorageProvider {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let start = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.abs_path(prefix)?
        };
        let mut out = Vec::new();
        if start.is_file() {
            out.push(prefix.to_owned());
        } else if start.is_dir() {
            append_dir(&start, &self.root, &mut out)?;
        }
        Ok(out)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.abs_path(key)?.is_file())
    }

    async fn value(&self, key: &str) -> StorageResult<Bytes> {
        let mut file = File::open(self.abs_path(key)?)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf.into())
    }

    async fn save(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.abs_path(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::from(io::Error::from(io::ErrorKind::InvalidInput)))?;
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&data)?;
        tmp.persist(path)
            .map_err(|e| StorageError::ServiceError(e.into()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match std::fs::remove_file(self.abs_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn healthcheck(&self) -> anyhow::Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            anyhow::bail!("root not a dir")
        }
    }
}

fn append_dir(path: &Path, root: &Path, out: &mut Vec<String>) -> StorageResult<()> {
    for e in std::fs::read_dir(path)? {
        let e = e?;
        let ty = e.file_type()?;
        if ty.is_dir() {
            append_dir(&e.path(), root, out)?;
        } else if ty.is_file() {
            out.push(key_of(&e.path(), root));
        }
    }
    Ok(())
}

/// Relative store key for `path`, with `/` separators on every platform.
fn key_of(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
