//! Filesystem collaborator used by the `>>` operator.
//!
//! Paths are virtual: absolute, `/`-separated, resolved against a working
//! directory. `MemoryFileSystem` keeps the tree in a map; `LocalFileSystem`
//! maps it onto a host directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, ShellError};

/// Optional filesystem plugin.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Resolves `path` against the working directory into normal form.
    fn resolve_path(&self, path: &str) -> String;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Whether `path` is a directory.
    async fn is_directory(&self, path: &str) -> Result<bool>;

    /// Reads a whole file as UTF-8.
    async fn read_file(&self, path: &str) -> Result<String>;

    /// Replaces the content of an existing file.
    async fn write_file(&self, path: &str, content: &str) -> Result<()>;

    /// Creates an empty file. Existing files are left untouched.
    async fn create_file(&self, path: &str) -> Result<()>;

    /// Flushes pending changes to the backing medium.
    async fn persist(&self) -> Result<()>;
}

/// Appends `text` as a new line of the file at `path`, creating it if needed.
///
/// Returns the resolved path that was written.
pub async fn append_to_file(fs: &dyn FileSystem, path: &str, text: &str) -> Result<String> {
    let resolved = fs.resolve_path(path);
    if fs.is_directory(&resolved).await? {
        return Err(ShellError::filesystem(format!("{resolved} is a directory")));
    }
    if !fs.exists(&resolved).await? {
        fs.create_file(&resolved).await?;
    }

    let mut content = fs.read_file(&resolved).await?;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(text);
    content.push('\n');

    fs.write_file(&resolved, &content).await?;
    fs.persist().await?;
    debug!("Appended {} bytes to {resolved}", text.len() + 1);
    Ok(resolved)
}

/// Joins `path` onto `cwd` and normalizes it.
///
/// Collapses repeated slashes, drops `.` and resolves `..` without ever
/// climbing above `/`.
pub fn normalize_path(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{cwd}/{path}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

#[derive(Debug, Clone)]
enum Node {
    File(String),
    Dir,
}

/// A fully in-memory filesystem.
#[derive(Debug)]
pub struct MemoryFileSystem {
    cwd: String,
    nodes: Mutex<BTreeMap<String, Node>>,
}

impl MemoryFileSystem {
    /// Creates a filesystem holding only `/`, with `/` as working directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            cwd: "/".to_string(),
            nodes: Mutex::new(nodes),
        }
    }

    /// Sets the working directory used by `resolve_path`.
    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = normalize_path("/", cwd);
        self
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<String, Node>> {
        self.nodes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates a directory and any missing parents.
    pub fn create_dir(&self, path: &str) -> Result<()> {
        let path = self.resolve_path(path);
        let mut nodes = self.nodes();
        if let Some(Node::File(_)) = nodes.get(&path) {
            return Err(ShellError::filesystem(format!("{path} is a file")));
        }

        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match nodes.get(&current) {
                Some(Node::File(_)) => {
                    return Err(ShellError::filesystem(format!("{current} is a file")))
                }
                Some(Node::Dir) => {}
                None => {
                    nodes.insert(current.clone(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    /// Returns the content of a file, if it exists.
    pub fn contents(&self, path: &str) -> Option<String> {
        match self.nodes().get(&self.resolve_path(path)) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    fn resolve_path(&self, path: &str) -> String {
        normalize_path(&self.cwd, path)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.nodes().contains_key(&self.resolve_path(path)))
    }

    async fn is_directory(&self, path: &str) -> Result<bool> {
        Ok(matches!(
            self.nodes().get(&self.resolve_path(path)),
            Some(Node::Dir)
        ))
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        let path = self.resolve_path(path);
        match self.nodes().get(&path) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(Node::Dir) => Err(ShellError::filesystem(format!("{path} is a directory"))),
            None => Err(ShellError::filesystem(format!("no such file: {path}"))),
        }
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let path = self.resolve_path(path);
        let mut nodes = self.nodes();
        match nodes.get_mut(&path) {
            Some(Node::File(existing)) => {
                *existing = content.to_string();
                Ok(())
            }
            Some(Node::Dir) => Err(ShellError::filesystem(format!("{path} is a directory"))),
            None => Err(ShellError::filesystem(format!("no such file: {path}"))),
        }
    }

    async fn create_file(&self, path: &str) -> Result<()> {
        let path = self.resolve_path(path);
        let mut nodes = self.nodes();
        if !matches!(nodes.get(parent(&path)), Some(Node::Dir)) {
            return Err(ShellError::filesystem(format!(
                "parent directory does not exist: {}",
                parent(&path)
            )));
        }
        match nodes.get(&path) {
            Some(Node::Dir) => Err(ShellError::filesystem(format!("{path} is a directory"))),
            Some(Node::File(_)) => Ok(()),
            None => {
                nodes.insert(path, Node::File(String::new()));
                Ok(())
            }
        }
    }

    async fn persist(&self) -> Result<()> {
        Ok(())
    }
}

/// Maps virtual paths onto a host directory.
///
/// `/` is the root directory; `..` never escapes it.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    cwd: String,
}

impl LocalFileSystem {
    /// Creates a filesystem rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cwd: "/".to_string(),
        }
    }

    /// The host directory backing `/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &str) -> PathBuf {
        let resolved = self.resolve_path(path);
        self.root.join(resolved.trim_start_matches('/'))
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    fn resolve_path(&self, path: &str) -> String {
        normalize_path(&self.cwd, path)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        tokio::fs::try_exists(self.host_path(path))
            .await
            .map_err(|e| ShellError::filesystem(format!("Failed to stat {path}: {e}")))
    }

    async fn is_directory(&self, path: &str) -> Result<bool> {
        match tokio::fs::metadata(self.host_path(path)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ShellError::filesystem(format!(
                "Failed to stat {path}: {e}"
            ))),
        }
    }

    async fn read_file(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(self.host_path(path))
            .await
            .map_err(|e| ShellError::filesystem(format!("Failed to read {path}: {e}")))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        tokio::fs::write(self.host_path(path), content)
            .await
            .map_err(|e| ShellError::filesystem(format!("Failed to write {path}: {e}")))
    }

    async fn create_file(&self, path: &str) -> Result<()> {
        let host = self.host_path(path);
        if tokio::fs::try_exists(&host).await.unwrap_or(false) {
            return Ok(());
        }
        tokio::fs::write(&host, "")
            .await
            .map_err(|e| ShellError::filesystem(format!("Failed to create {path}: {e}")))
    }

    async fn persist(&self) -> Result<()> {
        Ok(())
    }
}
