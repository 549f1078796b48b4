use std::path::{Path, PathBuf};

use framestack_types::ProjectId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Resolve the workspace data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. FRAMESTACK_PATH environment variable (with tilde expansion)
/// 3. System data directory
/// 4. ~/.framestack (fallback for systems without a standard data directory)
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("FRAMESTACK_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("framestack"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".framestack"));
    }

    Err(Error::Config(
        "could not determine workspace path: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Derive the stable [`ProjectId`] for a project root.
///
/// Canonicalizes the path before hashing so that symlinked mounts (e.g.
/// `/var` vs `/private/var` on macOS) produce the same id. If the root sits
/// inside a git worktree, the shared git common directory is hashed instead
/// of the per-worktree working directory, so every worktree of one
/// repository resolves to the same project.
pub fn project_id_from_root(project_root: &str) -> ProjectId {
    let path = Path::new(project_root);

    let hash_target = detect_git_common_dir(path).unwrap_or_else(|| normalize_path(path));
    ProjectId::from_source(&hash_target.to_string_lossy())
}

/// Detect the git common directory for worktree support.
///
/// Returns `Some(path)` only when the directory belongs to a worktree
/// (its git-dir differs from its git-common-dir). Returns `None` for
/// non-git directories and for a repository's primary checkout.
fn detect_git_common_dir(path: &Path) -> Option<PathBuf> {
    use std::process::Command;

    let git_dir = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(path)
        .output()
        .ok()?;

    let git_common_dir = Command::new("git")
        .args(["rev-parse", "--git-common-dir"])
        .current_dir(path)
        .output()
        .ok()?;

    if !git_dir.status.success() || !git_common_dir.status.success() {
        return None;
    }

    let git_dir_str = String::from_utf8_lossy(&git_dir.stdout);
    let git_common_dir_str = String::from_utf8_lossy(&git_common_dir.stdout);

    let git_dir_normalized = normalize_path(Path::new(git_dir_str.trim()));
    let git_common_dir_normalized = normalize_path(Path::new(git_common_dir_str.trim()));

    if git_dir_normalized != git_common_dir_normalized {
        Some(git_common_dir_normalized)
    } else {
        None
    }
}

/// Normalize a path for comparison: canonicalize if possible, else resolve
/// against the current working directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Whether two paths resolve to the same place after normalization.
pub fn paths_equal(path1: &Path, path2: &Path) -> bool {
    normalize_path(path1) == normalize_path(path2)
}

/// Discover the project root based on priority:
/// 1. `explicit_project_root`
/// 2. `FRAMESTACK_PROJECT_ROOT` environment variable
/// 3. Current working directory
pub fn discover_project_root(explicit_project_root: Option<&str>) -> Result<PathBuf> {
    if let Some(root) = explicit_project_root {
        return Ok(PathBuf::from(root));
    }

    if let Ok(env_root) = std::env::var("FRAMESTACK_PROJECT_ROOT") {
        return Ok(PathBuf::from(env_root));
    }

    Ok(std::env::current_dir()?)
}

/// Resolve the effective project id for the current process: explicit id if
/// given, otherwise derived from the discovered project root.
pub fn resolve_effective_project_id(explicit_id: Option<&ProjectId>) -> Result<ProjectId> {
    if let Some(id) = explicit_id {
        return Ok(id.clone());
    }
    let root = discover_project_root(None)?;
    Ok(project_id_from_root(&root.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn project_id_from_root_non_git_directory_is_stable() {
        let a = project_id_from_root("/tmp");
        let b = project_id_from_root("/tmp");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn detect_git_common_dir_non_git_returns_none() {
        assert!(detect_git_common_dir(Path::new("/tmp")).is_none());
    }

    #[test]
    fn git_worktrees_of_the_same_repo_share_a_project_id() {
        use std::fs;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let bare_repo = temp_dir.path().join("repo.git");
        let wt1 = temp_dir.path().join("wt1");
        let wt2 = temp_dir.path().join("wt2");

        let init = Command::new("git").args(["init", "--bare"]).arg(&bare_repo).output().unwrap();
        if !init.status.success() {
            return;
        }

        let temp_clone = temp_dir.path().join("temp_clone");
        let clone = Command::new("git").args(["clone"]).arg(&bare_repo).arg(&temp_clone).output().unwrap();
        if !clone.status.success() {
            return;
        }

        fs::write(temp_clone.join("README.md"), "# Test").unwrap();
        Command::new("git").args(["add", "."]).current_dir(&temp_clone).output().unwrap();
        Command::new("git")
            .args(["commit", "-m", "Initial commit"])
            .current_dir(&temp_clone)
            .output()
            .unwrap();
        Command::new("git").args(["push", "origin", "HEAD"]).current_dir(&temp_clone).output().ok();

        let branch_output = Command::new("git")
            .args(["branch", "--show-current"])
            .current_dir(&temp_clone)
            .output()
            .unwrap();
        let branch = String::from_utf8_lossy(&branch_output.stdout).trim().to_string();
        if branch.is_empty() {
            return;
        }

        let wt1_result = Command::new("git")
            .args(["worktree", "add"])
            .arg(&wt1)
            .arg(&branch)
            .current_dir(&bare_repo)
            .output()
            .unwrap();
        if !wt1_result.status.success() {
            return;
        }

        let wt2_result = Command::new("git")
            .args(["worktree", "add", "-b", "feature"])
            .arg(&wt2)
            .arg(&branch)
            .current_dir(&bare_repo)
            .output()
            .unwrap();
        if !wt2_result.status.success() {
            return;
        }

        let id1 = project_id_from_root(wt1.to_str().unwrap());
        let id2 = project_id_from_root(wt2.to_str().unwrap());
        assert_eq!(id1, id2, "worktrees of the same repository should share a project id");
    }
}
