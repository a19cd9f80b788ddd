//! Workspace sandbox path resolution.
//!
//! Every path a tool touches is first resolved against the workspace root and
//! checked to remain a descendant of it. The check is lexical (`.` and `..`
//! components are normalized without hitting the filesystem) so that paths to
//! files that do not exist yet can still be validated before a write.

use std::path::{Component, Path, PathBuf};

use crate::error::{AgentError, Result};

/// Resolve a step-supplied path to an absolute path inside the workspace.
///
/// Absolute input paths and paths whose `..` components climb out of the
/// workspace fail with [`AgentError::SandboxViolation`]; the caller must not
/// attempt the operation.
pub fn resolve(workspace_root: &Path, input: &str) -> Result<PathBuf> {
    let candidate = Path::new(input);
    if candidate.is_absolute() {
        return Err(violation(candidate, workspace_root));
    }

    let mut resolved = workspace_root.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the workspace root is an escape.
                if !resolved.pop() || !resolved.starts_with(workspace_root) {
                    return Err(violation(candidate, workspace_root));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(violation(candidate, workspace_root));
            }
        }
    }

    if resolved.starts_with(workspace_root) {
        Ok(resolved)
    } else {
        Err(violation(candidate, workspace_root))
    }
}

/// Lexical escape check used by the risk classifier, which must stay pure and
/// cannot assume the workspace exists.
pub fn escapes(input: &str) -> bool {
    let candidate = Path::new(input);
    if candidate.is_absolute() {
        return true;
    }

    let mut depth: i32 = 0;
    for component in candidate.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

fn violation(path: &Path, workspace: &Path) -> AgentError {
    AgentError::SandboxViolation {
        path: path.to_path_buf(),
        workspace: workspace.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_path_inside_workspace() {
        let ws = Path::new("/tmp/ws");
        assert_eq!(
            resolve(ws, "data/notes.txt").unwrap(),
            PathBuf::from("/tmp/ws/data/notes.txt")
        );
    }

    #[test]
    fn normalizes_internal_parent_components() {
        let ws = Path::new("/tmp/ws");
        assert_eq!(
            resolve(ws, "data/../out/summary.md").unwrap(),
            PathBuf::from("/tmp/ws/out/summary.md")
        );
    }

    #[test]
    fn rejects_absolute_paths() {
        let ws = Path::new("/tmp/ws");
        assert!(matches!(
            resolve(ws, "/etc/passwd"),
            Err(AgentError::SandboxViolation { .. })
        ));
    }

    #[test]
    fn rejects_escaping_parent_components() {
        let ws = Path::new("/tmp/ws");
        assert!(resolve(ws, "../outside.txt").is_err());
        assert!(resolve(ws, "data/../../outside.txt").is_err());
    }

    #[test]
    fn escape_check_matches_resolution() {
        assert!(!escapes("data/notes.txt"));
        assert!(!escapes("./a/../b"));
        assert!(escapes("../x"));
        assert!(escapes("/etc/passwd"));
        assert!(escapes("a/../../x"));
    }
}
