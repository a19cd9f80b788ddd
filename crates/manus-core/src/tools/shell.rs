//! Shell tool: allow-listed command execution with enforced timeouts.
//!
//! Commands never pass through a shell. The command string is tokenized with
//! minimal quoting support and the argv is spawned directly, so shell
//! metacharacters (pipes, redirection, substitution) are rejected outright
//! before any process exists. The leading token must match the allow-list;
//! `python3` is only accepted in `python3 -c` form.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::{json, Map, Value};
use tokio::process::Command;
use tokio::time::timeout;

use super::{Tool, ToolOutput};
use crate::error::{AgentError, Result};

/// Leading tokens permitted to execute.
pub const DEFAULT_ALLOWLIST: &[&str] = &["ls", "cat", "grep", "wc", "head", "tail", "python3", "mkdir"];

/// Default command time bound in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Metacharacters that would require shell interpretation.
const SHELL_METACHARACTERS: &[char] = &['|', ';', '&', '>', '<', '`', '$', '(', ')'];

/// Tool for executing allow-listed commands inside the workspace.
pub struct ShellTool {
    workspace_root: PathBuf,
    allowlist: Vec<String>,
    default_timeout_secs: u64,
}

impl ShellTool {
    /// Registry name of the shell tool.
    pub const NAME: &'static str = "shell";

    /// Create a shell tool with the default allow-list and timeout.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            allowlist: DEFAULT_ALLOWLIST.iter().map(ToString::to_string).collect(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Replace the allow-list.
    pub fn with_allowlist(mut self, allowlist: Vec<String>) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Replace the default timeout.
    pub fn with_default_timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    /// Check a command against the allow-list and tokenize it.
    ///
    /// Fails with [`AgentError::CommandNotAllowed`] before any process is
    /// spawned.
    pub fn check_command(&self, cmd: &str) -> Result<Vec<String>> {
        let argv = tokenize(cmd).map_err(|reason| AgentError::CommandNotAllowed {
            command: cmd.to_string(),
            reason,
        })?;

        let Some(leading) = argv.first() else {
            return Err(AgentError::CommandNotAllowed {
                command: cmd.to_string(),
                reason: "empty command".to_string(),
            });
        };

        if !self.allowlist.iter().any(|allowed| allowed == leading) {
            return Err(AgentError::CommandNotAllowed {
                command: cmd.to_string(),
                reason: format!(
                    "leading token '{leading}' is not in the allow-list [{}]",
                    self.allowlist.join(", ")
                ),
            });
        }

        // Interpreter invocations are confined to inline snippets; running
        // arbitrary script files would bypass the allow-list.
        if leading == "python3" && argv.get(1).map(String::as_str) != Some("-c") {
            return Err(AgentError::CommandNotAllowed {
                command: cmd.to_string(),
                reason: "python3 is only allowed with -c".to_string(),
            });
        }

        Ok(argv)
    }

    async fn run(&self, cmd: &str, timeout_secs: u64) -> Result<ToolOutput> {
        let argv = self.check_command(cmd)?;
        debug!("shell run {argv:?} (timeout {timeout_secs}s)");

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .current_dir(&self.workspace_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so terminating the child on timeout or
        // cancellation cannot signal the agent itself.
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            AgentError::tool(Self::NAME, format!("failed to spawn '{}': {e}", argv[0]))
        })?;

        // wait_with_output consumes the child, so capture the pid first.
        // With process_group(0) the pid doubles as the process group id.
        #[cfg(unix)]
        let pgid = child.id();

        let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(AgentError::tool(
                    Self::NAME,
                    format!("failed to wait for '{}': {e}", argv[0]),
                ));
            }
            Err(_) => {
                // kill_on_drop reaps only the direct child; anything it
                // spawned stays in the group and must be signalled too.
                #[cfg(unix)]
                kill_process_group(pgid);
                return Err(AgentError::Timeout {
                    command: cmd.to_string(),
                    timeout_secs,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let return_code = output.status.code().unwrap_or(-1);

        // stdout/stderr are always captured into the trace, success or not.
        Ok(ToolOutput {
            success: output.status.success(),
            data: Some(json!({
                "stdout": stdout,
                "stderr": stderr,
                "return_code": return_code,
                "command": cmd,
            })),
            error: if output.status.success() {
                None
            } else {
                Some(format!("command exited with status {return_code}: {stderr}"))
            },
        })
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, inputs: &Map<String, Value>) -> Result<ToolOutput> {
        let cmd = inputs
            .get("cmd")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::tool(Self::NAME, "missing 'cmd' in inputs"))?;
        let timeout_secs = inputs
            .get("timeout")
            .and_then(Value::as_u64)
            .unwrap_or(self.default_timeout_secs);

        self.run(cmd, timeout_secs).await
    }
}

/// SIGKILL an entire process group.
///
/// An error from `killpg` means the group already exited; the wait future
/// being dropped reaps the direct child either way.
#[cfg(unix)]
fn kill_process_group(pgid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = pgid else { return };
    if let Ok(pgid) = i32::try_from(pgid) {
        let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
    }
}

/// Tokenize a command with minimal single/double quote support.
///
/// Shell metacharacters outside quotes are rejected; there is no variable
/// expansion, globbing or redirection.
fn tokenize(cmd: &str) -> std::result::Result<Vec<String>, String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = cmd.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_token = true;
                let quote = c;
                loop {
                    match chars.next() {
                        Some(inner) if inner == quote => break,
                        Some(inner) => current.push(inner),
                        None => return Err(format!("unterminated {quote} quote")),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    argv.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c if SHELL_METACHARACTERS.contains(&c) => {
                return Err(format!("shell metacharacter '{c}' is not allowed"));
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        argv.push(current);
    }
    Ok(argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("ls -la data").unwrap(), vec!["ls", "-la", "data"]);
    }

    #[test]
    fn tokenize_respects_quotes() {
        assert_eq!(
            tokenize("grep 'two words' notes.txt").unwrap(),
            vec!["grep", "two words", "notes.txt"]
        );
        // Metacharacters inside quotes are literal text, not shell syntax.
        assert_eq!(
            tokenize("python3 -c \"print(1)\"").unwrap(),
            vec!["python3", "-c", "print(1)"]
        );
    }

    #[test]
    fn tokenize_rejects_metacharacters() {
        assert!(tokenize("cat a.txt | grep x").is_err());
        assert!(tokenize("cat a.txt > /etc/passwd").is_err());
        assert!(tokenize("ls; rm -rf /").is_err());
    }

    #[test]
    fn tokenize_rejects_unterminated_quote() {
        assert!(tokenize("grep 'unterminated").is_err());
    }

    #[test]
    fn check_command_allows_listed_commands() {
        let tool = ShellTool::new("/tmp/ws");
        assert_eq!(tool.check_command("ls -la").unwrap(), vec!["ls", "-la"]);
        assert!(tool.check_command("wc -l notes.txt").is_ok());
    }

    #[test]
    fn check_command_rejects_unlisted_commands() {
        let tool = ShellTool::new("/tmp/ws");
        let err = tool.check_command("rm -rf *").unwrap_err();
        match err {
            AgentError::CommandNotAllowed { reason, .. } => {
                assert!(reason.contains("'rm'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn check_command_requires_python_inline_form() {
        let tool = ShellTool::new("/tmp/ws");
        assert!(tool.check_command("python3 script.py").is_err());
        assert!(tool.check_command("python3 -c 'print 1'").is_ok());
    }
}
