use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Runner for executing agent CLI commands directly
///
/// The prompt goes to stdin; stdout is captured as the reply. Nothing is
/// echoed to the terminal: stdout of this process carries the final message
/// only, so agent output is logged at trace level instead.
#[derive(Debug, Default, Clone)]
pub struct ScriptRunner;

impl ScriptRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `command_name args...` with `prompt` on stdin, returning stdout
    ///
    /// The child is killed when the returned future is dropped, which is how
    /// timeouts and cancellation stop a running agent.
    pub async fn run(&self, command_name: &str, args: &[String], prompt: &str) -> Result<String> {
        let mut cmd = Command::new(command_name);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(command = command_name, ?args, "spawning agent");
        let mut child = cmd.spawn().with_context(|| {
            format!(
                "Command '{}' not found. Please ensure it is installed and in your PATH.",
                command_name
            )
        })?;

        // Feed the prompt from its own task: a CLI may start writing before it
        // has read all of stdin, and both pipes must keep moving
        let mut stdin = child.stdin.take().context("Failed to capture stdin")?;
        let input = prompt.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.flush().await
        });

        // Drain stdout and stderr concurrently to avoid backpressure deadlock
        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let mut output = String::new();
        let mut stderr_output = String::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_reader.next_line(), if !stdout_done => {
                    match line {
                        Ok(Some(line)) => {
                            tracing::trace!(command = command_name, "stdout: {}", line);
                            output.push_str(&line);
                            output.push('\n');
                        }
                        Ok(None) => stdout_done = true,
                        Err(e) => return Err(anyhow::anyhow!("Failed to read stdout: {}", e)),
                    }
                }
                line = stderr_reader.next_line(), if !stderr_done => {
                    match line {
                        Ok(Some(line)) => {
                            tracing::trace!(command = command_name, "stderr: {}", line);
                            stderr_output.push_str(&line);
                            stderr_output.push('\n');
                        }
                        Ok(None) => stderr_done = true,
                        Err(e) => return Err(anyhow::anyhow!("Failed to read stderr: {}", e)),
                    }
                }
            }
        }

        let status = child.wait().await?;

        if !status.success() {
            anyhow::bail!(
                "Command '{}' failed with exit code {:?}\nStderr: {}",
                command_name,
                status.code(),
                stderr_output.trim_end()
            );
        }

        writer
            .await
            .context("Stdin writer task failed")?
            .context("Failed to write to stdin")?;

        Ok(output)
    }
}
