// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess spawning and line-streaming helpers shared by the concrete
//! `RunnerAdapter` implementations.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

/// Bounded wait for the runner's `init` event (spec.md §5 "Timeouts").
pub const SPAWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Subprocess graceful-exit grace period before a forceful kill (spec.md
/// §4.1 `Stop()`, §5 "Timeouts").
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// Spawns `cmd` with stdout piped and stdin piped (for flavors that
/// support streaming input), returning the child and a line reader over
/// its stdout.
pub fn spawn_streaming(mut cmd: Command) -> std::io::Result<(Child, Lines<BufReader<ChildStdout>>)> {
    cmd.stdout(Stdio::piped());
    cmd.stdin(Stdio::piped());
    cmd.stderr(Stdio::piped());
    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take().ok_or_else(|| {
        std::io::Error::other("spawned child has no stdout handle")
    })?;
    Ok((child, BufReader::new(stdout).lines()))
}

/// Sends SIGTERM (via `Child::start_kill` on platforms without a nicer
/// primitive) and waits up to `grace` for exit before escalating to a
/// forceful kill. Idempotent: a child that has already exited is a no-op.
pub async fn stop_with_grace(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if child.try_wait()?.is_some() {
        return Ok(());
    }
    child.start_kill()?;
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(_) => Ok(()),
        Err(_elapsed) => {
            child.kill().await?;
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
