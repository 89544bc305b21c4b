use crate::error::{Result, StackError};
use crate::pipeline::StackRunner;
use crate::stack::NetStack;
use std::time::Duration;
use tokio::runtime;
use tracing::{info, warn};

/// Blocking entry point for binaries: starts `stack`, then runs it on a fresh tokio runtime
/// until the process gets an interrupt, and returns the stack so its stats can be reported.
///
/// The runner task is the only thing touching the stack while it runs; callers wanting to send
/// from elsewhere should build their own runtime around `StackRunner` and keep its handle.
pub fn run_until_interrupted(mut stack: NetStack, poll_interval: Duration) -> Result<NetStack> {
    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StackError::Driver)?;

    stack.start()?;
    let (runner, handle) = StackRunner::new(stack, poll_interval);

    rt.block_on(async move {
        let task = tokio::spawn(runner.run());

        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupted, shutting down"),
            Err(err) => warn!(%err, "can't listen for interrupts, shutting down"),
        }
        // A runner that already exited has nothing left to stop
        let _ = handle.shutdown().await;

        task.await.map_err(|_| StackError::RunnerStopped)?
    })
}
