use crate::error::{Result, StackError};
use crate::stack::NetStack;
use crate::stats::StackStats;
use futures::channel::oneshot;
use netstack_packets::IpProtocol;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How many commands may queue up before senders wait.
const COMMAND_QUEUE_DEPTH: usize = 64;

/// Requests a `StackHandle` passes to the task that owns the stack.
pub enum StackCommand {
    SendDatagram {
        payload: Vec<u8>,
        dest: Ipv4Addr,
        protocol: IpProtocol,
        done: oneshot::Sender<Result<()>>,
    },
    Stats(oneshot::Sender<StackStats>),
    Shutdown,
}

/// Owns a `NetStack` on a single task: it drains the driver every `poll_interval` and runs
/// commands as they arrive, so no two operations ever touch the stack at once.
pub struct StackRunner {
    stack: NetStack,
    commands: mpsc::Receiver<StackCommand>,
    poll_interval: Duration,
}

/// Cloneable front end to a running `StackRunner`.
#[derive(Clone)]
pub struct StackHandle {
    commands: mpsc::Sender<StackCommand>,
}

impl StackRunner {
    pub fn new(stack: NetStack, poll_interval: Duration) -> (StackRunner, StackHandle) {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let runner = StackRunner {
            stack,
            commands: receiver,
            poll_interval,
        };
        (runner, StackHandle { commands: sender })
    }

    /// Runs until a shutdown command arrives or every handle is dropped, then gives the stack
    /// back. The stack should already be started.
    ///
    /// Driver failures while polling are logged and polling resumes on the next tick.
    pub async fn run(mut self) -> Result<NetStack> {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(poll_interval = ?self.poll_interval, "stack runner started");

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(StackCommand::Shutdown) | None => break,
                    Some(command) => self.execute(command),
                },
                _ = ticker.tick() => self.drain_driver(),
            }
        }

        info!("stack runner stopped");
        Ok(self.stack)
    }

    fn drain_driver(&mut self) {
        loop {
            match self.stack.poll() {
                Ok(true) => continue,
                Ok(false) => return,
                Err(err) => {
                    warn!(%err, "polling the stack failed");
                    return;
                }
            }
        }
    }

    fn execute(&mut self, command: StackCommand) {
        match command {
            StackCommand::SendDatagram {
                payload,
                dest,
                protocol,
                done,
            } => {
                let result = self.stack.send_datagram(&payload, dest, protocol);
                if let Err(err) = &result {
                    warn!(%err, %dest, "sending datagram failed");
                }
                if done.send(result).is_err() {
                    debug!("send requester went away");
                }
            }
            StackCommand::Stats(reply) => {
                let _ = reply.send(self.stack.stats().clone());
            }
            StackCommand::Shutdown => {}
        }
    }
}

impl StackHandle {
    async fn submit(&self, command: StackCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| StackError::RunnerStopped)
    }

    pub async fn send_datagram(
        &self,
        payload: Vec<u8>,
        dest: Ipv4Addr,
        protocol: IpProtocol,
    ) -> Result<()> {
        let (done, result) = oneshot::channel();
        self.submit(StackCommand::SendDatagram {
            payload,
            dest,
            protocol,
            done,
        })
        .await?;
        result.await.map_err(|_| StackError::RunnerStopped)?
    }

    pub async fn stats(&self) -> Result<StackStats> {
        let (reply, stats) = oneshot::channel();
        self.submit(StackCommand::Stats(reply)).await?;
        stats.await.map_err(|_| StackError::RunnerStopped)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.submit(StackCommand::Shutdown).await
    }
}
