use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};
use crate::controllers::{DoorCapabilities, ProvidedDoor, PublishOutcome};
use crate::dispatcher::command::{DoorCommand, HELP};
use crate::errors::{DoorBusError, DoorBusResult};
use crate::models::RegistrationState;
use crate::state_management::DoorRegistry;

/// Process-wide harness state: the doors and the turn cursor selecting the current one.
pub struct HarnessContext {
    registry: DoorRegistry,
    turn: usize,
}

impl HarnessContext {
    /// Wraps a registry with the cursor on its first door.
    pub fn new(registry: DoorRegistry) -> DoorBusResult<Self> {
        if registry.is_empty() {
            return Err(DoorBusError::NoDoorsAvailable);
        }
        Ok(Self { registry, turn: 0 })
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn registry(&self) -> &DoorRegistry {
        &self.registry
    }

    /// The door the next command targets.
    pub fn current(&self) -> &Arc<ProvidedDoor> {
        // the cursor is always kept below the non-zero registry length
        &self.registry[self.turn]
    }

    fn advance(&mut self) {
        self.turn = (self.turn + 1) % self.registry.len();
    }
}

/// Whether the command loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// Routes operator commands to the doors in round-robin order.
///
/// Every accepted command except quit moves the cursor to the next door; help and invalid
/// input leave it where it is so the operator can retry on the same door.
pub struct RoundRobinDispatcher {
    context: HarnessContext,
}

impl RoundRobinDispatcher {
    pub fn new(registry: DoorRegistry) -> DoorBusResult<Self> {
        Ok(Self { context: HarnessContext::new(registry)? })
    }

    pub fn turn(&self) -> usize {
        self.context.turn()
    }

    pub fn context(&self) -> &HarnessContext {
        &self.context
    }

    pub fn registry(&self) -> &DoorRegistry {
        self.context.registry()
    }

    pub fn into_registry(self) -> DoorRegistry {
        self.context.registry
    }

    /// The prompt naming the door the next command targets.
    pub fn prompt(&self) -> String {
        format!("[next up is {}] >", self.context.current().location())
    }

    /// Reads commands from `input` until quit or end of input, prompting on `output` before each read.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> DoorBusResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Command loop started with {} doors", self.registry().len());
        let mut lines = input.lines();

        loop {
            output.write_all(self.prompt().as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                info!("Operator input closed");
                break;
            };

            if self.handle_line(&line, &mut output).await? == LoopControl::Quit {
                break;
            }
        }

        info!("Command loop stopped");
        Ok(())
    }

    /// Parses and executes a single line of input.
    pub async fn handle_line<W>(&mut self, line: &str, output: &mut W) -> DoorBusResult<LoopControl>
    where
        W: AsyncWrite + Unpin,
    {
        self.execute(DoorCommand::parse(line), output).await
    }

    /// Executes `command` against the current door and advances the cursor when the command is accepted
    ///
    /// Failures of the door operation are reported to the operator and the log; they never stop the loop.
    /// Only writing to `output` can fail this call.
    pub async fn execute<W>(&mut self, command: DoorCommand, output: &mut W) -> DoorBusResult<LoopControl>
    where
        W: AsyncWrite + Unpin,
    {
        debug!("Executing {:?} on door {}", command, self.context.turn());
        let door = Arc::clone(self.context.current());

        let outcome = match &command {
            DoorCommand::Quit => return Ok(LoopControl::Quit),
            DoorCommand::Flip => door.flip_open().await.map(|_| ()),
            DoorCommand::PassThrough(who) => door.announce_pass_through(who).await,
            DoorCommand::Reattach => Self::reattach(&door).await,
            DoorCommand::Next => Ok(()),
            DoorCommand::Help => {
                output.write_all(HELP.as_bytes()).await?;
                Ok(())
            }
            DoorCommand::Invalid(reason) => {
                debug!("Invalid input: {}", reason);
                output.write_all(HELP.as_bytes()).await?;
                Ok(())
            }
        };

        if let Err(e) = outcome {
            error!("Command {:?} on door @ {} failed: {}", command, door.location(), e);
            output.write_all(format!("{}\n", e).as_bytes()).await?;
        }

        if command.advances_turn() {
            self.context.advance();
        }
        Ok(LoopControl::Continue)
    }

    async fn reattach(door: &ProvidedDoor) -> DoorBusResult<()> {
        if door.registration_state().await == RegistrationState::Registered {
            door.retract().await
        } else {
            match door.publish().await? {
                PublishOutcome::Published => Ok(()),
                PublishOutcome::Reannounced => {
                    warn!("Door @ {} was re-announced instead of reattached", door.location());
                    Ok(())
                }
            }
        }
    }
}
