use std::ffi::{OsStr, OsString};
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, info};

use super::Executor;
use crate::error::{Error, Result};
use crate::planner::Action;

const BTRFS: &str = "btrfs";

/// The btrfs process(es) behind one action.
enum Invocation {
    Single(Vec<OsString>),
    /// `send` piped into `receive`.
    Pipe(Vec<OsString>, Vec<OsString>),
}

fn invocation(action: &Action) -> Invocation {
    match action {
        Action::CreateSnapshot {
            subvolume,
            snapshot,
        } => Invocation::Single(vec![
            "subvolume".into(),
            "snapshot".into(),
            "-r".into(),
            subvolume.into(),
            snapshot.into(),
        ]),
        Action::Send {
            snapshot,
            parent,
            destination,
        } => {
            let mut send: Vec<OsString> = vec!["send".into()];
            if let Some(parent) = parent {
                send.push("-p".into());
                send.push(parent.into());
            }
            send.push(snapshot.into());
            Invocation::Pipe(send, vec!["receive".into(), destination.into()])
        }
        Action::Delete { snapshot, .. } => Invocation::Single(vec![
            "subvolume".into(),
            "delete".into(),
            snapshot.into(),
        ]),
    }
}

fn render(program: &OsStr, args: &[OsString]) -> String {
    let mut line = program.to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

fn render_all(program: &OsStr, action: &Action) -> String {
    match invocation(action) {
        Invocation::Single(args) => render(program, &args),
        Invocation::Pipe(send, receive) => {
            format!("{} | {}", render(program, &send), render(program, &receive))
        }
    }
}

/// Shell-style rendering of the btrfs command(s) for `action`, for display
/// only.
pub fn command_line(action: &Action) -> String {
    render_all(OsStr::new(BTRFS), action)
}

/// Runs actions with the `btrfs` program.
#[derive(Debug, Clone)]
pub struct BtrfsExecutor {
    program: PathBuf,
}

impl Default for BtrfsExecutor {
    fn default() -> Self {
        Self {
            program: PathBuf::from(BTRFS),
        }
    }
}

impl BtrfsExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another binary in place of `btrfs`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args);
        command
    }

    fn spawn_error(&self, args: &[OsString], source: io::Error) -> Error {
        Error::Spawn {
            command: render(self.program.as_os_str(), args),
            source,
        }
    }

    fn check(&self, args: &[OsString], status: ExitStatus) -> Result<()> {
        if status.success() {
            return Ok(());
        }
        Err(Error::CommandFailed {
            command: render(self.program.as_os_str(), args),
            status: status.to_string(),
        })
    }

    fn run(&self, args: &[OsString]) -> Result<()> {
        let status = self
            .command(args)
            .status()
            .map_err(|err| self.spawn_error(args, err))?;
        self.check(args, status)
    }

    fn pipe(&self, send_args: &[OsString], receive_args: &[OsString]) -> Result<()> {
        let mut send = self
            .command(send_args)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|err| self.spawn_error(send_args, err))?;

        let stream = match send.stdout.take() {
            Some(stream) => stream,
            None => {
                abandon(&mut send);
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "send produced no output stream",
                )));
            }
        };

        let receive = self
            .command(receive_args)
            .stdin(Stdio::from(stream))
            .status();
        let receive_status = match receive {
            Ok(status) => status,
            Err(err) => {
                abandon(&mut send);
                return Err(self.spawn_error(receive_args, err));
            }
        };

        let send_status = send.wait()?;
        self.check(send_args, send_status)?;
        self.check(receive_args, receive_status)
    }
}

fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Executor for BtrfsExecutor {
    fn execute(&self, action: &Action) -> Result<()> {
        let line = render_all(self.program.as_os_str(), action);
        info!("Executing: {}", line);

        match invocation(action) {
            Invocation::Single(args) => self.run(&args)?,
            Invocation::Pipe(send, receive) => self.pipe(&send, &receive)?,
        }

        debug!("Finished: {}", line);
        Ok(())
    }
}

/// Logs what would run and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    fn execute(&self, action: &Action) -> Result<()> {
        info!("[DRY-RUN] Would execute: {}", command_line(action));
        Ok(())
    }
}
