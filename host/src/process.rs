use std::ffi::OsStr;
use std::io::{self, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};

use foodfight_core::{Action, FieldState, Symbol};
use serde::Deserialize;
use serde_json::de::IoRead;
use tracing::{debug, warn};

use crate::controller::{Canceller, Controller, ControllerError};

/// Controller backed by an agent subprocess speaking JSON over its pipes.
///
/// Per call the engine writes the field, the team symbol and the player
/// symbol as three JSON values, then reads one JSON value back: an action
/// name or `null`.
pub struct ProcessController {
    command: String,
    child: Arc<Mutex<Child>>,
    stdin: BufWriter<ChildStdin>,
    stdout: serde_json::Deserializer<IoRead<BufReader<ChildStdout>>>,
}

impl ProcessController {
    pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let command = program.as_ref().to_string_lossy().into_owned();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "agent stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "agent stdout unavailable"))?;
        debug!(%command, pid = child.id(), "agent started");

        Ok(Self {
            command,
            child: Arc::new(Mutex::new(child)),
            stdin: BufWriter::new(stdin),
            stdout: serde_json::Deserializer::from_reader(BufReader::new(stdout)),
        })
    }

    /// Spawn from a whitespace-separated command line.
    pub fn from_command_line(line: &str) -> io::Result<Self> {
        let mut words = line.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty agent command"))?;
        Self::spawn(program, words)
    }

    fn send_request(
        &mut self,
        field: &FieldState,
        team: Symbol,
        player: Symbol,
    ) -> Result<(), ControllerError> {
        serde_json::to_writer(&mut self.stdin, field)?;
        self.stdin.write_all(b"\n")?;
        serde_json::to_writer(&mut self.stdin, &team)?;
        self.stdin.write_all(b"\n")?;
        serde_json::to_writer(&mut self.stdin, &player)?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }
}

impl Controller for ProcessController {
    fn play_action(
        &mut self,
        field: &FieldState,
        team: Symbol,
        player: Symbol,
    ) -> Result<Option<Action>, ControllerError> {
        self.send_request(field, team, player)?;

        let response = match Option::<String>::deserialize(&mut self.stdout) {
            Ok(response) => response,
            Err(e) if e.is_eof() => return Err(ControllerError::Closed),
            Err(e) if e.is_io() => return Err(ControllerError::Io(e.into())),
            Err(e) => return Err(ControllerError::Json(e)),
        };

        Ok(response.and_then(|name| match name.parse::<Action>() {
            Ok(action) => Some(action),
            Err(e) => {
                warn!(
                    agent = %self.command,
                    %player,
                    error = %e,
                    "treating unknown action as no-op"
                );
                None
            }
        }))
    }

    fn canceller(&self) -> Option<Canceller> {
        let child = Arc::clone(&self.child);
        Some(Arc::new(move || {
            if let Ok(mut child) = child.lock() {
                let _ = child.kill();
            }
        }))
    }
}

impl Drop for ProcessController {
    fn drop(&mut self) {
        if let Ok(mut child) = self.child.lock() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
