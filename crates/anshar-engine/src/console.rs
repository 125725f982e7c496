//! Interactive stdin console.
//!
//! A background thread reads lines from stdin and hands them to the render
//! loop over a channel, so the loop never blocks on terminal input. Lines are
//! parsed into typed [`ConsoleCommand`]s; applying them is up to the
//! application.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    MoveForward(f32),
    MoveBackward(f32),
    MoveLeft(f32),
    MoveRight(f32),
    Aim { dx: f64, dy: f64 },
    Goto { x: f32, y: f32, z: f32 },
    Shader(String),
    Help,
    Quit,
}

/// Handle to the console reader thread.
pub struct Console {
    receiver: Receiver<String>,
    closed: bool,
}

impl Console {
    /// Spawns the reader thread and returns the console handle.
    ///
    /// The thread exits on end-of-input or an empty line.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();

        thread::Builder::new()
            .name("console-stdin".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        break;
                    }
                    if sender.send(line).is_err() {
                        break;
                    }
                }
            })
            .expect("failed to spawn console thread");

        Self {
            receiver,
            closed: false,
        }
    }

    /// Drains pending lines and returns the commands they parsed to.
    ///
    /// Unparseable lines are logged and skipped.
    pub fn poll(&mut self) -> Vec<ConsoleCommand> {
        let mut commands = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(line) => match parse_command(&line) {
                    Some(cmd) => commands.push(cmd),
                    None => log::warn!("invalid command: {line}"),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }

        commands
    }

    /// True once the reader thread has exited.
    pub fn closed(&self) -> bool {
        self.closed
    }
}

/// Prints the command reference to stdout.
pub fn print_help() {
    println!("commands:");
    println!("  forward|back|left|right [amount]   move the camera");
    println!("  aim <dx> <dy>                      rotate the view");
    println!("  goto <x> <y> <z>                   teleport the camera");
    println!("  shader <name>                      switch the scene shader");
    println!("  help                               show this text");
    println!("  quit                               exit the viewer");
}

/// Parses one console line. Returns `None` when the line is not a command.
pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next()?;

    let cmd = match verb {
        "forward" => ConsoleCommand::MoveForward(parse_amount(tokens.next())?),
        "back" | "backward" => ConsoleCommand::MoveBackward(parse_amount(tokens.next())?),
        "left" => ConsoleCommand::MoveLeft(parse_amount(tokens.next())?),
        "right" => ConsoleCommand::MoveRight(parse_amount(tokens.next())?),

        "aim" => {
            let dx = tokens.next()?.parse().ok()?;
            let dy = tokens.next()?.parse().ok()?;
            ConsoleCommand::Aim { dx, dy }
        }

        "goto" => {
            let x = tokens.next()?.parse().ok()?;
            let y = tokens.next()?.parse().ok()?;
            let z = tokens.next()?.parse().ok()?;
            ConsoleCommand::Goto { x, y, z }
        }

        "shader" => ConsoleCommand::Shader(tokens.next()?.to_string()),

        "help" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,

        _ => return None,
    };

    // Trailing tokens mean the line was not what we parsed it as.
    if tokens.next().is_some() {
        return None;
    }

    Some(cmd)
}

fn parse_amount(token: Option<&str>) -> Option<f32> {
    match token {
        Some(t) => t.parse().ok(),
        None => Some(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_amount_defaults_to_one() {
        assert_eq!(parse_command("forward"), Some(ConsoleCommand::MoveForward(1.0)));
        assert_eq!(parse_command("left 0.5"), Some(ConsoleCommand::MoveLeft(0.5)));
    }

    #[test]
    fn backward_accepts_both_spellings() {
        assert_eq!(parse_command("back 2"), Some(ConsoleCommand::MoveBackward(2.0)));
        assert_eq!(
            parse_command("backward 2"),
            Some(ConsoleCommand::MoveBackward(2.0))
        );
    }

    #[test]
    fn aim_and_goto_take_coordinates() {
        assert_eq!(
            parse_command("aim 10 -4"),
            Some(ConsoleCommand::Aim { dx: 10.0, dy: -4.0 })
        );
        assert_eq!(
            parse_command("goto 1 2.5 -3"),
            Some(ConsoleCommand::Goto {
                x: 1.0,
                y: 2.5,
                z: -3.0
            })
        );
    }

    #[test]
    fn shader_takes_a_name() {
        assert_eq!(
            parse_command("shader wireframe"),
            Some(ConsoleCommand::Shader("wireframe".to_string()))
        );
        assert_eq!(parse_command("shader"), None);
    }

    #[test]
    fn rejects_unknown_and_malformed_lines() {
        assert_eq!(parse_command("launch missiles"), None);
        assert_eq!(parse_command("goto 1 2"), None);
        assert_eq!(parse_command("forward fast"), None);
        assert_eq!(parse_command("quit now"), None);
    }

    #[test]
    fn quit_accepts_exit_alias() {
        assert_eq!(parse_command("quit"), Some(ConsoleCommand::Quit));
        assert_eq!(parse_command("exit"), Some(ConsoleCommand::Quit));
    }
}
