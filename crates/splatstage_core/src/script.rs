// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entity action scripts.
//!
//! A script is a list of declarative actions, one per line. It can only
//! touch what a [`ScriptHost`] exposes: the owning entity, tooltips by name
//! and the camera. The whole script is parsed before anything runs, so a
//! syntax error anywhere applies nothing.
//!
//! ```text
//! # lines starting with '#' are comments
//! log Opening the door
//! entity translate 0 0.5 0
//! entity color #ff8800
//! tooltip show Door handle
//! camera fly 2 2 4 0 1 0 800
//! ```

use crate::state::parse_hex_color;
use glam::Vec3;
use std::time::Duration;
use thiserror::Error;

/// Default duration of `camera fly`
pub const DEFAULT_FLY_MS: u64 = 1000;

/// Script errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// First word of a line is not a known command
    #[error("line {line}: unknown command \"{command}\"")]
    UnknownCommand {
        /// 1-based line number
        line: usize,
        /// Offending command
        command: String,
    },

    /// Known command with bad arguments
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What is wrong
        message: String,
    },

    /// An action failed while running
    #[error("action {index} failed: {message}")]
    Failed {
        /// 0-based action index
        index: usize,
        /// Reason reported by the host
        message: String,
    },
}

/// Override applied by a `tooltip` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipCommand {
    /// Force visible
    Show,
    /// Force hidden
    Hide,
    /// Flip visibility
    Toggle,
    /// Hand control back to the trigger
    Release,
}

/// One parsed script line
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptAction {
    /// Write a message to the log
    Log(String),
    /// Show or hide the owning entity
    SetVisible(bool),
    /// Move the owning entity
    Translate(Vec3),
    /// Recolor the owning entity (normalized `rrggbb`)
    SetColor(String),
    /// Tooltip override by entity name
    Tooltip {
        /// What to do
        command: TooltipCommand,
        /// Entity name
        name: String,
    },
    /// Place the camera, optionally aiming it
    CameraSet {
        /// New position
        position: Vec3,
        /// Point to look at
        look_at: Option<Vec3>,
    },
    /// Offset the camera
    CameraMove(Vec3),
    /// Aim the camera
    CameraLookAt(Vec3),
    /// Restore the initial camera pose
    CameraReset,
    /// Animate the camera to a pose
    CameraFly {
        /// Destination
        position: Vec3,
        /// Point to look at on arrival
        look_at: Vec3,
        /// Animation length
        duration: Duration,
    },
    /// Cancel any camera animation
    CameraStop,
}

/// Capabilities a script may use
pub trait ScriptHost {
    /// Perform one action, or explain why it could not be done
    fn perform(&mut self, action: &ScriptAction) -> std::result::Result<(), String>;
}

/// A parsed script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    actions: Vec<ScriptAction>,
}

impl Script {
    /// Parse a script. Blank lines and `#` comments are skipped.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut actions = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            actions.push(parse_line(index + 1, line)?);
        }
        Ok(Self { actions })
    }

    /// Parsed actions in order
    pub fn actions(&self) -> &[ScriptAction] {
        &self.actions
    }

    /// Whether there is nothing to run
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every action against `host`, stopping at the first failure.
    /// Returns the number of actions performed.
    pub fn run(&self, host: &mut dyn ScriptHost) -> Result<usize, ScriptError> {
        for (index, action) in self.actions.iter().enumerate() {
            host.perform(action)
                .map_err(|message| ScriptError::Failed { index, message })?;
        }
        Ok(self.actions.len())
    }
}

/// Text after the first `n` words, with inner spacing kept
fn rest_after(line: &str, n: usize) -> &str {
    let mut rest = line;
    for _ in 0..n {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    rest.trim()
}

fn syntax(line: usize, message: impl Into<String>) -> ScriptError {
    ScriptError::Syntax {
        line,
        message: message.into(),
    }
}

fn parse_vec3(line: usize, words: &[&str]) -> Result<Vec3, ScriptError> {
    let [x, y, z] = words else {
        return Err(syntax(line, format!("expected 3 numbers, got {}", words.len())));
    };
    let mut out = [0.0f32; 3];
    for (slot, word) in out.iter_mut().zip([x, y, z]) {
        *slot = word
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| syntax(line, format!("\"{}\" is not a finite number", word)))?;
    }
    Ok(Vec3::from_array(out))
}

fn parse_line(line: usize, text: &str) -> Result<ScriptAction, ScriptError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let head = words.first().copied().unwrap_or_default();
    let sub = words.get(1).copied().unwrap_or_default();
    let args = words.get(2..).unwrap_or_default();

    match head {
        "log" => Ok(ScriptAction::Log(rest_after(text, 1).to_string())),
        "entity" => match sub {
            "show" | "hide" if args.is_empty() => Ok(ScriptAction::SetVisible(sub == "show")),
            "translate" => Ok(ScriptAction::Translate(parse_vec3(line, args)?)),
            "color" => match args {
                [hex] => parse_hex_color(hex)
                    .map(ScriptAction::SetColor)
                    .ok_or_else(|| syntax(line, format!("\"{}\" is not a #rrggbb color", hex))),
                _ => Err(syntax(line, "entity color takes one #rrggbb argument")),
            },
            _ => Err(syntax(line, format!("unknown entity action \"{}\"", sub))),
        },
        "tooltip" => {
            let command = match sub {
                "show" => TooltipCommand::Show,
                "hide" => TooltipCommand::Hide,
                "toggle" => TooltipCommand::Toggle,
                "release" => TooltipCommand::Release,
                _ => return Err(syntax(line, format!("unknown tooltip action \"{}\"", sub))),
            };
            let name = rest_after(text, 2);
            if name.is_empty() {
                return Err(syntax(line, "tooltip action needs a model name"));
            }
            Ok(ScriptAction::Tooltip {
                command,
                name: name.to_string(),
            })
        }
        "camera" => match sub {
            "set" => match args.len() {
                3 => Ok(ScriptAction::CameraSet {
                    position: parse_vec3(line, args)?,
                    look_at: None,
                }),
                6 => Ok(ScriptAction::CameraSet {
                    position: parse_vec3(line, &args[..3])?,
                    look_at: Some(parse_vec3(line, &args[3..])?),
                }),
                n => Err(syntax(line, format!("camera set takes 3 or 6 numbers, got {}", n))),
            },
            "move" => Ok(ScriptAction::CameraMove(parse_vec3(line, args)?)),
            "look_at" => Ok(ScriptAction::CameraLookAt(parse_vec3(line, args)?)),
            "reset" if args.is_empty() => Ok(ScriptAction::CameraReset),
            "stop" if args.is_empty() => Ok(ScriptAction::CameraStop),
            "fly" => {
                if args.len() != 6 && args.len() != 7 {
                    return Err(syntax(line, format!("camera fly takes 6 numbers and an optional duration, got {}", args.len())));
                }
                let millis = match args.get(6) {
                    Some(word) => word
                        .parse::<u64>()
                        .map_err(|_| syntax(line, format!("\"{}\" is not a duration in ms", word)))?,
                    None => DEFAULT_FLY_MS,
                };
                Ok(ScriptAction::CameraFly {
                    position: parse_vec3(line, &args[..3])?,
                    look_at: parse_vec3(line, &args[3..6])?,
                    duration: Duration::from_millis(millis),
                })
            }
            _ => Err(syntax(line, format!("unknown camera action \"{}\"", sub))),
        },
        _ => Err(ScriptError::UnknownCommand {
            line,
            command: head.to_string(),
        }),
    }
}
