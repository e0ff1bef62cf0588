//! Build and run `busctl` command lines.
//!
//! [`BusctlCommand`] assembles `[sudo] busctl [--option[=value]]... <method> <attributes>...`.
//! Execution goes through an [`Executor`], so the client can be driven by a
//! fake in tests; [`ProcessExecutor`] spawns the real process.
//!
//! Attributes are split the way a shell would split them: a marshalled
//! argument string such as `ss "hello world" "x"` becomes the separate argv
//! entries `ss`, `hello world`, `x`.

use crate::error::{BusctlError, Result};
use crate::tokenize::{tokenize, unquote};
use std::fmt;
use std::process::Command;
use tracing::debug;

/// The busctl verbs this crate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Call,
    Emit,
    GetProperty,
    SetProperty,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Call => "call",
            Method::Emit => "emit",
            Method::GetProperty => "get-property",
            Method::SetProperty => "set-property",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a successful busctl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Empty,
    Line(String),
    Lines(Vec<String>),
}

impl Response {
    pub fn from_lines(mut lines: Vec<String>) -> Self {
        match lines.len() {
            0 => Response::Empty,
            1 => Response::Line(lines.remove(0)),
            _ => Response::Lines(lines),
        }
    }

    /// All output as one string (lines joined by `\n`), `None` when empty.
    pub fn into_text(self) -> Option<String> {
        match self {
            Response::Empty => None,
            Response::Line(line) => Some(line),
            Response::Lines(lines) => Some(lines.join("\n")),
        }
    }
}

/// Runs a prepared argv (`args[0]` is the program).
pub trait Executor {
    fn execute(&self, args: &[String]) -> Result<Response>;
}

/// Spawns the command and captures stdout followed by stderr, like `2>&1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&self, args: &[String]) -> Result<Response> {
        let Some((program, rest)) = args.split_first() else {
            return Err(BusctlError::InvalidInput("empty command line".to_string()));
        };

        debug!(command = %args.join(" "), "executing busctl");
        let output = Command::new(program).args(rest).output()?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            debug!(code, "busctl exited with failure");
            return Err(BusctlError::CommandFailure {
                code,
                message: lines.into_iter().next().unwrap_or_default(),
            });
        }

        Ok(Response::from_lines(lines))
    }
}

/// A busctl invocation under construction.
#[derive(Debug, Clone)]
pub struct BusctlCommand {
    program: String,
    method: Option<Method>,
    use_sudo: bool,
    options: Vec<(String, Option<String>)>,
}

impl Default for BusctlCommand {
    fn default() -> Self {
        BusctlCommand {
            program: "busctl".to_string(),
            method: None,
            use_sudo: false,
            options: Vec::new(),
        }
    }
}

impl BusctlCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different busctl binary (path or name).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = Some(method);
        self
    }

    pub fn set_use_sudo(&mut self, use_sudo: bool) -> &mut Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Add `--name` or `--name=value`. Adding a name again replaces its value
    /// but keeps its original position.
    pub fn add_option(&mut self, name: impl Into<String>, value: Option<String>) -> &mut Self {
        let name = name.into();
        match self.options.iter_mut().find(|(existing, _)| *existing == name) {
            Some(option) => option.1 = value,
            None => self.options.push((name, value)),
        }
        self
    }

    pub fn add_options<I, N>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, Option<String>)>,
        N: Into<String>,
    {
        for (name, value) in options {
            self.add_option(name, value);
        }
        self
    }

    fn head(&self) -> Result<Vec<String>> {
        let method = self.method.ok_or(BusctlError::MissingMethod)?;
        let mut parts = Vec::with_capacity(self.options.len() + 3);
        if self.use_sudo {
            parts.push("sudo".to_string());
        }
        parts.push(self.program.clone());
        for (name, value) in &self.options {
            parts.push(match value {
                Some(value) => format!("--{name}={value}"),
                None => format!("--{name}"),
            });
        }
        parts.push(method.as_str().to_string());
        Ok(parts)
    }

    /// The command line as a single display string, attributes appended as given.
    ///
    /// ```
    /// use busctl_core::command::{BusctlCommand, Method};
    ///
    /// let line = BusctlCommand::new()
    ///     .set_method(Method::Call)
    ///     .set_use_sudo(true)
    ///     .add_option("timeout", Some("5".to_string()))
    ///     .to_command_string(&["org.example".to_string()])
    ///     .unwrap();
    /// assert_eq!(line, "sudo busctl --timeout=5 call org.example");
    /// ```
    pub fn to_command_string(&self, attributes: &[String]) -> Result<String> {
        let mut parts = self.head()?;
        parts.extend(attributes.iter().cloned());
        Ok(parts.join(" "))
    }

    /// The argv to spawn. Each attribute is tokenized and unquoted.
    pub fn to_args(&self, attributes: &[String]) -> Result<Vec<String>> {
        let mut args = self.head()?;
        for attribute in attributes {
            args.extend(tokenize(attribute).iter().map(|token| unquote(token)));
        }
        Ok(args)
    }

    /// Run with the real busctl process.
    pub fn execute(&self, attributes: &[String]) -> Result<Response> {
        self.execute_with(&ProcessExecutor, attributes)
    }

    pub fn execute_with(&self, executor: &dyn Executor, attributes: &[String]) -> Result<Response> {
        executor.execute(&self.to_args(attributes)?)
    }
}
