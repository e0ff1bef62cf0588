//! A D-Bus service client driven through busctl.
//!
//! [`Dbus`] wires the codec to the command runner: arguments are marshalled
//! into busctl text, busctl runs, and its output is unmarshalled back into a
//! [`Value`].
//!
//! ```no_run
//! use busctl_core::client::{CallOptions, Dbus};
//!
//! let dbus = Dbus::new("org.freedesktop.NetworkManager");
//! let devices = dbus
//!     .get_property(
//!         "/org/freedesktop/NetworkManager",
//!         "org.freedesktop.NetworkManager",
//!         "Devices",
//!         &CallOptions::default(),
//!     )
//!     .unwrap();
//! println!("{devices}");
//! ```

use crate::command::{BusctlCommand, Executor, Method, ProcessExecutor, Response};
use crate::decoder::unmarshal_response;
use crate::encoder::{marshal, Payload};
use crate::error::Result;
use crate::value::Value;

/// Per-invocation busctl settings.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub use_sudo: bool,
    /// `--name[=value]` options, in order.
    pub options: Vec<(String, Option<String>)>,
}

impl CallOptions {
    pub fn sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.options.push((name.into(), value));
        self
    }
}

/// Client bound to one D-Bus service.
#[derive(Debug, Clone)]
pub struct Dbus<E = ProcessExecutor> {
    service: String,
    program: String,
    executor: E,
}

impl Dbus<ProcessExecutor> {
    pub fn new(service: impl Into<String>) -> Self {
        Dbus::with_executor(service, ProcessExecutor)
    }
}

impl<E: Executor> Dbus<E> {
    pub fn with_executor(service: impl Into<String>, executor: E) -> Self {
        Dbus {
            service: service.into(),
            program: "busctl".to_string(),
            executor,
        }
    }

    /// Use a different busctl binary (path or name).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Invoke a method and decode its reply.
    pub fn call<'a>(
        &self,
        object_path: &str,
        interface: &str,
        method: &str,
        args: impl Into<Payload<'a>>,
        options: &CallOptions,
    ) -> Result<Value> {
        let attributes = self.attributes(object_path, interface, method, marshal(args)?);
        self.run(Method::Call, options, &attributes)
            .and_then(decode)
    }

    /// Emit a signal.
    pub fn emit<'a>(
        &self,
        object_path: &str,
        interface: &str,
        signal: &str,
        value: impl Into<Payload<'a>>,
        options: &CallOptions,
    ) -> Result<()> {
        let attributes = self.attributes(object_path, interface, signal, marshal(value)?);
        self.run(Method::Emit, options, &attributes).map(drop)
    }

    /// Read a property's current value.
    pub fn get_property(
        &self,
        object_path: &str,
        interface: &str,
        name: &str,
        options: &CallOptions,
    ) -> Result<Value> {
        let attributes = self.attributes(object_path, interface, name, None);
        self.run(Method::GetProperty, options, &attributes)
            .and_then(decode)
    }

    /// Write a property.
    pub fn set_property<'a>(
        &self,
        object_path: &str,
        interface: &str,
        name: &str,
        value: impl Into<Payload<'a>>,
        options: &CallOptions,
    ) -> Result<()> {
        let attributes = self.attributes(object_path, interface, name, marshal(value)?);
        self.run(Method::SetProperty, options, &attributes).map(drop)
    }

    fn attributes(
        &self,
        object_path: &str,
        interface: &str,
        member: &str,
        marshalled: Option<String>,
    ) -> Vec<String> {
        let mut attributes = vec![
            self.service.clone(),
            object_path.to_string(),
            interface.to_string(),
            member.to_string(),
        ];
        attributes.extend(marshalled);
        attributes
    }

    fn run(
        &self,
        method: Method,
        options: &CallOptions,
        attributes: &[String],
    ) -> Result<Response> {
        let mut command = BusctlCommand::new().with_program(self.program.as_str());
        command
            .set_method(method)
            .set_use_sudo(options.use_sudo)
            .add_options(options.options.iter().cloned());
        command.execute_with(&self.executor, attributes)
    }
}

fn decode(response: Response) -> Result<Value> {
    match response.into_text() {
        Some(text) => unmarshal_response(&text),
        None => Ok(Value::Null),
    }
}
