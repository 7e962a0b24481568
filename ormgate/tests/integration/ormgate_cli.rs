// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use ormgate_metadata::ReconcileSummary;
use std::{
    borrow::Cow,
    collections::HashMap,
    ffi::OsString,
    fmt,
    io::Write,
    process::{Command, ExitStatus, Stdio},
};

/// Environment variables read by ormgate that must not leak in from the test environment.
const ORMGATE_ENV_VARS: &[&str] = &[
    "ORMGATE_LOG",
    "ORMGATE_VERBOSE",
    "ORMGATE_COLOR",
    "ORMGATE_CONFIG",
];

#[derive(Clone, Debug)]
pub struct OrmgateCli {
    bin: Utf8PathBuf,
    args: Vec<String>,
    envs: HashMap<OsString, OsString>,
    current_dir: Option<Utf8PathBuf>,
    stdin: Option<Vec<u8>>,
    unchecked: bool,
}

impl OrmgateCli {
    pub fn new() -> Self {
        Self {
            bin: env!("CARGO_BIN_EXE_ormgate").into(),
            args: vec!["--color".to_owned(), "never".to_owned()],
            envs: HashMap::new(),
            current_dir: None,
            stdin: None,
            unchecked: false,
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(&mut self, arg: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(arg.into_iter().map(Into::into));
        self
    }

    pub fn env(&mut self, k: impl Into<OsString>, v: impl Into<OsString>) -> &mut Self {
        self.envs.insert(k.into(), v.into());
        self
    }

    pub fn current_dir(&mut self, dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdin(&mut self, stdin: impl Into<Vec<u8>>) -> &mut Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn unchecked(&mut self, unchecked: bool) -> &mut Self {
        self.unchecked = unchecked;
        self
    }

    pub fn output(&self) -> OrmgateOutput {
        let mut command = Command::new(&self.bin);
        command.args(&self.args);
        for var in ORMGATE_ENV_VARS {
            command.env_remove(var);
        }
        command.envs(&self.envs);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().expect("failed to spawn ormgate");
        if let Some(stdin) = &self.stdin {
            child
                .stdin
                .take()
                .expect("stdin is piped")
                .write_all(stdin)
                .expect("failed to write stdin");
        }
        let output = child.wait_with_output().expect("failed to execute");

        let ret = OrmgateOutput {
            command,
            exit_status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if !self.unchecked && !output.status.success() {
            panic!("command failed:\n\n{ret}");
        }

        ret
    }
}

pub struct OrmgateOutput {
    pub command: Command,
    pub exit_status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl OrmgateOutput {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.code()
    }

    pub fn stdout_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    pub fn decode_summary_json(&self) -> ReconcileSummary {
        ReconcileSummary::parse_json(self.stdout_as_str())
            .unwrap_or_else(|err| panic!("failed to parse summary JSON ({err}):\n\n{self}"))
    }
}

impl fmt::Display for OrmgateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command: {:?}\nexit code: {:?}\n\
                   --- stdout ---\n{}\n\n--- stderr ---\n{}\n\n",
            self.command,
            self.exit_status.code(),
            String::from_utf8_lossy(&self.stdout),
            String::from_utf8_lossy(&self.stderr)
        )
    }
}

// Make Debug output the same as Display output, so `.unwrap()` and `.expect()` are nicer.
impl fmt::Debug for OrmgateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
