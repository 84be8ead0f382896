// src/transform.rs

//! External class-definition transformer
//!
//! The rewrite of a class-definition document is done by an outside program.
//! `CommandTransformer` runs it once per document with the document path as
//! the last argument. Stdin is closed and the child is killed on timeout.

use crate::error::{Error, Result};
use crate::packages::traits::ClassTransformer;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Default timeout for one transformer run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CommandTransformer {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTransformer {
    /// Resolve `command` on `PATH` (or use it as given if it contains a
    /// path separator)
    pub fn new(command: &str) -> Result<Self> {
        let program = which::which(command).map_err(|e| {
            Error::TransformError(format!("transformer '{}' not found: {}", command, e))
        })?;
        debug!("Using class transformer {}", program.display());
        Ok(Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Leading arguments placed before the definition path
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ClassTransformer for CommandTransformer {
    fn transform(&self, definition: &Path) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(definition)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::TransformError(format!(
                    "failed to spawn {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let file = definition
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Drain both pipes while waiting; a full pipe stalls the child
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let stdout = stdout.join().unwrap_or_default();
                let stderr = stderr.join().unwrap_or_default();
                for line in String::from_utf8_lossy(&stdout).lines() {
                    info!("[{}] {}", file, line);
                }
                for line in String::from_utf8_lossy(&stderr).lines() {
                    warn!("[{}] {}", file, line);
                }

                if status.success() {
                    debug!("Transformed {}", definition.display());
                    Ok(())
                } else {
                    Err(Error::TransformError(format!(
                        "{} exited with code {} on {}",
                        self.program.display(),
                        status.code().unwrap_or(-1),
                        definition.display()
                    )))
                }
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(Error::TransformError(format!(
                    "{} timed out after {} seconds on {}",
                    self.program.display(),
                    self.timeout.as_secs(),
                    definition.display()
                )))
            }
        }
    }
}

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe
            && let Err(e) = pipe.read_to_end(&mut buf)
        {
            debug!("Transformer output truncated: {}", e);
        }
        buf
    })
}
