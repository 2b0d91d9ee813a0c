//! Interface de logging injetada no núcleo

use std::sync::Mutex;
use tracing::Level;

/// Destino das mensagens emitidas pelo job.
///
/// O núcleo depende apenas desta interface; o formato de persistência e a
/// rotação ficam a cargo de quem implementa.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// Encaminha para as macros do `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "cofre", "{message}"),
            Level::WARN => tracing::warn!(target: "cofre", "{message}"),
            Level::INFO => tracing::info!(target: "cofre", "{message}"),
            Level::DEBUG => tracing::debug!(target: "cofre", "{message}"),
            _ => tracing::trace!(target: "cofre", "{message}"),
        }
    }
}

/// Guarda as mensagens em memória
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().expect("mutex poisoned").clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .expect("mutex poisoned")
            .iter()
            .any(|(_, line)| line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        self.lines
            .lock()
            .expect("mutex poisoned")
            .push((level, message.to_string()));
    }
}
