//! Sink de logs em arquivo, um arquivo por mês

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use cofre_core::LogSink;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::Level;

/// Converte o nível configurado. Aceita os nomes do `tracing` e os do .NET
pub fn parse_level(raw: &str) -> Result<Level> {
    let level = match raw.trim().to_ascii_lowercase().as_str() {
        "information" => Level::INFO,
        "warning" => Level::WARN,
        "critical" => Level::ERROR,
        other => Level::from_str(other)
            .map_err(|_| anyhow::anyhow!("Nível de log desconhecido: '{raw}'"))?,
    };
    Ok(level)
}

/// Grava `yyyy-MM-dd HH:mm:ss LEVEL mensagem` em `<logs_dir>/<yyyy-MM>.log`
/// e espelha cada linha aceita no `tracing`.
pub struct FileLogSink {
    logs_dir: PathBuf,
    min_level: Level,
    write_lock: Mutex<()>,
}

impl FileLogSink {
    /// Cria o sink e o diretório de logs
    pub fn new(logs_dir: PathBuf, min_level: Level) -> Result<Self> {
        fs::create_dir_all(&logs_dir).context("Falha ao criar diretório de logs")?;

        Ok(Self {
            logs_dir,
            min_level,
            write_lock: Mutex::new(()),
        })
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level <= self.min_level
    }

    /// Arquivo do mês de `at`
    pub fn log_path_for(&self, at: &NaiveDateTime) -> PathBuf {
        self.logs_dir.join(format!("{}.log", at.format("%Y-%m")))
    }

    /// Escreve uma linha no arquivo do mês de `at`
    pub fn write_line(&self, at: &NaiveDateTime, level: Level, message: &str) -> Result<()> {
        let _guard = self.write_lock.lock().expect("mutex poisoned");
        let log_path = self.log_path_for(at);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .context("Falha ao abrir arquivo de log")?;

        writeln!(
            file,
            "{} {} {}",
            at.format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        )
        .context("Falha ao escrever no log")?;

        Ok(())
    }

    /// Últimas `lines` linhas do arquivo do mês de `at`
    pub fn tail(&self, at: &NaiveDateTime, lines: usize) -> Result<Vec<String>> {
        let log_path = self.log_path_for(at);

        if !log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&log_path).context("Falha ao abrir arquivo de log")?;
        let reader = BufReader::new(file);

        let all_lines: Vec<String> = reader.lines().map_while(|line| line.ok()).collect();
        let start = all_lines.len().saturating_sub(lines);

        Ok(all_lines[start..].to_vec())
    }
}

impl LogSink for FileLogSink {
    fn log(&self, level: Level, message: &str) {
        if !self.is_enabled(level) {
            return;
        }

        cofre_core::TracingSink.log(level, message);

        let now = Local::now().naive_local();
        if let Err(err) = self.write_line(&now, level, message) {
            // O sink não pode derrubar o job
            tracing::warn!("Falha ao gravar log em arquivo: {err:#}");
        }
    }
}
