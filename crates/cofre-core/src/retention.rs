//! Remoção de pastas de backup expiradas

use crate::error::{IoContext, Result};
use crate::sink::LogSink;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Fonte do instante de criação de uma pasta de backup.
pub trait FolderClock: Send + Sync {
    fn created_at(&self, dir: &Path) -> io::Result<NaiveDateTime>;
}

/// Lê a data de criação do sistema de arquivos; onde a plataforma não a
/// registra, usa a data de modificação.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsClock;

impl FolderClock for FsClock {
    fn created_at(&self, dir: &Path) -> io::Result<NaiveDateTime> {
        let metadata = fs::metadata(dir)?;
        let time = match metadata.created() {
            Ok(created) => created,
            Err(_) => metadata.modified()?,
        };
        Ok(DateTime::<Local>::from(time).naive_local())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<PathBuf>,
    pub retained: usize,
}

/// Idade em dias completos (truncada), negativa para pastas "do futuro"
pub fn age_in_days(today: &NaiveDateTime, created: &NaiveDateTime) -> i64 {
    (*today - *created).num_days()
}

pub fn prune(
    destination_root: &Path,
    keep_days: u32,
    today: &NaiveDateTime,
    sink: &dyn LogSink,
) -> Result<PruneReport> {
    prune_with(destination_root, keep_days, today, &FsClock, sink)
}

/// Remove as subpastas imediatas de `destination_root` com idade > `keep_days`.
///
/// Entradas que não são diretórios nunca são tocadas, e a raiz em si nunca é
/// removida. Raiz inexistente não é erro.
pub fn prune_with(
    destination_root: &Path,
    keep_days: u32,
    today: &NaiveDateTime,
    clock: &dyn FolderClock,
    sink: &dyn LogSink,
) -> Result<PruneReport> {
    let mut report = PruneReport::default();

    if !destination_root.is_dir() {
        sink.info(&format!(
            "{} diretório de backup não existe",
            destination_root.display()
        ));
        return Ok(report);
    }

    let mut entries = fs::read_dir(destination_root)
        .fs_context("listar diretório", destination_root)?
        .collect::<io::Result<Vec<_>>>()
        .fs_context("listar diretório", destination_root)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().fs_context("ler metadados de", &path)?;
        if !file_type.is_dir() {
            continue;
        }

        let created = clock
            .created_at(&path)
            .fs_context("ler data de criação de", &path)?;

        if age_in_days(today, &created) > i64::from(keep_days) {
            fs::remove_dir_all(&path).fs_context("remover", &path)?;
            sink.info(&format!("{} removido com sucesso.", path.display()));
            report.removed.push(path);
        } else {
            report.retained += 1;
        }
    }

    Ok(report)
}
