//! Orquestração de uma execução do job de backup

use crate::condition::ConditionFilter;
use crate::copy::{copy, CopyStats};
use crate::descriptor::{destination_inside_source, is_within, BackupDescriptor};
use crate::error::{BackupError, IoContext, Result};
use crate::retention::{prune_with, FolderClock, FsClock, PruneReport};
use crate::sink::LogSink;
use crate::source::resolve_source;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Formato do nome da pasta datada no destino
pub const DATED_FOLDER_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorOutcome {
    /// Cópia feita; `prune` é `None` para origens que são arquivo único
    Completed {
        source: PathBuf,
        dated_folder: PathBuf,
        copy: CopyStats,
        prune: Option<PruneReport>,
    },
    /// Origem inexistente: nem cópia nem retenção
    Skipped { missing: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<DescriptorOutcome>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DescriptorOutcome::Completed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}

/// O job em si: lista imutável de descritores + sink injetado.
///
/// Cada `run` processa os descritores em ordem, um por vez. Uma falha de
/// sistema de arquivos interrompe os descritores restantes sem desfazer o que
/// já foi gravado; a próxima execução agendada é a única nova tentativa.
pub struct BackupJob {
    descriptors: Vec<BackupDescriptor>,
    sink: Arc<dyn LogSink>,
    clock: Box<dyn FolderClock>,
}

impl BackupJob {
    pub fn new(descriptors: Vec<BackupDescriptor>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            descriptors,
            sink,
            clock: Box::new(FsClock),
        }
    }

    pub fn with_clock(mut self, clock: impl FolderClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn descriptors(&self) -> &[BackupDescriptor] {
        &self.descriptors
    }

    pub fn run(&self, now: &NaiveDateTime) -> Result<RunReport> {
        let mut report = RunReport::default();

        for descriptor in &self.descriptors {
            match self.run_descriptor(descriptor, now) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err) => {
                    self.sink.error(&format!(
                        "backup de {} falhou, execução interrompida: {err}",
                        descriptor.source.display()
                    ));
                    return Err(err);
                }
            }
        }

        Ok(report)
    }

    fn run_descriptor(
        &self,
        descriptor: &BackupDescriptor,
        now: &NaiveDateTime,
    ) -> Result<DescriptorOutcome> {
        let sink = self.sink.as_ref();
        let root = &descriptor.source;
        sink.info(&format!("Iniciando backup de {}", root.display()));

        // O template de subpasta só se aplica a origens que são diretório
        let is_file = root.is_file();
        let source = if is_file {
            root.clone()
        } else {
            resolve_source(root, descriptor.sub_folder.as_deref(), now)
        };

        if !source.exists() {
            sink.info(&format!(
                "{} origem não existe, backup encerrado (backups expirados mantidos)",
                source.display()
            ));
            return Ok(DescriptorOutcome::Skipped { missing: source });
        }

        // Senão a cópia entraria na própria saída até estourar o tamanho do caminho
        if is_within(&descriptor.destination_folder, &source) {
            return Err(destination_inside_source(&descriptor.destination_folder, &source));
        }

        let filter =
            ConditionFilter::compile(descriptor.conditions.as_deref().unwrap_or_default(), now)?;

        let dated_folder = descriptor
            .destination_folder
            .join(now.format(DATED_FOLDER_FORMAT).to_string());
        clear_dated_folder(&dated_folder)?;

        let stats = match copy(&source, &dated_folder, &filter, sink) {
            Ok(stats) => stats,
            // A origem sumiu entre a verificação e a cópia
            Err(BackupError::SourceNotFound(missing)) => {
                return Ok(DescriptorOutcome::Skipped { missing })
            }
            Err(err) => return Err(err),
        };
        sink.info(&format!(
            "Backup de {} concluído: {} arquivo(s) copiado(s), {} ignorado(s)",
            root.display(),
            stats.files_copied,
            stats.files_skipped
        ));

        let prune = if is_file {
            None
        } else {
            sink.info("Iniciando remoção de backups expirados");
            let report = prune_with(
                &descriptor.destination_folder,
                descriptor.keep_days,
                now,
                self.clock.as_ref(),
                sink,
            )?;
            sink.info(&format!(
                "Remoção de backups expirados concluída: {} removido(s)",
                report.removed.len()
            ));
            Some(report)
        };

        Ok(DescriptorOutcome::Completed {
            source,
            dated_folder,
            copy: stats,
            prune,
        })
    }
}

/// Garante semântica de substituição: a pasta do dia é recriada do zero
fn clear_dated_folder(dated_folder: &Path) -> Result<()> {
    if dated_folder.is_dir() {
        fs::remove_dir_all(dated_folder).fs_context("remover", dated_folder)?;
    }
    Ok(())
}
