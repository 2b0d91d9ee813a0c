//! Descritor de backup, uma entrada da configuração

use crate::condition::ConditionFilter;
use crate::error::{BackupError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Uma unidade de backup configurada (origem, destino, retenção e filtro).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupDescriptor {
    /// Arquivo ou diretório a ser copiado
    #[serde(alias = "Source")]
    pub source: PathBuf,

    /// Template de data que expande em subpastas sob a origem (ex.: `yyyy>>MM>>dd`)
    #[serde(default)]
    #[serde(alias = "SubFolder")]
    pub sub_folder: Option<String>,

    /// Filtros por substring separados por vírgula; aceita `today:<formato>`
    #[serde(default)]
    #[serde(alias = "Conditions")]
    pub conditions: Option<String>,

    /// Raiz dos backups deste descritor
    #[serde(alias = "DestinationFolder")]
    pub destination_folder: PathBuf,

    /// Janela de retenção em dias
    #[serde(alias = "KeepDays")]
    pub keep_days: u32,
}

impl BackupDescriptor {
    pub fn new(source: impl Into<PathBuf>, destination_folder: impl Into<PathBuf>, keep_days: u32) -> Self {
        Self {
            source: source.into(),
            sub_folder: None,
            conditions: None,
            destination_folder: destination_folder.into(),
            keep_days,
        }
    }

    pub fn with_sub_folder(mut self, template: impl Into<String>) -> Self {
        self.sub_folder = Some(template.into());
        self
    }

    pub fn with_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.conditions = Some(conditions.into());
        self
    }

    /// Validação feita uma vez na carga da configuração.
    ///
    /// As condições são compiladas contra `now` apenas para detectar tokens
    /// malformados cedo; a compilação real acontece a cada execução.
    pub fn validate(&self, now: &NaiveDateTime) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(BackupError::InvalidConfig(
                "`source` não pode ser vazio".to_string(),
            ));
        }
        if self.destination_folder.as_os_str().is_empty() {
            return Err(BackupError::InvalidConfig(format!(
                "`destinationFolder` vazio para a origem `{}`",
                self.source.display()
            )));
        }
        // Com template a origem efetiva é uma subpasta; o job checa de novo na execução
        let has_template = self.sub_folder.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_template && is_within(&self.destination_folder, &self.source) {
            return Err(destination_inside_source(&self.destination_folder, &self.source));
        }
        ConditionFilter::compile(self.conditions.as_deref().unwrap_or_default(), now)?;
        Ok(())
    }
}

pub(crate) fn destination_inside_source(destination: &Path, source: &Path) -> BackupError {
    BackupError::InvalidConfig(format!(
        "destino `{}` fica dentro da origem `{}`",
        destination.display(),
        source.display()
    ))
}

/// `true` se `inner` é `outer` ou está sob ele. Resolve links e `..` pelo
/// ancestral existente mais próximo, já que o destino pode ainda não existir.
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    canonical(inner).starts_with(canonical(outer))
}

fn canonical(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(existing) {
            return rest.iter().rev().fold(resolved, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
