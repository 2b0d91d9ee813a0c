use anyhow::Context;
use chrono::NaiveDateTime;
use cofre_core::{BackupDescriptor, BackupError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chave da expressão de agendamento
pub const SCHEDULE_KEY: &str = "backupJob";

fn default_path_buf() -> PathBuf {
    PathBuf::new()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FileLogSettings {
    /// Diretório dos arquivos `yyyy-MM.log`
    #[serde(alias = "LogPath")]
    pub log_path: PathBuf,

    /// Nível mínimo (aceita também os nomes do .NET: Information, Warning...)
    #[serde(default = "default_min_level", alias = "MinLogLevel")]
    pub min_log_level: String,
}

fn default_min_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Expressão cron (estilo Quartz ou clássica de 5 campos)
    #[serde(default, alias = "BackupJob")]
    pub backup_job: Option<String>,

    #[serde(default, alias = "Backups")]
    pub backups: Vec<BackupDescriptor>,

    /// Também aceita a seção `FileLogPath` dos arquivos `appsettings.json` antigos
    #[serde(default, alias = "FileLogPath")]
    pub file_log: Option<FileLogSettings>,

    #[serde(skip, default = "default_path_buf")]
    base_dir: PathBuf,
}

impl Settings {
    /// Lê JSON, ou TOML quando a extensão é `.toml`
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Falha ao ler configuração {}", path.display()))?;

        let mut settings: Settings = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text).context("Falha ao parsear configuração TOML")?,
            _ => serde_json::from_str(&text).context("Falha ao parsear configuração JSON")?,
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.base_dir = base.to_path_buf();
        Ok(settings)
    }

    /// Local padrão: `<config_dir>/cofre/cofre.json`, ou `cofre.json` no diretório atual
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("cofre").join("cofre.json"))
            .unwrap_or_else(|| PathBuf::from("cofre.json"))
    }

    /// Expressão de agendamento; ausente ou vazia é erro fatal
    pub fn schedule_expression(&self) -> Result<&str, BackupError> {
        self.backup_job
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty())
            .ok_or_else(|| BackupError::ConfigMissing(SCHEDULE_KEY.to_string()))
    }

    /// Descritores com caminhos relativos resolvidos contra o diretório da configuração
    pub fn descriptors(&self) -> Vec<BackupDescriptor> {
        self.backups
            .iter()
            .map(|d| BackupDescriptor {
                source: self.resolve(&d.source),
                destination_folder: self.resolve(&d.destination_folder),
                ..d.clone()
            })
            .collect()
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.file_log.as_ref().map(|f| self.resolve(&f.log_path))
    }

    /// Valida tudo o que pode ser validado antes de subir o processo
    pub fn validate(&self, now: &NaiveDateTime) -> Result<(), BackupError> {
        self.schedule_expression()?;
        for descriptor in &self.backups {
            descriptor.validate(now)?;
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap()
    }

    const JSON: &str = r#"{
        "backupJob": "0 0 2 * * ?",
        "fileLog": { "logPath": "logs", "minLogLevel": "Information" },
        "backups": [
            {
                "source": "/data/docs",
                "conditions": "today:yyyyMMdd",
                "destinationFolder": "backup/docs",
                "keepDays": 7
            }
        ]
    }"#;

    #[test]
    fn test_load_json_and_resolve_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cofre.json");
        fs::write(&path, JSON).unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.schedule_expression().unwrap(), "0 0 2 * * ?");
        let descriptors = settings.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].source, PathBuf::from("/data/docs"));
        assert_eq!(descriptors[0].destination_folder, dir.path().join("backup/docs"));
        assert_eq!(settings.log_dir(), Some(dir.path().join("logs")));
        assert!(settings.validate(&now()).is_ok());
    }

    #[test]
    fn test_load_appsettings_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("appsettings.json");
        fs::write(
            &path,
            r#"{
                "Logging": { "LogLevel": { "Default": "Information" } },
                "backupJob": "0 0 2 * * ?",
                "FileLogPath": { "LogPath": "logs", "MinLogLevel": "Information" },
                "Backups": [
                    {
                        "Source": "/data/docs",
                        "SubFolder": "",
                        "Conditions": "today:yyyyMMdd",
                        "DestinationFolder": "/backup/docs",
                        "KeepDays": 7
                    }
                ]
            }"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.backups.len(), 1);
        assert_eq!(settings.backups[0].keep_days, 7);
        assert_eq!(settings.backups[0].destination_folder, PathBuf::from("/backup/docs"));
        let file_log = settings.file_log.as_ref().unwrap();
        assert_eq!(file_log.min_log_level, "Information");
        assert_eq!(settings.log_dir(), Some(dir.path().join("logs")));
        assert!(settings.validate(&now()).is_ok());
    }

    #[test]
    fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cofre.toml");
        fs::write(
            &path,
            r#"
backupJob = "0 30 1 * * *"

[[backups]]
source = "/srv/db.sqlite"
destinationFolder = "/backup/db"
keepDays = 3
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.backups[0].keep_days, 3);
        assert!(settings.file_log.is_none());
    }

    #[test]
    fn test_missing_schedule_is_config_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cofre.json");
        fs::write(&path, r#"{ "backupJob": "  ", "backups": [] }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        let err = settings.validate(&now()).unwrap_err();

        assert!(matches!(err, BackupError::ConfigMissing(ref key) if key == SCHEDULE_KEY));
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cofre.json");
        fs::write(
            &path,
            r#"{ "backupJob": "0 0 2 * * ?",
                 "backups": [ { "source": "a", "destinationFolder": "b", "keepDays": 1, "conditions": "today:" } ] }"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(settings.validate(&now()).is_err());
    }
}
