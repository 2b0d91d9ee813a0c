//! Taxonomia de erros do núcleo de backup

use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, BackupError>;

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    /// Chave obrigatória ausente ou vazia (fatal na inicialização)
    #[error("chave de configuração `{0}` ausente ou vazia")]
    ConfigMissing(String),

    #[error("configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("condição inválida `{token}`: {reason}")]
    InvalidCondition { token: String, reason: String },

    /// Origem inexistente; o orquestrador pula o descritor e segue
    #[error("origem `{}` não existe", .0.display())]
    SourceNotFound(PathBuf),

    /// Falha de E/S durante cópia ou remoção; aborta o restante da execução
    #[error("falha ao {action} `{}`: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    pub fn is_source_not_found(&self) -> bool {
        matches!(self, BackupError::SourceNotFound(_))
    }
}

/// Anexa ação e caminho a um `io::Error`, no estilo do `Context` do anyhow
pub trait IoContext<T> {
    fn fs_context(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn fs_context(self, action: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| BackupError::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_context_wraps_io_error() {
        let res: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "negado"));
        let err = res.fs_context("copiar", Path::new("/tmp/x")).unwrap_err();

        match &err {
            BackupError::Filesystem { action, path, source } => {
                assert_eq!(*action, "copiar");
                assert_eq!(path, Path::new("/tmp/x"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("variante inesperada: {other:?}"),
        }
        assert!(err.to_string().contains("/tmp/x"));
    }

    #[test]
    fn test_source_not_found_flag() {
        assert!(BackupError::SourceNotFound(PathBuf::from("a")).is_source_not_found());
        assert!(!BackupError::ConfigMissing("backupJob".into()).is_source_not_found());
    }
}
