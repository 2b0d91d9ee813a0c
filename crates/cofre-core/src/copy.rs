//! Motor de cópia condicional e recursiva

use crate::condition::ConditionFilter;
use crate::error::{BackupError, IoContext, Result};
use crate::sink::LogSink;
use std::fs;
use std::path::Path;

/// Contadores de uma cópia
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files_copied: u64,
    pub files_skipped: u64,
    pub dirs_created: u64,
    pub bytes_copied: u64,
}

impl CopyStats {
    fn merge(&mut self, other: CopyStats) {
        self.files_copied += other.files_copied;
        self.files_skipped += other.files_skipped;
        self.dirs_created += other.dirs_created;
        self.bytes_copied += other.bytes_copied;
    }
}

/// Espelha `source` em `destination_dir` aplicando `filter` aos arquivos.
///
/// - arquivo: cria `destination_dir` se preciso e copia o arquivo para dentro
///   dele (sobrescrevendo) quando o nome passa no filtro;
/// - diretório: `destination_dir` passa a ser o espelho de `source`, com todas
///   as subpastas criadas mesmo que fiquem vazias;
/// - inexistente: nada é alterado e o retorno é `SourceNotFound`.
pub fn copy(
    source: &Path,
    destination_dir: &Path,
    filter: &ConditionFilter,
    sink: &dyn LogSink,
) -> Result<CopyStats> {
    if source.is_file() {
        let mut stats = CopyStats::default();
        ensure_dir(destination_dir, &mut stats)?;
        copy_file(source, destination_dir, filter, &mut stats)?;
        return Ok(stats);
    }

    if source.is_dir() {
        return copy_dir(source, destination_dir, filter, sink);
    }

    sink.info(&format!("{} não existe, cópia ignorada", source.display()));
    Err(BackupError::SourceNotFound(source.to_path_buf()))
}

fn copy_dir(
    source: &Path,
    target: &Path,
    filter: &ConditionFilter,
    sink: &dyn LogSink,
) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    ensure_dir(target, &mut stats)?;

    let mut entries = fs::read_dir(source)
        .fs_context("listar diretório", source)?
        .collect::<std::io::Result<Vec<_>>>()
        .fs_context("listar diretório", source)?;
    entries.sort_by_key(|e| e.file_name());

    let mut subdirs = Vec::new();

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().fs_context("ler metadados de", &path)?;

        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() {
            copy_file(&path, target, filter, &mut stats)?;
        } else if file_type.is_symlink() {
            // Links para arquivo são copiados pelo conteúdo; links para
            // diretório não são seguidos
            if path.is_file() {
                copy_file(&path, target, filter, &mut stats)?;
            } else {
                sink.warn(&format!(
                    "{} é um link simbólico para diretório, ignorado",
                    path.display()
                ));
            }
        }
    }

    // Arquivos primeiro, depois subpastas
    for subdir in subdirs {
        let Some(name) = subdir.file_name() else {
            continue;
        };
        let child = copy_dir(&subdir, &target.join(name), filter, sink)?;
        stats.merge(child);
    }

    Ok(stats)
}

fn copy_file(
    file: &Path,
    target: &Path,
    filter: &ConditionFilter,
    stats: &mut CopyStats,
) -> Result<()> {
    let Some(name) = file.file_name() else {
        return Ok(());
    };

    if !filter.accepts(&name.to_string_lossy()) {
        stats.files_skipped += 1;
        return Ok(());
    }

    let bytes = fs::copy(file, target.join(name)).fs_context("copiar", file)?;
    stats.files_copied += 1;
    stats.bytes_copied += bytes;
    Ok(())
}

fn ensure_dir(dir: &Path, stats: &mut CopyStats) -> Result<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir).fs_context("criar diretório", dir)?;
        stats.dirs_created += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use tempfile::tempdir;

    fn filter(raw: &str) -> ConditionFilter {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        ConditionFilter::compile(raw, &now).unwrap()
    }

    #[test]
    fn test_copy_single_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("nota.txt");
        fs::write(&src, "conteúdo").unwrap();
        let dest = dir.path().join("out").join("2024-01-10");

        let stats = copy(&src, &dest, &ConditionFilter::accept_all(), &MemorySink::new()).unwrap();

        assert_eq!(stats.files_copied, 1);
        assert_eq!(fs::read_to_string(dest.join("nota.txt")).unwrap(), "conteúdo");
    }

    #[test]
    fn test_single_file_rejected_still_creates_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("old.txt");
        fs::write(&src, "x").unwrap();
        let dest = dir.path().join("out");

        let stats = copy(&src, &dest, &filter("report"), &MemorySink::new()).unwrap();

        assert!(dest.is_dir());
        assert!(!dest.join("old.txt").exists());
        assert_eq!(stats.files_skipped, 1);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.txt");
        fs::write(&src, "novo").unwrap();
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.txt"), "antigo").unwrap();

        copy(&src, &dest, &ConditionFilter::accept_all(), &MemorySink::new()).unwrap();

        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "novo");
    }

    #[test]
    fn test_mirrors_tree_and_keeps_empty_dirs() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("sub").join("deep")).unwrap();
        fs::create_dir_all(src.join("filtered")).unwrap();
        fs::write(src.join("report-1.txt"), "1").unwrap();
        fs::write(src.join("sub").join("report-2.txt"), "2").unwrap();
        fs::write(src.join("sub").join("deep").join("other.txt"), "3").unwrap();
        fs::write(src.join("filtered").join("other.txt"), "4").unwrap();
        let dest = dir.path().join("dest");

        let stats = copy(&src, &dest, &filter("report"), &MemorySink::new()).unwrap();

        assert!(dest.join("report-1.txt").is_file());
        assert!(dest.join("sub").join("report-2.txt").is_file());
        assert!(dest.join("sub").join("deep").is_dir());
        assert!(!dest.join("sub").join("deep").join("other.txt").exists());
        assert!(dest.join("filtered").is_dir());
        assert_eq!(fs::read_dir(dest.join("filtered")).unwrap().count(), 0);

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.files_skipped, 2);
        // dest, sub, sub/deep, filtered
        assert_eq!(stats.dirs_created, 4);
    }

    #[test]
    fn test_missing_source_leaves_destination_untouched() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");
        let sink = MemorySink::new();

        let err = copy(&dir.path().join("nada"), &dest, &ConditionFilter::accept_all(), &sink)
            .unwrap_err();

        assert!(err.is_source_not_found());
        assert!(!dest.exists());
        assert!(sink.contains("não existe"));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_symlink_not_followed() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(&src, src.join("loop")).unwrap();
        let dest = dir.path().join("dest");
        let sink = MemorySink::new();

        let stats = copy(&src, &dest, &ConditionFilter::accept_all(), &sink).unwrap();

        assert_eq!(stats.files_copied, 1);
        assert!(!dest.join("loop").exists());
        assert!(sink.contains("link simbólico"));
    }
}
