//! Resolução do caminho de origem com subpasta datada

use crate::date_format::format_date;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Separador de segmentos aceito nos templates de subpasta
pub const SEGMENT_SEPARATOR: &str = ">>";

/// Calcula o caminho concreto de origem.
///
/// Sem template (ou template em branco) devolve `root` inalterado. Com
/// template, `>>` vira `-`, a data é formatada e cada parte separada por `-`
/// vira um segmento sob `root`: `yyyy>>MM>>dd` → `root/2024/01/10`.
/// Não acessa o sistema de arquivos.
pub fn resolve_source(root: &Path, template: Option<&str>, now: &NaiveDateTime) -> PathBuf {
    let Some(template) = template.filter(|t| !t.trim().is_empty()) else {
        return root.to_path_buf();
    };

    let expanded = format_date(&template.replace(SEGMENT_SEPARATOR, "-"), now);

    expanded
        .split('-')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
