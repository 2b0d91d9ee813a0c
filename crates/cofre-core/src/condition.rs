//! Compilação das condições de filtro de arquivos

use crate::date_format::format_date;
use crate::error::{BackupError, Result};
use chrono::NaiveDateTime;

/// Marcador de token dinâmico, resolvido contra a data da execução
pub const TODAY_MARKER: &str = "today:";

/// Predicado sobre nomes de arquivo: aceita se o nome contém TODOS os tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionFilter {
    tokens: Vec<String>,
}

impl ConditionFilter {
    /// Filtro que aceita qualquer arquivo
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Compila a string de condições.
    ///
    /// Vazia ou só espaços resulta em um filtro que aceita tudo. Tokens
    /// contendo `today:` são substituídos pela data de `now` formatada com o
    /// texto após o marcador.
    pub fn compile(raw: &str, now: &NaiveDateTime) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::accept_all());
        }

        let mut tokens = Vec::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            tokens.push(resolve_token(token, now)?);
        }

        Ok(Self { tokens })
    }

    pub fn accepts(&self, file_name: &str) -> bool {
        self.tokens.iter().all(|t| file_name.contains(t.as_str()))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_accept_all(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn resolve_token(token: &str, now: &NaiveDateTime) -> Result<String> {
    let Some(pos) = token.find(TODAY_MARKER) else {
        return Ok(token.to_string());
    };

    let pattern = &token[pos + TODAY_MARKER.len()..];
    if pattern.trim().is_empty() {
        return Err(BackupError::InvalidCondition {
            token: token.to_string(),
            reason: "formato de data vazio após `today:`".to_string(),
        });
    }

    Ok(format_date(pattern, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_blank_accepts_everything() {
        for raw in ["", "   ", "\t\n"] {
            let filter = ConditionFilter::compile(raw, &now()).unwrap();
            assert!(filter.is_accept_all());
            assert!(filter.accepts("qualquer.txt"));
            assert!(filter.accepts(""));
        }
    }

    #[test]
    fn test_all_tokens_required() {
        let filter = ConditionFilter::compile("a,b", &now()).unwrap();
        assert!(filter.accepts("ab"));
        assert!(filter.accepts("b-x-a"));
        assert!(!filter.accepts("a-only"));
        assert!(!filter.accepts("b-only"));
        assert!(!filter.accepts("none"));
    }

    #[test]
    fn test_today_token_resolved() {
        let filter = ConditionFilter::compile("today:yyyyMMdd", &now()).unwrap();
        assert_eq!(filter.tokens(), ["20240110".to_string()]);
        assert!(filter.accepts("report-20240110.txt"));
        assert!(!filter.accepts("old.txt"));
    }

    #[test]
    fn test_mixed_tokens_are_trimmed() {
        let filter = ConditionFilter::compile(" report , today:yyyy-MM ,", &now()).unwrap();
        assert_eq!(filter.tokens(), ["report".to_string(), "2024-01".to_string()]);
        assert!(filter.accepts("report_2024-01.csv"));
        assert!(!filter.accepts("summary_2024-01.csv"));
    }

    #[test]
    fn test_empty_today_format_rejected() {
        let err = ConditionFilter::compile("today:", &now()).unwrap_err();
        assert!(matches!(err, BackupError::InvalidCondition { .. }));
    }
}
