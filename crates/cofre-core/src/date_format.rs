//! Formatação de datas com padrões no dialeto "custom" do .NET
//!
//! Os arquivos de configuração em produção foram escritos com padrões como
//! `yyyyMMdd` e `yyyy>>MM>>dd`, então o motor interpreta esse dialeto em vez
//! do `strftime` do chrono. Especificadores suportados:
//!
//! - `y`, `yy`, `yyyy`: ano
//! - `M`, `MM`, `MMM`, `MMMM`: mês
//! - `d`, `dd`, `ddd`, `dddd`: dia / dia da semana
//! - `H`, `HH`, `h`, `hh`: hora (24h / 12h)
//! - `m`, `mm`, `s`, `ss`: minuto e segundo
//! - `f`..`fffffff`: frações de segundo
//! - `t`, `tt`: designador AM/PM
//!
//! Texto entre aspas simples ou duplas é literal, `\x` escapa um caractere e
//! `%` antes de um especificador isolado é ignorado.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt::Write;

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// Formata `at` segundo `pattern`. Nunca falha: caracteres desconhecidos são copiados.
pub fn format_date(pattern: &str, at: &NaiveDateTime) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j] != c {
                    out.push(chars[j]);
                    j += 1;
                }
                i = j + 1;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    out.push(*next);
                }
                i += 2;
            }
            '%' => i += 1,
            'y' | 'M' | 'd' | 'H' | 'h' | 'm' | 's' | 'f' | 't' => {
                let run = chars[i..].iter().take_while(|&&x| x == c).count();
                write_specifier(&mut out, c, run, at);
                i += run;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn write_specifier(out: &mut String, spec: char, run: usize, at: &NaiveDateTime) {
    let month = MONTHS[at.month0() as usize];
    let weekday = WEEKDAYS[at.weekday().num_days_from_sunday() as usize];
    let (is_pm, hour12) = at.hour12();

    // write! em String não falha
    let _ = match (spec, run) {
        ('y', 1) => write!(out, "{}", at.year() % 100),
        ('y', 2) => write!(out, "{:02}", at.year() % 100),
        ('y', n) => write!(out, "{:0width$}", at.year(), width = n),
        ('M', 1) => write!(out, "{}", at.month()),
        ('M', 2) => write!(out, "{:02}", at.month()),
        ('M', 3) => write!(out, "{}", &month[..3]),
        ('M', _) => write!(out, "{}", month),
        ('d', 1) => write!(out, "{}", at.day()),
        ('d', 2) => write!(out, "{:02}", at.day()),
        ('d', 3) => write!(out, "{}", &weekday[..3]),
        ('d', _) => write!(out, "{}", weekday),
        ('H', 1) => write!(out, "{}", at.hour()),
        ('H', _) => write!(out, "{:02}", at.hour()),
        ('h', 1) => write!(out, "{}", hour12),
        ('h', _) => write!(out, "{:02}", hour12),
        ('m', 1) => write!(out, "{}", at.minute()),
        ('m', _) => write!(out, "{:02}", at.minute()),
        ('s', 1) => write!(out, "{}", at.second()),
        ('s', _) => write!(out, "{:02}", at.second()),
        ('f', n) => {
            let digits = n.min(7);
            let nanos = at.nanosecond() % 1_000_000_000;
            let frac = nanos / 10u32.pow(9 - digits as u32);
            write!(out, "{:0width$}", frac, width = digits)
        }
        ('t', 1) => write!(out, "{}", if is_pm { "P" } else { "A" }),
        ('t', _) => write!(out, "{}", if is_pm { "PM" } else { "AM" }),
        _ => Ok(()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn test_compact_date() {
        assert_eq!(format_date("yyyyMMdd", &at(2024, 1, 10, 2, 0, 0)), "20240110");
    }

    #[test]
    fn test_separators_are_literal() {
        let ts = at(2024, 1, 10, 2, 0, 0);
        assert_eq!(format_date("yyyy-MM-dd", &ts), "2024-01-10");
        assert_eq!(format_date("yyyy>>MM>>dd", &ts), "2024>>01>>10");
        assert_eq!(format_date("d/M/yy", &ts), "10/1/24");
    }

    #[test]
    fn test_time_specifiers() {
        let ts = at(2024, 3, 5, 14, 7, 9);
        assert_eq!(format_date("HH:mm:ss", &ts), "14:07:09");
        assert_eq!(format_date("h:m:s tt", &ts), "2:7:9 PM");
        assert_eq!(format_date("hh t", &at(2024, 3, 5, 9, 0, 0)), "09 A");
    }

    #[test]
    fn test_names_and_quotes() {
        // 2024-01-10 é quarta-feira
        let ts = at(2024, 1, 10, 0, 0, 0);
        assert_eq!(format_date("ddd, MMM d", &ts), "Wed, Jan 10");
        assert_eq!(format_date("dddd MMMM", &ts), "Wednesday January");
        assert_eq!(format_date("'backup-'yyyy", &ts), "backup-2024");
        assert_eq!(format_date("\"d\"dd", &ts), "d10");
        assert_eq!(format_date("\\yyyyy", &ts), "y2024");
        assert_eq!(format_date("%d", &ts), "10");
    }

    #[test]
    fn test_fraction_digits() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_milli_opt(0, 0, 0, 123)
            .unwrap();
        assert_eq!(format_date("fff", &ts), "123");
        assert_eq!(format_date("ff", &ts), "12");
    }
}
