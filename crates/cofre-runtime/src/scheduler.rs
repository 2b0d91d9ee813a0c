//! Disparo periódico do job a partir de uma expressão cron

use crate::settings::SCHEDULE_KEY;
use chrono::{DateTime, Local, NaiveDateTime};
use cofre_core::BackupError;
use cron::Schedule;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Granularidade com que o sono verifica o pedido de parada
const POLL_SLICE: Duration = Duration::from_millis(500);

pub struct Scheduler {
    expression: String,
    schedule: Schedule,
}

impl Scheduler {
    /// Aceita expressões de 6/7 campos (estilo Quartz, `?` vale `*`) e as
    /// clássicas de 5 campos, às quais é acrescentado o campo de segundos.
    pub fn parse(expression: &str) -> Result<Self, BackupError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(BackupError::ConfigMissing(SCHEDULE_KEY.to_string()));
        }

        let schedule = Schedule::from_str(&normalize(trimmed)).map_err(|e| {
            BackupError::InvalidConfig(format!("expressão cron '{trimmed}' inválida: {e}"))
        })?;

        Ok(Self {
            expression: trimmed.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(after).next()
    }

    pub fn upcoming(&self, after: &DateTime<Local>, count: usize) -> Vec<DateTime<Local>> {
        self.schedule.after(after).take(count).collect()
    }

    /// Laço do host: dorme até o próximo disparo e chama `tick` de forma
    /// síncrona, então execuções nunca se sobrepõem. Disparos perdidos
    /// durante um `tick` longo são descartados. Um pedido de parada nunca
    /// interrompe um `tick` em andamento.
    pub fn run_until<F>(&self, shutdown: &AtomicBool, mut tick: F)
    where
        F: FnMut(NaiveDateTime),
    {
        while !shutdown.load(Ordering::SeqCst) {
            let Some(next) = self.next_after(&Local::now()) else {
                tracing::warn!("Agendamento '{}' não tem próximos disparos", self.expression);
                break;
            };
            tracing::info!("Próxima execução em {}", next.format("%Y-%m-%d %H:%M:%S"));

            if !sleep_until(next, shutdown) {
                break;
            }
            tick(Local::now().naive_local());
        }
        tracing::info!("Agendador encerrado");
    }
}

fn normalize(expression: &str) -> String {
    let mut fields: Vec<String> = expression
        .split_whitespace()
        .map(|f| if f == "?" { "*".to_string() } else { f.to_string() })
        .collect();
    if fields.len() == 5 {
        // Cron clássico: domingo = 0 (ou 7); o crate `cron` conta domingo = 1
        fields[4] = classic_weekday_field(&fields[4]);
        fields.insert(0, "0".to_string());
    }
    fields.join(" ")
}

fn classic_weekday_field(field: &str) -> String {
    field
        .split(',')
        .map(classic_weekday_item)
        .collect::<Vec<_>>()
        .join(",")
}

/// Desloca um item numérico do dia da semana (`v`, `a-b`, com `/n` opcional).
/// Nomes (`MON`) e `*` passam intactos.
fn classic_weekday_item(item: &str) -> String {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };
    let suffix = step.map(|s| format!("/{s}")).unwrap_or_default();

    let Some((start, end)) = range.split_once('-') else {
        return match range.parse::<u32>() {
            Ok(day) => format!("{}{suffix}", day % 7 + 1),
            Err(_) => item.to_string(),
        };
    };

    match (start.parse::<u32>(), end.parse::<u32>()) {
        // `a-7` termina no domingo, que vira 1 e não cabe no intervalo
        (Ok(a), Ok(7)) => {
            let mut out = format!("{}-7{suffix}", a + 1);
            let hits_sunday = match step.map(str::parse::<u32>) {
                None => true,
                Some(Ok(n)) if n > 0 => (7 - a) % n == 0,
                Some(_) => false,
            };
            if a > 0 && hits_sunday {
                out.push_str(",1");
            }
            out
        }
        (Ok(a), Ok(b)) => format!("{}-{}{suffix}", a + 1, b + 1),
        _ => item.to_string(),
    }
}

/// `false` se a parada foi pedida antes do prazo
fn sleep_until(deadline: DateTime<Local>, shutdown: &AtomicBool) -> bool {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return false;
        }
        let Ok(remaining) = (deadline - Local::now()).to_std() else {
            return true;
        };
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(POLL_SLICE));
    }
}
