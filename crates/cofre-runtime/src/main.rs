mod logs;
mod scheduler;
mod settings;

use crate::logs::{parse_level, FileLogSink};
use crate::scheduler::Scheduler;
use crate::settings::Settings;
use anyhow::Context;
use chrono::Local;
use clap::Parser;
use cofre_core::{BackupJob, LogSink, TracingSink};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "cofre-runtime",
    about = "COFRE: backups datados de arquivos e pastas com retenção por dias"
)]
struct Args {
    /// Caminho do arquivo de configuração (JSON ou TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Executa uma única vez agora e sai
    #[arg(long)]
    once: bool,

    /// Valida a configuração, mostra os próximos disparos e sai
    #[arg(long)]
    check: bool,

    /// Mostra as últimas N linhas do log do mês e sai
    #[arg(long, value_name = "N")]
    tail: Option<usize>,
}

fn file_sink(settings: &Settings) -> anyhow::Result<Option<FileLogSink>> {
    let (Some(file_log), Some(dir)) = (settings.file_log.as_ref(), settings.log_dir()) else {
        return Ok(None);
    };
    let level = parse_level(&file_log.min_log_level)?;
    Ok(Some(FileLogSink::new(dir, level)?))
}

fn print_check(config_path: &std::path::Path, settings: &Settings, scheduler: &Scheduler) {
    println!("Configuração \"{}\" válida.", config_path.display());
    println!("Agendamento: {}", scheduler.expression());

    for at in scheduler.upcoming(&Local::now(), 5) {
        println!("  - {}", at.format("%Y-%m-%d %H:%M:%S"));
    }

    println!("Backups:");
    for d in settings.descriptors() {
        println!(
            "- {} -> {} (mantém {} dia(s), subpasta: {}, condições: {})",
            d.source.display(),
            d.destination_folder.display(),
            d.keep_days,
            d.sub_folder.as_deref().unwrap_or("-"),
            d.conditions.as_deref().unwrap_or("-"),
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&config_path)?;

    // Sem agendamento válido o processo não sobe
    settings
        .validate(&Local::now().naive_local())
        .context("Configuração inválida")?;
    let scheduler = Scheduler::parse(settings.schedule_expression()?)?;

    let file_sink = file_sink(&settings)?;

    if let Some(lines) = args.tail {
        let Some(sink) = &file_sink else {
            anyhow::bail!("`fileLog` não configurado; não há arquivo de log para mostrar");
        };
        for line in sink.tail(&Local::now().naive_local(), lines)? {
            println!("{line}");
        }
        return Ok(());
    }

    if args.check {
        print_check(&config_path, &settings, &scheduler);
        return Ok(());
    }

    let sink: Arc<dyn LogSink> = match file_sink {
        Some(sink) => Arc::new(sink),
        None => Arc::new(TracingSink),
    };
    let job = BackupJob::new(settings.descriptors(), sink);

    if args.once {
        let report = job.run(&Local::now().naive_local())?;
        tracing::info!(
            "Execução concluída: {} backup(s) feito(s), {} ignorado(s)",
            report.completed(),
            report.skipped()
        );
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Parada solicitada; aguardando execução em andamento");
            shutdown.store(true, Ordering::SeqCst);
        })
        .context("Falha ao registrar handler de parada")?;
    }

    tracing::info!(
        "COFRE iniciado com {} backup(s), agendamento '{}'",
        job.descriptors().len(),
        scheduler.expression()
    );

    scheduler.run_until(&shutdown, |now| {
        // O job já registra a falha no sink; a próxima execução agendada é a nova tentativa
        let _ = job.run(&now);
    });

    Ok(())
}
