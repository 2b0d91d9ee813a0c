//! Núcleo do serviço de backup COFRE.
//!
//! Copia origens configuradas (arquivos ou árvores de diretório) para pastas
//! datadas no destino, filtrando arquivos por substrings, e remove pastas de
//! backup mais antigas que a janela de retenção. Agendamento, carga de
//! configuração e persistência de logs ficam fora deste crate.

pub mod condition;
pub mod copy;
pub mod date_format;
pub mod descriptor;
pub mod error;
pub mod job;
pub mod retention;
pub mod sink;
pub mod source;

pub use condition::ConditionFilter;
pub use copy::{copy, CopyStats};
pub use descriptor::BackupDescriptor;
pub use error::{BackupError, IoContext, Result};
pub use job::{BackupJob, DescriptorOutcome, RunReport};
pub use retention::{prune, prune_with, FolderClock, FsClock, PruneReport};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use source::resolve_source;
