use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Логгер для записи информации о выполнении задачи в файл.
/// Каждый лог-файл привязан к конкретной сессии выполнения задачи.
pub struct TaskLogger {
    log_dir: PathBuf,
}

impl TaskLogger {
    pub fn new(base_log_dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: base_log_dir.as_ref().join("task_logs"),
        }
    }

    /// Возвращает путь к лог-файлу для данной сессии.
    pub fn get_log_file_path(&self, session_id: &str) -> String {
        self.log_dir
            .join(format!("{}.log", session_id))
            .to_string_lossy()
            .into_owned()
    }

    /// Записывает сообщение в лог-файл для указанной сессии.
    pub fn write_log(&self, session_id: &str, message: &str) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.get_log_file_path(session_id))?;

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    /// Читает лог-файл сессии. Идентификатор сессии - UUID.
    pub fn read_log(&self, session_id: &str) -> Result<String> {
        Uuid::parse_str(session_id)
            .map_err(|_| anyhow::anyhow!("Invalid session id '{}'", session_id))?;
        let file_path = self.get_log_file_path(session_id);
        if Path::new(&file_path).exists() {
            Ok(fs::read_to_string(&file_path)?)
        } else {
            Ok(format!("Log file for session {} not found.", session_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_session_log() {
        let dir = tempfile::tempdir().unwrap();
        let logger = TaskLogger::new(dir.path());
        let session = Uuid::new_v4().to_string();

        logger.write_log(&session, "Started").unwrap();
        logger.write_log(&session, "Done").unwrap();
        let content = logger.read_log(&session).unwrap();
        assert!(content.contains("] Started\n"));
        assert!(content.contains("] Done\n"));

        assert!(logger.read_log("../../etc/passwd").is_err());
    }
}
