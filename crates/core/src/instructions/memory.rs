use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use super::storage::Storage;
use super::{DEFAULT_INSTRUCTIONS, InstructionsContext, InstructionsSource};

/// Directory holding the daily logs, one `YYYY-MM-DD.md` per day.
pub const DAILY_LOG_DIR: &str = "memory";
/// The long-term memory document.
pub const LONG_TERM_MEMORY_FILE: &str = "MEMORY.md";

const BOOTSTRAP_FILE: &str = "BOOTSTRAP.md";
const IDENTITY_FILES: [&str; 4] =
    ["IDENTITY.md", "SOUL.md", "USER.md", "AGENTS.md"];
const PART_SEPARATOR: &str = "\n\n---\n\n";

/// Instructions assembled from identity and memory documents.
///
/// When `BOOTSTRAP.md` exists, its content is used as is. Otherwise the
/// identity documents, today's and yesterday's daily logs and the
/// long-term memory are joined together. Missing daily logs are created
/// from a template, and a missing long-term memory is created empty.
#[derive(Clone, Debug)]
pub struct MemoryInstructions<S> {
    storage: S,
}

impl<S: Storage> MemoryInstructions<S> {
    /// Creates a source reading from `storage`.
    #[inline]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Assembles the instructions as if today were `today`.
    pub async fn assemble_for(&self, today: NaiveDate) -> String {
        if let Some(bootstrap) = self.read(BOOTSTRAP_FILE).await {
            debug!("using bootstrap instructions");
            return bootstrap;
        }

        let mut parts = vec![];
        for file in IDENTITY_FILES {
            parts.extend(self.read(file).await);
        }

        let mut days = vec![today];
        days.extend(today.pred_opt());
        for day in days {
            let path = daily_log_path(day);
            self.ensure(&path, || daily_template(day)).await;
            parts.extend(self.read(&path).await);
        }

        self.ensure(LONG_TERM_MEMORY_FILE, String::new).await;
        parts.extend(self.read(LONG_TERM_MEMORY_FILE).await);

        parts.retain(|p| !p.trim().is_empty());
        if parts.is_empty() {
            return DEFAULT_INSTRUCTIONS.to_owned();
        }
        parts.join(PART_SEPARATOR)
    }

    async fn read(&self, path: &str) -> Option<String> {
        match self.storage.read(path).await {
            Ok(content) => content,
            Err(err) => {
                warn!("failed to read {path}: {err}");
                None
            }
        }
    }

    async fn ensure<F: FnOnce() -> String>(&self, path: &str, initial: F) {
        match self.storage.exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                trace!("creating {path}");
                if let Err(err) = self.storage.write(path, &initial()).await {
                    warn!("failed to create {path}: {err}");
                }
            }
            Err(err) => warn!("failed to check {path}: {err}"),
        }
    }
}

#[async_trait]
impl<S: Storage> InstructionsSource for MemoryInstructions<S> {
    async fn load_instructions(&self, _ctx: &InstructionsContext) -> String {
        self.assemble_for(Local::now().date_naive()).await
    }
}

fn daily_log_path(day: NaiveDate) -> String {
    format!("{DAILY_LOG_DIR}/{}.md", day.format("%Y-%m-%d"))
}

fn daily_template(day: NaiveDate) -> String {
    format!(
        "# Daily Log - {}\n\n\
         - **Summary**: \n\
         - **Top Priorities**:\n  - [ ] \n  - [ ] \n\
         - **Accomplishments**:\n  - \n\
         - **Decisions Made**:\n  - \n\
         - **Open Threads / Follow-ups**:\n  - \n\
         - **Notes**:\n  - \n",
        day.format("%Y-%m-%d")
    )
}
