use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::{fs::File, io::{AsyncBufReadExt, BufReader, Lines}};
use crate::{application::{AppError, AppResult, BlockSource}, domain::Block};

/// Reads newline-delimited JSON blocks, one block per line.
pub struct FileSourceAdaptor {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: u64,
}

impl FileSourceAdaptor {
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| AppError::Source(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), "Opened block file");

        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

#[async_trait]
impl BlockSource for FileSourceAdaptor {
    async fn next_block(&mut self) -> AppResult<Option<Block>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| AppError::Source(format!("{}: {}", self.path.display(), e)))?;
            self.line_no += 1;

            let Some(line) = line else { return Ok(None) };
            if line.trim().is_empty() {
                continue;
            }

            return serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| AppError::InvalidBlock(format!("{}:{}: {}", self.path.display(), self.line_no, e)));
        }
    }
}
