// In-memory implementation of SheetSource: a fixed grid of rows.

use crate::core::filing::filing_ports::{ServiceError, SheetSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct SheetState {
    rows: Vec<Vec<String>>,
    reads: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

/// Cheap to clone; clones share the same rows and read log.
#[derive(Clone, Default)]
pub struct InMemorySheet {
    state: Arc<SheetState>,
}

impl InMemorySheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            state: Arc::new(SheetState {
                rows,
                ..Default::default()
            }),
        }
    }

    /// Builds the sheet from string slices, header row included.
    pub fn from_cells(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    /// Make every later read fail with a transport error.
    pub fn fail(&self) {
        self.state.failing.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.requests().len()
    }

    /// Every `(spreadsheet_id, range)` pair read so far, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state
            .reads
            .lock()
            .map(|reads| reads.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SheetSource for InMemorySheet {
    async fn read_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError> {
        if let Ok(mut reads) = self.state.reads.lock() {
            reads.push((spreadsheet_id.to_string(), range.to_string()));
        }

        if self.state.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport("sheet unavailable".to_string()));
        }
        Ok(self.state.rows.clone())
    }
}
