//! `AssignmentSink` that collects rows and writes `assignments.json` on `finish`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use qa_core::sources::AssignmentSink;
use qa_core::{Assignee, ItemId};

use crate::canonical_json::write_canonical_file;
use crate::IoError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub item: ItemId,
    pub assignee: Assignee,
}

#[derive(Serialize)]
struct AssignmentsFile<'a> {
    assignments: &'a [AssignmentRow],
}

#[derive(Debug)]
pub struct JsonAssignmentSink {
    path: PathBuf,
    rows: Vec<AssignmentRow>,
}

impl JsonAssignmentSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonAssignmentSink { path: path.into(), rows: Vec::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[AssignmentRow] {
        &self.rows
    }
}

impl AssignmentSink for JsonAssignmentSink {
    type Error = IoError;

    fn record(&mut self, item: &ItemId, assignee: &Assignee) -> Result<(), IoError> {
        self.rows.push(AssignmentRow { item: item.clone(), assignee: assignee.clone() });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), IoError> {
        write_canonical_file(&self.path, &AssignmentsFile { assignments: &self.rows })
    }
}
