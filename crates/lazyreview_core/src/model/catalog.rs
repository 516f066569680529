//! Subject and catalog aggregates.
//!
//! # Responsibility
//! - Own every subject and chapter plus the active interval configuration.
//! - Answer "what is due on this day" in a stable order.
//! - Provide structural add/remove primitives for service orchestration.
//!
//! # Invariants
//! - Subject names are unique (case-sensitive exact match).
//! - Chapter titles are unique within their subject.
//! - Subjects and chapters keep insertion order.
//! - The catalog performs no I/O; calendar sync and persistence are driven
//!   by the service layer.

use crate::model::chapter::Chapter;
use crate::model::interval::IntervalSequence;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Uniqueness violations detected in a loaded catalog document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIntegrityError {
    DuplicateSubject(String),
    DuplicateChapter { subject: String, title: String },
}

impl Display for CatalogIntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSubject(name) => write!(f, "subject `{name}` appears more than once"),
            Self::DuplicateChapter { subject, title } => {
                write!(f, "chapter `{title}` appears more than once in subject `{subject}`")
            }
        }
    }
}

impl Error for CatalogIntegrityError {}

/// Named group of chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    name: String,
    #[serde(default)]
    chapters: Vec<Chapter>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chapters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, title: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.title() == title)
    }

    pub fn chapter_mut(&mut self, title: &str) -> Option<&mut Chapter> {
        self.chapters
            .iter_mut()
            .find(|chapter| chapter.title() == title)
    }

    pub fn has_chapter(&self, title: &str) -> bool {
        self.chapter(title).is_some()
    }

    /// Appends a chapter, handing it back when the title is already taken.
    pub fn push_chapter(&mut self, chapter: Chapter) -> Result<(), Chapter> {
        if self.has_chapter(chapter.title()) {
            return Err(chapter);
        }
        self.chapters.push(chapter);
        Ok(())
    }

    pub fn remove_chapter(&mut self, title: &str) -> Option<Chapter> {
        let index = self
            .chapters
            .iter()
            .position(|chapter| chapter.title() == title)?;
        Some(self.chapters.remove(index))
    }

    /// Mutable access to every chapter, used for cascading calendar cleanup.
    pub fn chapters_mut(&mut self) -> impl Iterator<Item = &mut Chapter> {
        self.chapters.iter_mut()
    }
}

/// Root aggregate; the whole persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "review intervals")]
    intervals: IntervalSequence,
    #[serde(default)]
    subjects: Vec<Subject>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(IntervalSequence::default())
    }
}

impl Catalog {
    pub fn new(intervals: IntervalSequence) -> Self {
        Self {
            intervals,
            subjects: Vec::new(),
        }
    }

    pub fn intervals(&self) -> &IntervalSequence {
        &self.intervals
    }

    /// Replaces the interval configuration; existing chapters keep their dates.
    pub fn set_intervals(&mut self, intervals: IntervalSequence) {
        self.intervals = intervals;
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.name() == name)
    }

    pub fn subject_mut(&mut self, name: &str) -> Option<&mut Subject> {
        self.subjects
            .iter_mut()
            .find(|subject| subject.name() == name)
    }

    /// Returns the named subject, appending an empty one when absent.
    pub fn find_or_create_subject(&mut self, name: &str) -> &mut Subject {
        let index = match self
            .subjects
            .iter()
            .position(|subject| subject.name() == name)
        {
            Some(index) => index,
            None => {
                self.subjects.push(Subject::new(name));
                self.subjects.len() - 1
            }
        };
        &mut self.subjects[index]
    }

    pub fn remove_subject(&mut self, name: &str) -> Option<Subject> {
        let index = self
            .subjects
            .iter()
            .position(|subject| subject.name() == name)?;
        Some(self.subjects.remove(index))
    }

    /// Removes every subject, returning them in insertion order.
    pub fn take_subjects(&mut self) -> Vec<Subject> {
        std::mem::take(&mut self.subjects)
    }

    /// Chapters whose next review falls on `date`, as `(subject name, chapter)`.
    ///
    /// Completed chapters never match because they have no next review.
    pub fn due_on(&self, date: NaiveDate) -> Vec<(&str, &Chapter)> {
        self.subjects
            .iter()
            .flat_map(|subject| {
                subject
                    .chapters()
                    .iter()
                    .filter(move |chapter| chapter.next_review_date() == Some(date))
                    .map(move |chapter| (subject.name(), chapter))
            })
            .collect()
    }

    /// Checks uniqueness rules that serde cannot express.
    pub fn validate(&self) -> Result<(), CatalogIntegrityError> {
        let mut names = HashSet::new();
        for subject in &self.subjects {
            if !names.insert(subject.name()) {
                return Err(CatalogIntegrityError::DuplicateSubject(
                    subject.name().to_string(),
                ));
            }
            let mut titles = HashSet::new();
            for chapter in subject.chapters() {
                if !titles.insert(chapter.title()) {
                    return Err(CatalogIntegrityError::DuplicateChapter {
                        subject: subject.name().to_string(),
                        title: chapter.title().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
