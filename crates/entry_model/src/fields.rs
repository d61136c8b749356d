//! Entry field sets.
//!
//! `EntryFields` is the full field set carried by a create; `EntryChanges` is
//! the partial set carried by an update, where `None` means "unchanged".

use serde::{Deserialize, Serialize};

/// The full editable field set of a journal entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFields {
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub location_name: Option<String>,
}

impl EntryFields {
    /// Create a field set with just a title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Apply a partial change set, leaving unset fields untouched.
    pub fn apply(&mut self, changes: &EntryChanges) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(mood) = &changes.mood {
            self.mood = Some(mood.clone());
        }
        if let Some(weather) = &changes.weather {
            self.weather = Some(weather.clone());
        }
        if let Some(location_name) = &changes.location_name {
            self.location_name = Some(location_name.clone());
        }
    }
}

/// A partial field set for an update mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub location_name: Option<String>,
}

impl EntryChanges {
    /// A change set that only retitles the entry.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// A change set that only replaces the content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Check whether the change set touches any field.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.mood.is_none()
            && self.weather.is_none()
            && self.location_name.is_none()
    }
}
