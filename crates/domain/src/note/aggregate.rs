//! Note aggregate implementation.

use std::collections::BTreeSet;

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Changeset};
use crate::validation::NOTE_TITLE;

use super::{NoteError, NoteEvent};

/// Note aggregate root.
///
/// The body of a note lives outside the event log (it is edited as a file);
/// the aggregate tracks only what the tree and tag views need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    id: Option<AggregateId>,
    #[serde(default)]
    version: Version,
    title: String,
    category_id: Option<AggregateId>,
    tags: BTreeSet<AggregateId>,
    deleted: bool,
}

impl Aggregate for Note {
    type Event = NoteEvent;
    type Error = NoteError;

    fn aggregate_type() -> &'static str {
        "Note"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(mut self, event: &Self::Event) -> Self {
        match event {
            NoteEvent::NoteCreated(data) => {
                self.id = Some(data.note_id);
                self.title = data.title.clone();
                self.category_id = data.category_id;
            }
            NoteEvent::NoteRenamed(data) => self.title = data.title.clone(),
            NoteEvent::NoteMoved(data) => self.category_id = data.category_id,
            NoteEvent::NoteTagged(data) => {
                self.tags.insert(data.tag_id);
            }
            NoteEvent::NoteUntagged(data) => {
                self.tags.remove(&data.tag_id);
            }
            NoteEvent::NoteDeleted(_) => self.deleted = true,
        }
        self
    }
}

// Query methods
impl Note {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category_id(&self) -> Option<AggregateId> {
        self.category_id
    }

    pub fn tags(&self) -> &BTreeSet<AggregateId> {
        &self.tags
    }

    pub fn has_tag(&self, tag_id: AggregateId) -> bool {
        self.tags.contains(&tag_id)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

// Command methods (return events)
impl Note {
    /// Validates the title and starts a new note stream.
    pub fn create_new(
        id: AggregateId,
        title: &str,
        category_id: Option<AggregateId>,
    ) -> Result<Changeset<Self>, NoteError> {
        let title = NOTE_TITLE.check(title)?;
        Ok(Changeset::created(NoteEvent::note_created(id, title, category_id)))
    }

    pub fn rename(&self, title: &str) -> Result<NoteEvent, NoteError> {
        self.ensure_live()?;
        let title = NOTE_TITLE.check(title)?;
        if title == self.title {
            return Err(NoteError::Unchanged { field: "title" });
        }
        Ok(NoteEvent::note_renamed(title))
    }

    pub fn move_to(&self, category_id: Option<AggregateId>) -> Result<NoteEvent, NoteError> {
        self.ensure_live()?;
        if category_id == self.category_id {
            return Err(NoteError::Unchanged { field: "category" });
        }
        Ok(NoteEvent::note_moved(category_id))
    }

    pub fn add_tag(&self, tag_id: AggregateId) -> Result<NoteEvent, NoteError> {
        self.ensure_live()?;
        if self.has_tag(tag_id) {
            return Err(NoteError::AlreadyTagged { tag_id });
        }
        Ok(NoteEvent::note_tagged(tag_id))
    }

    pub fn remove_tag(&self, tag_id: AggregateId) -> Result<NoteEvent, NoteError> {
        self.ensure_live()?;
        if !self.has_tag(tag_id) {
            return Err(NoteError::NotTagged { tag_id });
        }
        Ok(NoteEvent::note_untagged(tag_id))
    }

    pub fn delete(&self) -> Result<NoteEvent, NoteError> {
        self.ensure_live()?;
        Ok(NoteEvent::note_deleted())
    }

    fn ensure_live(&self) -> Result<(), NoteError> {
        if self.id.is_none() {
            return Err(NoteError::NotCreated);
        }
        if self.deleted {
            return Err(NoteError::Deleted);
        }
        Ok(())
    }
}
