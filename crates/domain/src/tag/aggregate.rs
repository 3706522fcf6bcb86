//! Tag aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, Changeset};
use crate::validation::TAG_NAME;

use super::{TagError, TagEvent};

/// Tag aggregate root.
///
/// Tag names are not required to be unique; two tags with the same name are
/// simply two tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: Option<AggregateId>,
    #[serde(default)]
    version: Version,
    name: String,
    color: Option<String>,
    deleted: bool,
}

impl Aggregate for Tag {
    type Event = TagEvent;
    type Error = TagError;

    fn aggregate_type() -> &'static str {
        "Tag"
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
            TagEvent::TagCreated(data) => {
                self.id = Some(data.tag_id);
                self.name = data.name.clone();
                self.color = data.color.clone();
            }
            TagEvent::TagRenamed(data) => self.name = data.name.clone(),
            TagEvent::TagRecolored(data) => self.color = data.color.clone(),
            TagEvent::TagDeleted(_) => self.deleted = true,
        }
        self
    }
}

// Query methods
impl Tag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

// Command methods (return events)
impl Tag {
    pub fn create_new(
        id: AggregateId,
        name: &str,
        color: Option<&str>,
    ) -> Result<Changeset<Self>, TagError> {
        let name = TAG_NAME.check(name)?;
        let color = color.map(parse_color).transpose()?;
        Ok(Changeset::created(TagEvent::tag_created(id, name, color)))
    }

    pub fn rename(&self, name: &str) -> Result<TagEvent, TagError> {
        self.ensure_live()?;
        let name = TAG_NAME.check(name)?;
        if name == self.name {
            return Err(TagError::Unchanged { field: "name" });
        }
        Ok(TagEvent::tag_renamed(name))
    }

    /// Sets or clears the colour.
    pub fn recolor(&self, color: Option<&str>) -> Result<TagEvent, TagError> {
        self.ensure_live()?;
        let color = color.map(parse_color).transpose()?;
        if color == self.color {
            return Err(TagError::Unchanged { field: "color" });
        }
        Ok(TagEvent::tag_recolored(color))
    }

    pub fn delete(&self) -> Result<TagEvent, TagError> {
        self.ensure_live()?;
        Ok(TagEvent::tag_deleted())
    }

    fn ensure_live(&self) -> Result<(), TagError> {
        if self.id.is_none() {
            return Err(TagError::NotCreated);
        }
        if self.deleted {
            return Err(TagError::Deleted);
        }
        Ok(())
    }
}

/// Accepts `#RRGGBB` in either case and stores it upper-cased.
fn parse_color(raw: &str) -> Result<String, TagError> {
    let value = raw.trim();
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(TagError::InvalidColor(raw.to_string()));
    }
    Ok(value.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urgent() -> Tag {
        Tag::create_new(AggregateId::new(), "urgent", Some("#ff0000"))
            .unwrap()
            .aggregate()
            .clone()
    }

    #[test]
    fn test_create_normalises_color() {
        let tag = urgent();
        assert_eq!(tag.name(), "urgent");
        assert_eq!(tag.color(), Some("#FF0000"));
    }

    #[test]
    fn test_invalid_colors_are_rejected() {
        let id = AggregateId::new();
        for color in ["red", "#FF00", "#GG0000", "FF0000#"] {
            assert!(
                matches!(Tag::create_new(id, "x", Some(color)), Err(TagError::InvalidColor(_))),
                "{color} accepted"
            );
        }
        assert!(Tag::create_new(id, "x", None).is_ok());
    }

    #[test]
    fn test_recolor() {
        let tag = urgent();
        assert_eq!(
            tag.recolor(Some("#FF0000")),
            Err(TagError::Unchanged { field: "color" })
        );

        let tag = tag.clone().apply(&tag.recolor(None).unwrap());
        assert_eq!(tag.color(), None);
    }

    #[test]
    fn test_name_limit() {
        let id = AggregateId::new();
        assert!(Tag::create_new(id, &"a".repeat(50), None).is_ok());
        assert!(matches!(
            Tag::create_new(id, &"a".repeat(51), None),
            Err(TagError::InvalidName(_))
        ));
    }

    #[test]
    fn test_deleted_tag_rejects_commands() {
        let tag = urgent();
        let tag = tag.clone().apply(&tag.delete().unwrap());
        assert_eq!(tag.rename("later"), Err(TagError::Deleted));
        assert_eq!(tag.delete(), Err(TagError::Deleted));
    }
}
