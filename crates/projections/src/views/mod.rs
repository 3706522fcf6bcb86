//! The materialized views of the notebook.

pub mod tag;
pub mod todo;
pub mod tree;

pub use tag::{EntityKind, EntityTagsRow, TagProjection, TagRow};
pub use todo::{TodoProjection, TodoRow};
pub use tree::{NodeKind, TreeNode, TreeViewProjection};
