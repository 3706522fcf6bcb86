//! Category aggregate: the folders of the notebook tree.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Category;
pub use commands::*;
pub use events::{
    CategoryCreatedData, CategoryDeletedData, CategoryEvent, CategoryMovedData,
    CategoryRenamedData,
};
pub use service::CategoryService;

pub(crate) use events::register_events;

use common::AggregateId;
use thiserror::Error;

use crate::validation::TextError;

/// Errors that can occur during category operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    /// The name failed validation.
    #[error("Invalid category name: {0}")]
    InvalidName(#[from] TextError),

    /// The category has not been created.
    #[error("Category does not exist")]
    NotCreated,

    /// The category has been deleted.
    #[error("Category has been deleted")]
    Deleted,

    /// The command would not change anything.
    #[error("Category {field} is unchanged")]
    Unchanged { field: &'static str },

    /// A category cannot be its own parent.
    #[error("Category cannot be its own parent")]
    SelfParent,

    /// The move would make the category an ancestor of itself.
    #[error("Moving category {category_id} under {parent_id} would create a cycle")]
    Cycle {
        category_id: AggregateId,
        parent_id: AggregateId,
    },

    /// The category would sit deeper than allowed.
    #[error("Category nesting exceeds {max} levels")]
    TooDeep { max: usize },
}
