//! Analysis module - dimension selection and fatality aggregation

mod aggregator;

pub use aggregator::{
    aggregate, valid_categories, AggregateError, CategoryAggregate, Dimension, DisplayMode,
    MIN_SUPPORT,
};
