pub mod config;
pub mod document;
pub mod expression;
pub mod form;
pub mod generation;
pub mod render;
pub mod schema;
pub mod shared;
pub mod slides;
pub mod viewer;
