//! Terminal choropleth of movement between municipalities.
//!
//! Regions are colored by their own totals; selecting one recolors every
//! other region by its flow to or from the selection.

pub mod app;
pub mod controls;
pub mod data;
pub mod interaction;
pub mod map;
pub mod tooltip;
pub mod ui;
pub mod view;
