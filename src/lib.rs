//! Desktop client for the chord annotation server: pick or drop a PDF score,
//! send it for OMR and chord analysis, and fetch the annotated result.

// Single-file view of the widget's state
pub mod model;
// Drag/drop, validation and submission state machine
pub mod widget;
// Multipart upload and reply handling
pub mod upload;
pub mod error;
// Command-line and environment configuration
pub mod config;
pub mod logging;
// eframe application
pub mod app;
