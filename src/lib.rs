//! PDF Extraction Service Client
//!
//! This library provides the client side of the pdf-extract system: it
//! submits a PDF document to the remote extraction service and tracks the
//! resulting job to completion. Text extraction is a single synchronous
//! request; image analysis is a long-running job tracked through periodic
//! progress polling, with a finite state machine governing what the user
//! sees at each point.

pub mod config;
pub mod models;
pub mod services;
pub mod view;
