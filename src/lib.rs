/*!
 * # sqlshift - SQL dialect conversion client
 *
 * A Rust library that drives a SQL conversion session against an external
 * conversion backend.
 *
 * ## Features
 *
 * - Extract SQL statements from typed text, pasted text or uploaded files
 * - Convert a whole statement set from a source to a target dialect
 * - Per-statement success and error reporting with derived counts
 * - Export successful results in several document formats, independently
 * - Last-writer-wins handling of out-of-order service answers
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `session`: Session data model and state machine:
 *   - `session::models`: Catalog, statements, selection, results
 *   - `session::machine`: Transitions, guards and request generations
 * - `services`: Collaborator traits and their implementations:
 *   - `services::http`: HTTP client for the conversion backend
 *   - `services::mock`: In-process stand-in used by tests
 *   - `services::models`: Wire types
 * - `catalog`: Dialect and format catalog loading
 * - `acquisition`: File and text input, typing debounce
 * - `conversion`: Conversion request and all-or-nothing result adoption
 * - `export`: Per-format export and download
 * - `notifications`: User-facing notification channel
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod acquisition;
pub mod app_config;
pub mod app_controller;
pub mod catalog;
pub mod conversion;
pub mod errors;
pub mod export;
pub mod notifications;
pub mod services;
pub mod session;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ConversionError, ExportError, ServiceError, SessionError};
pub use notifications::{Notification, NotificationKind, Notifier};
pub use session::{ConversionResult, ConversionStatus, ConversionSummary, SessionSnapshot, SessionState};
