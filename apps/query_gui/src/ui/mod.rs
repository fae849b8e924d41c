//! UI layer for the query console window.

pub mod app;

pub use app::QueryConsoleApp;
