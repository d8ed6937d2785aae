//! Layout and lifecycle engine for a stack of toast notifications.
//!
//! The crate decides where each toast sits, how large it is drawn, when it is
//! shown and when it goes away. Drawing and animating is left to the host:
//! it feeds user input and measured heights into a
//! [`controller::StackController`] and renders the [`models::StackView`] it
//! gets back.

pub mod config;
pub mod controller;
pub mod dismissal;
pub mod heights;
pub mod layout;
pub mod models;
pub mod store;
pub mod timer;

pub use controller::StackController;
pub use models::{StackEvent, StackMode, StackView, ToastId};
