//! Authentication actions and forms

pub mod actions;
pub mod forms;

pub use actions::AuthActions;
pub use forms::{password_strength_hint, FieldErrors, LoginForm, RegisterForm, MIN_PASSWORD_LEN};
