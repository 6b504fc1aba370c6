//! CLI command implementations

pub(crate) mod common;
pub(crate) mod down;
pub(crate) mod status;
pub(crate) mod unlock;
pub(crate) mod up;
