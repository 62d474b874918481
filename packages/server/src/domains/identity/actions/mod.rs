//! Identity domain actions

mod register;

pub use register::{register_organization, register_samaritan};
