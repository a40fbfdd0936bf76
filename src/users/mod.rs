//! # Users
//!
//! Account management for administrators, plus the self-service profile
//! update every role may perform.

pub(crate) mod repository;
pub mod schema;
pub mod service;

pub use schema::{CreateUserRequest, NewUser, UpdateUserRequest, UserListQuery, UserPatch};
