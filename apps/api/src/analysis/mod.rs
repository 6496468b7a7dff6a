//! Career analysis of the skills a user already has on file, delegated to
//! the resume service.

pub mod handlers;
