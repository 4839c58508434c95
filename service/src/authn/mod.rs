//! Authentication: GitHub OAuth and browser sessions

pub mod github;
pub mod session;
