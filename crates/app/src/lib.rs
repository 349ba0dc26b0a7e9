//! Estante application layer: collaborator backends, checkout orchestration and order recording.

pub mod backend;
pub mod config;
pub mod context;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;

pub mod uuids;
