use miette::Diagnostic;
use thiserror::Error;

/// Fatal construction-time failures: bad wheel geometry in the loaded
/// config, or a firmware socket that can't be bound. Everything else a
/// running `Robot` encounters is a transient fault absorbed locally (spec
/// §7).
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Kinematics(#[from] kinematics::KinematicsError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Protocol(#[from] protocol::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
