#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::non_ascii_literal,
    clippy::verbose_bit_mask,
)]

pub mod archive;
pub mod compression;
pub mod error;
pub(crate) mod io;
pub mod resources;
pub(crate) mod string;
pub(crate) mod types;

pub use crate::archive::MohawkArchive;
pub use crate::error::{Error, Result};
pub use crate::types::tag::Tag;

#[must_use]
pub fn name(with_version: bool) -> String {
    let mut name = "mohawk".to_string();
    if with_version {
        let version = version();
        if !version.is_empty() {
            name.push(' ');
            name.push_str(&version);
        }
    }
    name
}

#[must_use]
pub fn version() -> String {
    const SEMVER: Option<&str> = option_env!("VERGEN_SEMVER");
    const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");
    const GIT_HASH: Option<&str> = option_env!("VERGEN_SHA_SHORT");

    let mut version = String::new();
    if let Some(semver) = SEMVER.or(VERSION) {
        if semver == "UNKNOWN" && VERSION.is_some() {
            version += VERSION.unwrap();
        } else {
            version += semver;
        }
    }
    if let Some(hash) = GIT_HASH {
        if !version.is_empty() {
            version.push(' ');
        }
        version.push_str(&format!("({})", hash));
    }
    version
}
