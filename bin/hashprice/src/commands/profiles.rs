//! Profiles Subcommand

use crate::{commands::write_json_lines, flags::GlobalArgs};
use anyhow::{Context, Result, ensure};
use clap::Subcommand;
use hashprice_primitives::HardwareProfile;
use hashprice_storage::HardwareProfileStorage;
use serde::Deserialize;
use std::{io, path::PathBuf};
use tracing::info;

/// The `profiles` Subcommand
///
/// Manages the hardware profiles revenue is allocated to. The default profiles are seeded the
/// first time the database is opened.
///
/// # Usage
///
/// ```sh
/// hashprice profiles list
/// hashprice profiles import ./profiles.toml
/// ```
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum ProfilesCommand {
    /// Prints every stored hardware profile as one JSON object per line.
    List,
    /// Inserts or overwrites the hardware profiles listed in a TOML file.
    Import {
        /// Path of a TOML file containing `[[profile]]` tables.
        path: PathBuf,
    },
}

/// The file format accepted by `profiles import`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfilesFile {
    #[serde(default)]
    profile: Vec<HardwareProfile>,
}

impl ProfilesFile {
    fn parse(contents: &str) -> Result<Vec<HardwareProfile>> {
        let file: Self = toml::from_str(contents).context("invalid profiles file")?;
        for profile in &file.profile {
            ensure!(!profile.id.is_empty(), "profile with an empty id");
            ensure!(
                profile.power_watts > 0.0,
                "profile {} must have a positive power_watts",
                profile.id
            );
            ensure!(
                profile.hash_rate > 0.0,
                "profile {} must have a positive hash_rate",
                profile.id
            );
        }
        Ok(file.profile)
    }
}

impl ProfilesCommand {
    /// Runs the subcommand.
    pub(crate) fn run(self, args: &GlobalArgs) -> Result<()> {
        let db = args.open_seeded_db()?;
        match self {
            Self::List => {
                let profiles = db.hardware_profiles()?;
                write_json_lines(io::stdout().lock(), &profiles)?;
            }
            Self::Import { path } => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let profiles = ProfilesFile::parse(&contents)?;
                db.upsert_hardware_profiles(&profiles)?;
                info!(target: "storage", count = profiles.len(), "Imported hardware profiles");
            }
        }
        Ok(())
    }
}
