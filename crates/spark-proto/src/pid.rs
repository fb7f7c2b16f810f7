//! ---
//! spark_section: "02-messaging-ipc-data-model"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block schema definitions and storage-width validation."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! PID controller block.
//!
//! [`Pid`] is the full block as reported by a controller. [`PidPersisted`]
//! is the subset that survives a restart: it reuses the field numbers of
//! `Pid` but leaves out the runtime [`State`] (field 2). Because the tags
//! line up, a `Pid` buffer decodes as `PidPersisted` with the state skipped,
//! and a `PidPersisted` buffer decodes as `Pid` with no state.

use crate::bounds::Bounded;
use crate::Result;

pub use crate::generated::pid::{Filtering, Links, Settings, State};
pub use crate::generated::{Pid, PidPersisted};

impl Pid {
    /// Drop the runtime state, keeping what survives a restart.
    pub fn to_persisted(&self) -> PidPersisted {
        PidPersisted {
            settings: self.settings.clone(),
            links: self.links.clone(),
            filtering: self.filtering.clone(),
        }
    }

    /// Rebuild a block from persisted data. The state starts out empty.
    pub fn from_persisted(persisted: PidPersisted) -> Self {
        Self {
            settings: persisted.settings,
            state: None,
            links: persisted.links,
            filtering: persisted.filtering,
        }
    }
}

impl From<PidPersisted> for Pid {
    fn from(persisted: PidPersisted) -> Self {
        Self::from_persisted(persisted)
    }
}

impl From<&Pid> for PidPersisted {
    fn from(pid: &Pid) -> Self {
        pid.to_persisted()
    }
}

// All PID integers use full 32-bit storage.
impl Bounded for Pid {
    fn check_bounds(&self) -> Result<()> {
        Ok(())
    }
}

impl Bounded for PidPersisted {
    fn check_bounds(&self) -> Result<()> {
        Ok(())
    }
}
