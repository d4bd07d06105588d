//! Call-site recorder: one call site per event name
//!
//! A decorator entry replaces whatever is stored. A non-decorator write for
//! an event that already has an entry, direct or decorated, is an error.

use super::{AnalysisError, CallSite, CallSiteMap};
use std::collections::BTreeMap;

/// How a call site was attributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// Direct emit or plain handle invocation
    Direct,
    /// Location stamped by a call-site decorator
    Decorator,
}

#[derive(Debug, Default)]
pub struct CallSiteRecorder {
    entries: BTreeMap<String, CallSite>,
}

impl CallSiteRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, site: CallSite, attribution: Attribution) -> Result<(), AnalysisError> {
        let location = site.location();
        if let Some(existing) = self.entries.get(&site.event_name) {
            if attribution == Attribution::Direct {
                return Err(AnalysisError::DuplicateEvent {
                    event: site.event_name,
                    first: existing.location(),
                    second: location,
                });
            }
            tracing::debug!(
                event = %site.event_name,
                previous = %existing.location(),
                %location,
                "decorator overrides call site"
            );
        } else {
            tracing::debug!(event = %site.event_name, %location, ?attribution, "recorded call site");
        }
        self.entries.insert(site.event_name.clone(), site);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> CallSiteMap {
        self.entries.into()
    }
}
