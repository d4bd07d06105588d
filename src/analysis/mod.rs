//! Call-site attribution for registered instrumentation callbacks
//!
//! Two passes over the calls of a package:
//!
//! 1. Scanner: every recognized instrumentation call is checked for a literal
//!    event name; registering calls become `Registration`s.
//! 2. Classifier + resolver + recorder: direct emits are recorded where they
//!    stand; handle invocations (and decorator calls) are traced backward to
//!    the registration that produced the handle, and recorded at the
//!    invocation (or decorator) location.
//!
//! Resolution is lazy and backward: nothing is propagated forward, and the
//! result never depends on the order in which declarations were visited.

mod classifier;
mod index;
mod recorder;
mod resolver;
mod scanner;

pub use classifier::{CallClass, Classifier, Invocation, InvocationKind};
pub use recorder::{Attribution, CallSiteRecorder};
pub use resolver::{Resolver, MAX_RESOLUTION_DEPTH};
pub use scanner::Scanner;

use crate::profile::Profile;
use crate::tree::walk::{self, Site};
use crate::tree::{Package, TypeOracle};
use index::TreeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Fatal analysis failures; both abort the run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("event name at {location} must be a string literal, got {found} (in call at {call})")]
    NonLiteralEventName {
        location: Location,
        call: Location,
        found: String,
    },

    #[error("duplicate event name {event:?}: already defined at {first}, found again at {second}")]
    DuplicateEvent {
        event: String,
        first: Location,
        second: Location,
    },
}

/// File and line of a node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A registering call and the metadata it attaches to its handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub event_name: String,
    pub location: Location,
    pub enclosing_routine: String,
    /// Sorted, deduplicated; empty when none were declared statically
    pub property_keys: Vec<String>,
    /// Empty when not statically inferable
    pub metric_kind: String,
}

/// Output record: event metadata attributed to an invocation location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub event_name: String,
    pub filename: String,
    pub line_no: u32,
    pub func_name: String,
    pub package: String,
    pub property_keys: Vec<String>,
    pub metric_type: String,
}

impl CallSite {
    pub fn location(&self) -> Location {
        Location {
            file: self.filename.clone(),
            line: self.line_no,
        }
    }
}

/// Final event name -> call site mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSiteMap {
    entries: BTreeMap<String, CallSite>,
}

impl CallSiteMap {
    pub fn get(&self, event: &str) -> Option<&CallSite> {
        self.entries.get(event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.entries.contains_key(event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Call sites ordered by (filename, line, event name)
    pub fn sorted(&self) -> Vec<&CallSite> {
        let mut sites: Vec<&CallSite> = self.entries.values().collect();
        sites.sort_by(|a, b| {
            (&a.filename, a.line_no, &a.event_name).cmp(&(&b.filename, b.line_no, &b.event_name))
        });
        sites
    }
}

impl From<BTreeMap<String, CallSite>> for CallSiteMap {
    fn from(entries: BTreeMap<String, CallSite>) -> Self {
        Self { entries }
    }
}

/// Runs both passes over one package
pub struct Analyzer<'a> {
    package: &'a Package,
    oracle: &'a dyn TypeOracle,
    profile: &'a Profile,
    index: TreeIndex<'a>,
}

impl<'a> Analyzer<'a> {
    /// Analyzer using the type tables embedded in the package
    pub fn new(package: &'a Package, profile: &'a Profile) -> Self {
        Self::with_oracle(package, package, profile)
    }

    pub fn with_oracle(
        package: &'a Package,
        oracle: &'a dyn TypeOracle,
        profile: &'a Profile,
    ) -> Self {
        Self {
            package,
            oracle,
            profile,
            index: TreeIndex::build(package, oracle),
        }
    }

    fn scanner(&self) -> Scanner<'a> {
        Scanner::new(self.package, self.oracle, self.profile)
    }

    /// Every registration in the package, in traversal order
    pub fn registrations(&self) -> Result<Vec<Registration>, AnalysisError> {
        let scanner = self.scanner();
        let mut found = Vec::new();
        for call in walk::calls(self.package) {
            if let Some(registration) = scanner.registration(call.expr, &call.site)? {
                found.push(registration);
            }
        }
        Ok(found)
    }

    pub fn run(&self) -> Result<CallSiteMap, AnalysisError> {
        let calls = walk::calls(self.package);
        let scanner = self.scanner();
        let classifier = Classifier::new(self.oracle, self.profile);
        let resolver = Resolver::new(&self.index, self.oracle, &scanner, &classifier);
        let mut recorder = CallSiteRecorder::new();

        for call in &calls {
            scanner.validate(call.expr, &call.site)?;
        }

        for call in &calls {
            match classifier.classify(call.expr) {
                CallClass::Emit(method) | CallClass::Timer(method) => {
                    if let Some(site) = scanner.direct_callsite(call.expr, method, &call.site) {
                        recorder.record(site, Attribution::Direct)?;
                    }
                }
                CallClass::Registering(_) | CallClass::Other => {}
                CallClass::Invocation(invocation) => {
                    self.attribute(&resolver, &mut recorder, &invocation, &call.site)?;
                }
            }
        }

        Ok(recorder.finish())
    }

    fn attribute(
        &self,
        resolver: &Resolver<'_, 'a>,
        recorder: &mut CallSiteRecorder,
        invocation: &Invocation<'a>,
        site: &Site<'a>,
    ) -> Result<(), AnalysisError> {
        let Some(registration) = resolver.resolve(invocation.target, site) else {
            tracing::debug!(
                file = %self.package.files[site.file].name,
                pos = %site.pos,
                kind = ?invocation.kind,
                "invocation left unresolved"
            );
            return Ok(());
        };

        let attribution = if invocation.kind == InvocationKind::Decorated {
            Attribution::Decorator
        } else {
            Attribution::Direct
        };
        recorder.record(self.callsite_at(&registration, site), attribution)
    }

    /// Registration metadata placed at `site`
    fn callsite_at(&self, registration: &Registration, site: &Site<'_>) -> CallSite {
        CallSite {
            event_name: registration.event_name.clone(),
            filename: self.package.files[site.file].name.clone(),
            line_no: site.pos.line,
            func_name: site
                .func
                .map(|f| self.package.qualify(f))
                .unwrap_or_default(),
            package: self.package.path.clone(),
            property_keys: registration.property_keys.clone(),
            metric_type: registration.metric_kind.clone(),
        }
    }
}

/// Extract every call site of `package` with the given profile
pub fn extract_callsites(
    package: &Package,
    profile: &Profile,
) -> Result<CallSiteMap, AnalysisError> {
    Analyzer::new(package, profile).run()
}
