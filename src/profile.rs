//! Instrumentation profile: which types and methods the analysis recognizes
//!
//! The default profile describes the emitter library. A TOML file can
//! replace any table:
//!
//! ```toml
//! provider_types = ["acme/telemetry.Client"]
//! decorator_methods = ["MarkCallsite"]
//!
//! [[direct_methods]]
//! name = "Increment"
//! event_arg = 1
//! props_arg = 2
//! metric_kind = "COUNT"
//! ```

use crate::tree::TypeName;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Metric kind attached to timer methods
pub const TIMER_KIND: &str = "TIMER";

/// Metric kind attached to log events
pub const LOG_KIND: &str = "COUNT";

/// Method that emits an event immediately (`em.Count(ctx, "event", props, 1)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMethod {
    pub name: String,
    /// Argument position of the event name
    pub event_arg: usize,
    /// Argument position of the property map, if the method takes one
    #[serde(default)]
    pub props_arg: Option<usize>,
    /// Metric kind implied by the method (empty when not inferable)
    #[serde(default)]
    pub metric_kind: String,
}

/// Method that returns a callback handle (`em.Metric("event", COUNT)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteringMethod {
    pub name: String,
    pub event_arg: usize,
    /// Argument naming the metric kind (`types.GAUGE`)
    #[serde(default)]
    pub kind_arg: Option<usize>,
    /// Argument holding the literal list of property keys
    #[serde(default)]
    pub keys_arg: Option<usize>,
    /// Metric kind used when `kind_arg` is absent
    #[serde(default)]
    pub metric_kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Receiver types of instrumentation methods
    pub provider_types: Vec<TypeName>,

    /// Callback types returned by registering methods
    pub handle_types: Vec<TypeName>,

    /// Receiver types of timer methods
    pub timer_types: Vec<TypeName>,

    pub direct_methods: Vec<DirectMethod>,

    /// Methods on timer types; always recorded with [`TIMER_KIND`]
    pub timer_methods: Vec<DirectMethod>,

    pub registering_methods: Vec<RegisteringMethod>,

    /// Call-site decorators taking a handle as their only argument
    pub decorator_methods: Vec<String>,
}

const LOG_LEVELS: [&str; 6] = ["Info", "Warn", "Error", "Fatal", "Debug", "Trace"];

fn direct(name: impl Into<String>, event_arg: usize, props_arg: usize, kind: &str) -> DirectMethod {
    DirectMethod {
        name: name.into(),
        event_arg,
        props_arg: Some(props_arg),
        metric_kind: kind.to_string(),
    }
}

fn default_direct_methods() -> Vec<DirectMethod> {
    let mut methods: Vec<DirectMethod> = [
        ("Count", "COUNT"),
        ("Gauge", "GAUGE"),
        ("Histogram", "HISTOGRAM"),
        ("Meter", "METER"),
        ("Set", "SET"),
        ("Event", "EVENT"),
        ("EmitInt", ""),
        ("EmitFloat", ""),
        ("EmitDuration", ""),
    ]
    .iter()
    .map(|(name, kind)| direct(*name, 1, 2, kind))
    .collect();

    for level in LOG_LEVELS {
        // Info(event, props, msg) / Infof(event, props, format, args...)
        methods.push(direct(level, 0, 1, LOG_KIND));
        methods.push(direct(format!("{level}f"), 0, 1, LOG_KIND));
        // InfoContext(ctx, event, props, msg) / InfofContext(ctx, event, props, format, args...)
        methods.push(direct(format!("{level}Context"), 1, 2, LOG_KIND));
        methods.push(direct(format!("{level}fContext"), 1, 2, LOG_KIND));
    }
    methods
}

fn default_registering_methods() -> Vec<RegisteringMethod> {
    vec![
        RegisteringMethod {
            name: "Metric".to_string(),
            event_arg: 0,
            kind_arg: Some(1),
            keys_arg: None,
            metric_kind: String::new(),
        },
        RegisteringMethod {
            name: "MetricWithProps".to_string(),
            event_arg: 0,
            kind_arg: Some(1),
            keys_arg: Some(2),
            metric_kind: String::new(),
        },
        RegisteringMethod {
            name: "Log".to_string(),
            event_arg: 0,
            kind_arg: None,
            keys_arg: None,
            metric_kind: LOG_KIND.to_string(),
        },
        RegisteringMethod {
            name: "LogWithProps".to_string(),
            event_arg: 0,
            kind_arg: None,
            keys_arg: Some(2),
            metric_kind: LOG_KIND.to_string(),
        },
    ]
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            provider_types: vec![
                TypeName::new("emitter.Emitter"),
                TypeName::new("emitter/types.CombinedEmitter"),
                TypeName::new("emitter/types.MetricsEmitter"),
                TypeName::new("emitter/types.DurationEmitter"),
            ],
            handle_types: vec![
                TypeName::new("emitter/types.MetricEmitterFn"),
                TypeName::new("emitter/types.LogEmitterFn"),
            ],
            timer_types: vec![
                TypeName::new("emitter/types.MetricsTimer"),
                TypeName::new("emitter.TimingEmitter"),
            ],
            direct_methods: default_direct_methods(),
            timer_methods: vec![direct("Time", 1, 2, TIMER_KIND)],
            registering_methods: default_registering_methods(),
            decorator_methods: vec!["MetricFnCallsite".to_string(), "LogFnCallsite".to_string()],
        }
    }
}

fn contains_type(types: &[TypeName], ty: &TypeName) -> bool {
    let origin = ty.origin();
    types.iter().any(|t| t.origin() == origin)
}

impl Profile {
    /// Load a profile from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse a profile from TOML; tables that are not given keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse profile TOML")
    }

    pub fn is_provider(&self, ty: &TypeName) -> bool {
        contains_type(&self.provider_types, ty)
    }

    pub fn is_handle(&self, ty: &TypeName) -> bool {
        contains_type(&self.handle_types, ty)
    }

    pub fn is_timer(&self, ty: &TypeName) -> bool {
        contains_type(&self.timer_types, ty)
    }

    pub fn direct_method(&self, name: &str) -> Option<&DirectMethod> {
        self.direct_methods.iter().find(|m| m.name == name)
    }

    pub fn timer_method(&self, name: &str) -> Option<&DirectMethod> {
        self.timer_methods.iter().find(|m| m.name == name)
    }

    pub fn registering_method(&self, name: &str) -> Option<&RegisteringMethod> {
        self.registering_methods.iter().find(|m| m.name == name)
    }

    pub fn is_decorator(&self, name: &str) -> bool {
        self.decorator_methods.iter().any(|m| m == name)
    }
}
