//! Bundler input options.

use indexmap::IndexMap;
use serde::Deserialize;

/// The `input` bundler option in any of its accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputOption {
    /// `input: "src/main.ts"`
    Single(String),
    /// `input: ["src/a.ts", "src/b.ts"]`
    Multiple(Vec<String>),
    /// `input: { main: "src/main.ts" }`, values in declaration order.
    Named(IndexMap<String, String>),
}

impl InputOption {
    /// Normalize into an ordered list of entry paths.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::Single(entry) => vec![entry.clone()],
            Self::Multiple(entries) => entries.clone(),
            Self::Named(entries) => entries.values().cloned().collect(),
        }
    }
}

impl From<&str> for InputOption {
    fn from(entry: &str) -> Self {
        Self::Single(entry.to_string())
    }
}

impl From<Vec<String>> for InputOption {
    fn from(entries: Vec<String>) -> Self {
        Self::Multiple(entries)
    }
}

/// Options passed to the `options` hook at build start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputOptions {
    #[serde(default)]
    pub input: Option<InputOption>,
}

impl InputOptions {
    #[must_use]
    pub fn new(input: impl Into<InputOption>) -> Self {
        Self {
            input: Some(input.into()),
        }
    }
}
