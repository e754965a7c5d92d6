//! Option table and enumerated option types.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use super::ConfigValue;
use crate::error::ConfigError;

/// A string that names no variant of an enumerated option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value `{value}`, expected one of: {}", expected.join(", "))]
pub struct ParseOptionError {
    pub value: String,
    pub expected: &'static [&'static str],
}

/// Declares an enumerated option type with its textual spellings.
///
/// Parsing is case-insensitive; display and serialization use the canonical
/// spelling.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Canonical spellings of every variant.
            pub const VARIANTS: &'static [&'static str] = &[$($text),+];

            /// Canonical spelling of this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseOptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParseOptionError {
                    value: s.to_string(),
                    expected: Self::VARIANTS,
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

option_enum! {
    /// Output form requested from a session run.
    pub enum EmitMode {
        /// Write formatted text back to the input files.
        Files => "files",
        /// Print formatted text to standard output.
        Stdout => "stdout",
        /// Print a line diff against the original.
        Diff => "diff",
        /// Only report which inputs would change.
        Check => "check",
        /// Print machine-readable modified line chunks.
        ModifiedLines => "modified-lines",
    }
    default = Files;
}

impl EmitMode {
    /// Whether this mode produces `ModifiedLines` rather than full text.
    pub fn wants_diff(self) -> bool {
        matches!(
            self,
            EmitMode::Diff | EmitMode::Check | EmitMode::ModifiedLines
        )
    }
}

option_enum! {
    /// Line terminator written to formatted output.
    pub enum NewlineStyle {
        /// Keep the terminator found first in the original.
        Auto => "auto",
        /// Use the platform's terminator.
        Native => "native",
        Unix => "unix",
        Windows => "windows",
    }
    default = Auto;
}

impl NewlineStyle {
    /// Resolves the terminator to use for output derived from `original`.
    pub fn line_ending(self, original: &str) -> &'static str {
        match self {
            NewlineStyle::Unix => "\n",
            NewlineStyle::Windows => "\r\n",
            NewlineStyle::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            NewlineStyle::Auto => match original.find('\n') {
                Some(idx) if idx > 0 && original.as_bytes()[idx - 1] == b'\r' => "\r\n",
                Some(_) => "\n",
                None => NewlineStyle::Native.line_ending(original),
            },
        }
    }
}

option_enum! {
    /// Whether report output is colored.
    pub enum Color {
        /// Color when writing to a terminal.
        Auto => "auto",
        Always => "always",
        Never => "never",
    }
    default = Auto;
}

impl Color {
    /// Decides coloring given whether the target stream is a terminal.
    pub fn use_colors(self, is_terminal: bool) -> bool {
        match self {
            Color::Always => true,
            Color::Never => false,
            Color::Auto => is_terminal,
        }
    }
}

option_enum! {
    /// How much the front end reports.
    pub enum Verbosity {
        Verbose => "verbose",
        Normal => "normal",
        Quiet => "quiet",
    }
    default = Normal;
}

option_enum! {
    /// Language edition passed through to the renderer.
    pub enum Edition {
        Edition2015 => "2015",
        Edition2018 => "2018",
        Edition2021 => "2021",
        Edition2024 => "2024",
    }
    default = Edition2021;
}

/// Kind and default of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool {
        default: bool,
    },
    Integer {
        default: u64,
        min: u64,
        max: u64,
    },
    Choice {
        default: &'static str,
        variants: &'static [&'static str],
    },
    Text {
        default: &'static str,
    },
}

/// Static description of one configuration option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    /// Unstable options require `unstable_features`.
    pub stable: bool,
    pub doc: &'static str,
}

pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "max_width",
        kind: OptionKind::Integer {
            default: 100,
            min: 1,
            max: 1000,
        },
        stable: true,
        doc: "Maximum width of each line",
    },
    OptionSpec {
        name: "hard_tabs",
        kind: OptionKind::Bool { default: false },
        stable: true,
        doc: "Use tab characters for indentation, spaces for alignment",
    },
    OptionSpec {
        name: "tab_spaces",
        kind: OptionKind::Integer {
            default: 4,
            min: 1,
            max: 16,
        },
        stable: true,
        doc: "Number of spaces per tab",
    },
    OptionSpec {
        name: "newline_style",
        kind: OptionKind::Choice {
            default: NewlineStyle::Auto.as_str(),
            variants: NewlineStyle::VARIANTS,
        },
        stable: true,
        doc: "Unix or Windows line endings",
    },
    OptionSpec {
        name: "edition",
        kind: OptionKind::Choice {
            default: Edition::Edition2021.as_str(),
            variants: Edition::VARIANTS,
        },
        stable: true,
        doc: "Language edition of the formatted sources",
    },
    OptionSpec {
        name: "emit_mode",
        kind: OptionKind::Choice {
            default: EmitMode::Files.as_str(),
            variants: EmitMode::VARIANTS,
        },
        stable: true,
        doc: "What to emit for each input",
    },
    OptionSpec {
        name: "color",
        kind: OptionKind::Choice {
            default: Color::Auto.as_str(),
            variants: Color::VARIANTS,
        },
        stable: true,
        doc: "Use colored report output",
    },
    OptionSpec {
        name: "verbosity",
        kind: OptionKind::Choice {
            default: Verbosity::Normal.as_str(),
            variants: Verbosity::VARIANTS,
        },
        stable: true,
        doc: "How much progress is reported",
    },
    OptionSpec {
        name: "required_version",
        kind: OptionKind::Text { default: "" },
        stable: true,
        doc: "Semver requirement on the formatter version",
    },
    OptionSpec {
        name: "unstable_features",
        kind: OptionKind::Bool { default: false },
        stable: true,
        doc: "Enable unstable options and gated syntax",
    },
    OptionSpec {
        name: "blank_lines_upper_bound",
        kind: OptionKind::Integer {
            default: 1,
            min: 0,
            max: 100,
        },
        stable: false,
        doc: "Maximum number of consecutive blank lines",
    },
    OptionSpec {
        name: "error_on_line_overflow",
        kind: OptionKind::Bool { default: false },
        stable: false,
        doc: "Report lines exceeding max_width as errors",
    },
];

/// Finds an option by exact name.
pub fn lookup(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.name == name)
}

impl OptionSpec {
    /// Built-in default value.
    pub fn default_value(&self) -> ConfigValue {
        match self.kind {
            OptionKind::Bool { default } => ConfigValue::Bool(default),
            OptionKind::Integer { default, .. } => ConfigValue::Integer(default),
            OptionKind::Choice { default, .. } => ConfigValue::Choice(default),
            OptionKind::Text { default } => ConfigValue::Text(default.to_string()),
        }
    }

    /// Human description of accepted values.
    pub fn expected(&self) -> String {
        match self.kind {
            OptionKind::Bool { .. } => "true or false".to_string(),
            OptionKind::Integer { min, max, .. } => format!("an integer in {}..={}", min, max),
            OptionKind::Choice { variants, .. } => format!("one of: {}", variants.join(", ")),
            OptionKind::Text { .. } => "a string".to_string(),
        }
    }

    /// Converts a raw value to this option's kind.
    ///
    /// Strings are accepted for every kind so command-line overrides can be
    /// passed through unparsed.
    pub fn coerce(&self, raw: &Value) -> Result<ConfigValue, ConfigError> {
        let invalid = || ConfigError::invalid_value(self.name, display_raw(raw), self.expected());

        match self.kind {
            OptionKind::Bool { .. } => match raw {
                Value::Bool(b) => Ok(ConfigValue::Bool(*b)),
                Value::String(s) => match s.trim() {
                    "true" => Ok(ConfigValue::Bool(true)),
                    "false" => Ok(ConfigValue::Bool(false)),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
            OptionKind::Integer { min, max, .. } => {
                let n = match raw {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                }
                .ok_or_else(invalid)?;
                if n < min || n > max {
                    return Err(invalid());
                }
                Ok(ConfigValue::Integer(n))
            }
            OptionKind::Choice { variants, .. } => {
                let text = match raw {
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(invalid()),
                };
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(&text))
                    .map(|v| ConfigValue::Choice(*v))
                    .ok_or_else(invalid)
            }
            OptionKind::Text { .. } => match raw {
                Value::String(s) => Ok(ConfigValue::Text(s.clone())),
                _ => Err(invalid()),
            },
        }
    }
}

fn display_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
