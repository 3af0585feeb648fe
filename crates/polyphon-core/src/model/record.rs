//! Canonical entity facts, one variant per entity kind.
//!
//! Every kind is described once in the `define_records!` invocation below,
//! which generates the natural-key struct, its [`Fact`] implementation, the
//! [`RecordKind`] discriminator and the [`Record`] union. The declared column
//! order is the natural-key order used by the storage layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::ids::{RecordId, SourceId};

mod private {
    pub trait Sealed {}
}

/// A natural-key fact of exactly one entity kind.
///
/// Sealed: the set of kinds is closed and mirrored by the schema.
pub trait Fact: private::Sealed + Clone + Sized {
    const KIND: RecordKind;

    /// Natural-key values in column order.
    fn values(&self) -> Vec<&str>;

    /// Rebuild from natural-key values in column order.
    fn from_values(values: Vec<String>) -> Option<Self>;
}

macro_rules! define_records {
    (
        $(
            $(#[$doc:meta])*
            $kind:ident => $table:literal {
                $( $(#[$fmeta:meta])* $field:ident : $col:literal ),+ $(,)?
            }
        ),+ $(,)?
    ) => {
        /// Discriminator over the entity kinds held by the record store.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum RecordKind {
            $( $kind ),+
        }

        impl RecordKind {
            /// Every kind, in schema order.
            pub const ALL: &'static [RecordKind] = &[ $( RecordKind::$kind ),+ ];

            /// Table name, also used as the `record_type` discriminator.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( RecordKind::$kind => $table ),+
                }
            }

            /// Natural-key columns, in order.
            #[must_use]
            pub const fn columns(self) -> &'static [&'static str] {
                match self {
                    $( RecordKind::$kind => &[ $( $col ),+ ] ),+
                }
            }
        }

        impl FromStr for RecordKind {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $table => Ok(RecordKind::$kind), )+
                    other => Err(Error::InvalidData(format!("unknown record kind: {other}"))),
                }
            }
        }

        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
            pub struct $kind {
                $( $(#[$fmeta])* pub $field: String ),+
            }

            impl $kind {
                #[must_use]
                pub fn new($( $field: impl Into<String> ),+) -> Self {
                    Self { $( $field: $field.into() ),+ }
                }
            }

            impl private::Sealed for $kind {}

            impl Fact for $kind {
                const KIND: RecordKind = RecordKind::$kind;

                fn values(&self) -> Vec<&str> {
                    vec![ $( self.$field.as_str() ),+ ]
                }

                fn from_values(values: Vec<String>) -> Option<Self> {
                    let mut values = values.into_iter();
                    Some(Self { $( $field: values.next()? ),+ })
                }
            }

            impl From<$kind> for Record {
                fn from(fact: $kind) -> Self {
                    Record::$kind(fact)
                }
            }
        )+

        /// A fact of any kind, tagged with its kind.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(tag = "kind", rename_all = "snake_case")]
        pub enum Record {
            $( $kind($kind) ),+
        }

        impl Record {
            #[must_use]
            pub const fn kind(&self) -> RecordKind {
                match self {
                    $( Record::$kind(_) => RecordKind::$kind ),+
                }
            }

            /// Natural-key values in column order.
            #[must_use]
            pub fn values(&self) -> Vec<&str> {
                match self {
                    $( Record::$kind(fact) => fact.values() ),+
                }
            }

            /// Rebuild a fact of `kind` from natural-key values in column order.
            #[must_use]
            pub fn from_values(kind: RecordKind, values: Vec<String>) -> Option<Self> {
                match kind {
                    $( RecordKind::$kind => $kind::from_values(values).map(Record::$kind) ),+
                }
            }
        }
    };
}

define_records! {
    /// A performing artist or group.
    Performer => "performer" { name: "name" },

    /// A non-performing contributor to a recording (producer, engineer, ...).
    Contributor => "contributor" { name: "name" },

    /// A writer of musical works.
    Composer => "composer" { first_name: "first_name", last_name: "last_name" },

    RecordLabel => "record_label" { name: "name" },

    Publisher => "publisher" { name: "name" },

    /// A sound recording, usually identified by ISRC.
    Recording => "recording" { title: "title", duration: "duration" },

    /// A musical work (composition), usually identified by ISWC.
    Work => "work" { title: "title" },

    /// A release track, usually identified by GRid.
    Song => "song" { title: "title", duration: "duration" },

    /// A product, usually identified by UPC or EAN.
    Release => "release" {
        #[serde(rename = "type")]
        release_type: "type",
        title: "title",
        date: "date",
    },

    Organisation => "organisation" { name: "name" },

    /// An audiovisual series.
    Series => "series" { name: "name" },

    Season => "season" { name: "name" },

    Episode => "episode" { name: "name" },

    /// Supplemental audiovisual material (trailers, extras).
    Supplemental => "supplemental" { name: "name" },
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record row: the fact plus the source that asserted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow<T> {
    pub id: RecordId,
    pub fact: T,
    pub source: SourceId,
}
