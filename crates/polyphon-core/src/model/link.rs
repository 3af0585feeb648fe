//! Provenance-attributed relationship edges between two identifiers.
//!
//! Links point at identifiers, never at record rows, so a link asserted by
//! one source can be followed to records asserted by another. Each link kind
//! has its own table; `define_links!` generates the [`LinkKind`]
//! discriminator, its table metadata and one typed input struct per kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::identifier::{Identifier, IdentifierRecord};
use crate::model::ids::{LinkId, SourceId};
use crate::model::record::RecordKind;

/// Which optional attributes a link kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkAttributes {
    /// Unique on (A, B, source).
    None,
    /// Unique on (A, B, role, source).
    Role,
    /// Unique on (A, B, role, source); rights shares are updated in place.
    RoleAndShares,
}

/// Which endpoint of a link the seed identifier sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The seed is endpoint A; neighbours are B.
    Forward,
    /// The seed is endpoint B; neighbours are A.
    Reverse,
}

/// Performance, mechanical and synchronisation rights shares, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Shares {
    #[serde(default)]
    pub performance: Option<f64>,
    #[serde(default)]
    pub mechanical: Option<f64>,
    #[serde(default)]
    pub synchronization: Option<f64>,
}

impl Shares {
    #[must_use]
    pub const fn new(
        performance: Option<f64>,
        mechanical: Option<f64>,
        synchronization: Option<f64>,
    ) -> Self {
        Self {
            performance,
            mechanical,
            synchronization,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, share) in [
            ("performance", self.performance),
            ("mechanical", self.mechanical),
            ("synchronization", self.synchronization),
        ] {
            if let Some(value) = share {
                if !(0.0..=100.0).contains(&value) {
                    return Err(Error::InvalidData(format!(
                        "{name} share out of range: {value}"
                    )));
                }
            }
        }
        Ok(())
    }
}

macro_rules! link_attributes {
    (none) => {
        LinkAttributes::None
    };
    (role) => {
        LinkAttributes::Role
    };
    (shares) => {
        LinkAttributes::RoleAndShares
    };
}

macro_rules! link_struct {
    ($variant:ident, $name:ident, $a:ident, $b:ident, none) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub $a: Identifier,
            pub $b: Identifier,
        }

        impl From<$name> for Link {
            fn from(link: $name) -> Self {
                Link::new(LinkKind::$variant, link.$a, link.$b)
            }
        }
    };
    ($variant:ident, $name:ident, $a:ident, $b:ident, role) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub $a: Identifier,
            pub $b: Identifier,
            #[serde(default)]
            pub role: String,
        }

        impl From<$name> for Link {
            fn from(link: $name) -> Self {
                Link::new(LinkKind::$variant, link.$a, link.$b).with_role(link.role)
            }
        }
    };
    ($variant:ident, $name:ident, $a:ident, $b:ident, shares) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub $a: Identifier,
            pub $b: Identifier,
            #[serde(default)]
            pub role: String,
            #[serde(default)]
            pub shares: Shares,
        }

        impl From<$name> for Link {
            fn from(link: $name) -> Self {
                Link::new(LinkKind::$variant, link.$a, link.$b)
                    .with_role(link.role)
                    .with_shares(link.shares)
            }
        }
    };
}

macro_rules! define_links {
    (
        $(
            $(#[$doc:meta])*
            $variant:ident($name:ident) => $table:literal {
                $a:ident: $a_kind:ident,
                $b:ident: $b_kind:ident $(,)?
            } $attrs:ident
        ),+ $(,)?
    ) => {
        /// Discriminator over the relationship kinds held by the link store.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum LinkKind {
            $( $(#[$doc])* $variant ),+
        }

        impl LinkKind {
            pub const ALL: &'static [LinkKind] = &[ $( LinkKind::$variant ),+ ];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( LinkKind::$variant => $table ),+
                }
            }

            /// Record kinds of endpoints A and B.
            #[must_use]
            pub const fn endpoints(self) -> (RecordKind, RecordKind) {
                match self {
                    $( LinkKind::$variant => (RecordKind::$a_kind, RecordKind::$b_kind) ),+
                }
            }

            /// Identifier columns of endpoints A and B.
            #[must_use]
            pub const fn endpoint_columns(self) -> (&'static str, &'static str) {
                match self {
                    $(
                        LinkKind::$variant => (
                            concat!(stringify!($a), "_identifier"),
                            concat!(stringify!($b), "_identifier"),
                        )
                    ),+
                }
            }

            #[must_use]
            pub const fn attributes(self) -> LinkAttributes {
                match self {
                    $( LinkKind::$variant => link_attributes!($attrs) ),+
                }
            }
        }

        impl FromStr for LinkKind {
            type Err = Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $( $table => Ok(LinkKind::$variant), )+
                    other => Err(Error::InvalidData(format!("unknown link kind: {other}"))),
                }
            }
        }

        $( link_struct!($variant, $name, $a, $b, $attrs); )+
    };
}

define_links! {
    PerformerRecording(PerformerRecordingLink) => "performer_recording" {
        performer: Performer,
        recording: Recording,
    } role,
    PerformerSong(PerformerSongLink) => "performer_song" {
        performer: Performer,
        song: Song,
    } role,
    PerformerRelease(PerformerReleaseLink) => "performer_release" {
        performer: Performer,
        release: Release,
    } role,
    ContributorRecording(ContributorRecordingLink) => "contributor_recording" {
        contributor: Contributor,
        recording: Recording,
    } role,
    /// Writer share of a work; shares are mutable per (composer, work, role, source).
    ComposerWork(ComposerWorkLink) => "composer_work" {
        composer: Composer,
        work: Work,
    } shares,
    /// Publisher share of a work; shares are mutable per (publisher, work, role, source).
    PublisherWork(PublisherWorkLink) => "publisher_work" {
        publisher: Publisher,
        work: Work,
    } shares,
    RecordLabelRecording(RecordLabelRecordingLink) => "record_label_recording" {
        record_label: RecordLabel,
        recording: Recording,
    } none,
    RecordLabelSong(RecordLabelSongLink) => "record_label_song" {
        record_label: RecordLabel,
        song: Song,
    } none,
    RecordLabelRelease(RecordLabelReleaseLink) => "record_label_release" {
        record_label: RecordLabel,
        release: Release,
    } none,
    SongRecording(SongRecordingLink) => "song_recording" {
        song: Song,
        recording: Recording,
    } none,
    ReleaseRecording(ReleaseRecordingLink) => "release_recording" {
        release: Release,
        recording: Recording,
    } none,
    RecordingWork(RecordingWorkLink) => "recording_work" {
        recording: Recording,
        work: Work,
    } none,
    ReleaseSong(ReleaseSongLink) => "release_song" {
        release: Release,
        song: Song,
    } none,
    OrganisationSeries(OrganisationSeriesLink) => "organisation_series" {
        organisation: Organisation,
        series: Series,
    } none,
    OrganisationSeason(OrganisationSeasonLink) => "organisation_season" {
        organisation: Organisation,
        season: Season,
    } none,
    OrganisationEpisode(OrganisationEpisodeLink) => "organisation_episode" {
        organisation: Organisation,
        episode: Episode,
    } none,
    SeriesSeason(SeriesSeasonLink) => "series_season" {
        series: Series,
        season: Season,
    } none,
    SeasonEpisode(SeasonEpisodeLink) => "season_episode" {
        season: Season,
        episode: Episode,
    } none,
    EpisodeSupplemental(EpisodeSupplementalLink) => "episode_supplemental" {
        episode: Episode,
        supplemental: Supplemental,
    } none,
}

impl LinkKind {
    /// Every (link kind, direction) pair with `kind` on the seed side.
    pub fn touching(kind: RecordKind) -> impl Iterator<Item = (LinkKind, Direction)> {
        LinkKind::ALL.iter().flat_map(move |&link_kind| {
            let (a, b) = link_kind.endpoints();
            let forward = (a == kind).then_some((link_kind, Direction::Forward));
            let reverse = (b == kind).then_some((link_kind, Direction::Reverse));
            forward.into_iter().chain(reverse)
        })
    }

    /// Record kind found on the far side when walking in `direction`.
    #[must_use]
    pub const fn neighbour_kind(self, direction: Direction) -> RecordKind {
        let (a, b) = self.endpoints();
        match direction {
            Direction::Forward => b,
            Direction::Reverse => a,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link of any kind, as handed over by an importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub kind: LinkKind,
    pub a: Identifier,
    pub b: Identifier,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub shares: Option<Shares>,
}

impl Link {
    #[must_use]
    pub const fn new(kind: LinkKind, a: Identifier, b: Identifier) -> Self {
        Self {
            kind,
            a,
            b,
            role: None,
            shares: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_shares(mut self, shares: Shares) -> Self {
        self.shares = Some(shares);
        self
    }

    /// Check identifiers and that the attributes fit the kind.
    pub fn validate(&self) -> Result<()> {
        self.a.validate()?;
        self.b.validate()?;
        match self.kind.attributes() {
            LinkAttributes::None => {
                if self.role.is_some() {
                    return Err(Error::InvalidData(format!(
                        "{} links carry no role",
                        self.kind
                    )));
                }
                if self.shares.is_some() {
                    return Err(Error::InvalidData(format!(
                        "{} links carry no shares",
                        self.kind
                    )));
                }
            }
            LinkAttributes::Role => {
                if self.shares.is_some() {
                    return Err(Error::InvalidData(format!(
                        "{} links carry no shares",
                        self.kind
                    )));
                }
            }
            LinkAttributes::RoleAndShares => {
                if let Some(shares) = &self.shares {
                    shares.validate()?;
                }
            }
        }
        Ok(())
    }

    /// Role as stored: empty when absent on role-bearing kinds.
    #[must_use]
    pub fn stored_role(&self) -> &str {
        self.role.as_deref().unwrap_or_default()
    }
}

/// A stored link row with both endpoints resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: LinkId,
    pub kind: LinkKind,
    pub a: IdentifierRecord,
    pub b: IdentifierRecord,
    pub role: Option<String>,
    pub shares: Option<Shares>,
    pub source: SourceId,
}

impl LinkRecord {
    /// The endpoint on the far side when walking in `direction`.
    #[must_use]
    pub const fn neighbour(&self, direction: Direction) -> &IdentifierRecord {
        match direction {
            Direction::Forward => &self.b,
            Direction::Reverse => &self.a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_metadata() {
        assert_eq!(
            LinkKind::PerformerRecording.endpoints(),
            (RecordKind::Performer, RecordKind::Recording)
        );
        assert_eq!(
            LinkKind::RecordLabelRelease.endpoint_columns(),
            ("record_label_identifier", "release_identifier")
        );
        assert_eq!(
            LinkKind::ComposerWork.attributes(),
            LinkAttributes::RoleAndShares
        );
        assert_eq!(LinkKind::SongRecording.attributes(), LinkAttributes::None);
    }

    #[test]
    fn test_endpoint_kinds_are_distinct() {
        for &kind in LinkKind::ALL {
            let (a, b) = kind.endpoints();
            assert_ne!(a, b, "{kind} links a kind to itself");
        }
    }

    #[test]
    fn test_touching_covers_both_directions() {
        let touching: Vec<_> = LinkKind::touching(RecordKind::Recording).collect();
        assert!(touching.contains(&(LinkKind::PerformerRecording, Direction::Reverse)));
        assert!(touching.contains(&(LinkKind::RecordingWork, Direction::Forward)));
        assert!(touching
            .iter()
            .all(|(kind, direction)| kind.neighbour_kind(*direction) != RecordKind::Recording));
    }

    #[test]
    fn test_typed_link_converts() {
        let link: Link = PerformerRecordingLink {
            performer: Identifier::dpid("P1"),
            recording: Identifier::isrc("CASE01000001"),
            role: "MainArtist".to_string(),
        }
        .into();
        assert_eq!(link.kind, LinkKind::PerformerRecording);
        assert_eq!(link.stored_role(), "MainArtist");
        assert!(link.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_misplaced_attributes() {
        let link = Link::new(
            LinkKind::SongRecording,
            Identifier::grid("G1"),
            Identifier::isrc("R1"),
        )
        .with_role("Main");
        assert!(link.validate().is_err());

        let link = Link::new(
            LinkKind::PerformerSong,
            Identifier::dpid("P1"),
            Identifier::grid("G1"),
        )
        .with_shares(Shares::default());
        assert!(link.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_share() {
        let link: Link = ComposerWorkLink {
            composer: Identifier::ipi("1"),
            work: Identifier::iswc("T1"),
            role: "Composer".to_string(),
            shares: Shares::new(Some(120.0), None, None),
        }
        .into();
        assert!(link.validate().is_err());
    }

    #[test]
    fn test_link_deserializes_from_feed_json() {
        let json = r#"{
            "kind": "composer_work",
            "a": {"type": "ipi", "value": "00014107338"},
            "b": {"type": "iswc", "value": "T-000000001-0"},
            "role": "Composer",
            "shares": {"performance": 50.0}
        }"#;
        let link: Link = serde_json::from_str(json).unwrap();
        assert_eq!(link.kind, LinkKind::ComposerWork);
        assert_eq!(link.shares.unwrap().performance, Some(50.0));
        assert_eq!(link.shares.unwrap().mechanical, None);
    }
}
