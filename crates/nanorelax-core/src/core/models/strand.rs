use super::ids::{ComponentId, MonomerId};
use super::monomer::{MonomerKind, Terminus};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrandKind {
    Dna,
    Rna,
    Protein,
}

impl StrandKind {
    pub fn monomer_kind(self) -> MonomerKind {
        match self {
            StrandKind::Dna | StrandKind::Rna => MonomerKind::Nucleotide,
            StrandKind::Protein => MonomerKind::AminoAcid,
        }
    }

    pub fn is_nucleic(self) -> bool {
        matches!(self, StrandKind::Dna | StrandKind::Rna)
    }
}

#[derive(Debug, Error)]
#[error("Invalid strand kind string: '{0}'")]
pub struct ParseStrandKindError(pub String);

impl FromStr for StrandKind {
    type Err = ParseStrandKindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dna" => Ok(StrandKind::Dna),
            "rna" => Ok(StrandKind::Rna),
            "protein" => Ok(StrandKind::Protein),
            _ => Err(ParseStrandKindError(s.to_string())),
        }
    }
}

impl fmt::Display for StrandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StrandKind::Dna => "DNA",
                StrandKind::Rna => "RNA",
                StrandKind::Protein => "Protein",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strand {
    pub name: String,                      // Strand label (e.g., "scaffold", "A")
    pub kind: StrandKind,                  // Polymer type of the strand
    pub circular: bool,                    // Whether the 3' end bonds back to the 5' end
    pub component_id: ComponentId,         // ID of the owning component
    pub(crate) monomers: Vec<MonomerId>,   // Monomers in 5' -> 3' (or N -> C) order
}

impl Strand {
    pub(crate) fn new(name: &str, kind: StrandKind, circular: bool, component_id: ComponentId) -> Self {
        Self {
            name: name.to_string(),
            kind,
            circular,
            component_id,
            monomers: Vec::new(),
        }
    }

    pub fn monomers(&self) -> &[MonomerId] {
        &self.monomers
    }

    pub fn len(&self) -> usize {
        self.monomers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monomers.is_empty()
    }

    /// Returns which end of the strand a sequence index sits on, if any.
    ///
    /// A single-monomer strand reports its only monomer as the 5' end.
    pub fn terminus_at(&self, sequence_index: usize) -> Option<Terminus> {
        if self.monomers.is_empty() {
            None
        } else if sequence_index == 0 {
            Some(Terminus::FivePrime)
        } else if sequence_index + 1 == self.monomers.len() {
            Some(Terminus::ThreePrime)
        } else {
            None
        }
    }
}
