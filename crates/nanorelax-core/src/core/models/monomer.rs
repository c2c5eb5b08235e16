use super::ids::StrandId;
use nalgebra::{Isometry3, Point3, UnitQuaternion};
use std::str::FromStr;

/// Classifies a coarse-grained monomer by the kind of polymer it belongs to.
///
/// Nucleotides are the only monomers that take part in backbone joint
/// synthesis between clusters; amino acids are carried along as passive
/// members of whichever cluster claims them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MonomerKind {
    /// A DNA or RNA nucleotide.
    #[default]
    Nucleotide,
    /// A protein residue.
    AminoAcid,
}

impl MonomerKind {
    pub fn is_nucleotide(self) -> bool {
        matches!(self, MonomerKind::Nucleotide)
    }
}

/// Marks a monomer that sits at one end of its strand.
///
/// For nucleic-acid strands the first monomer is the 5' terminus and the last
/// monomer is the 3' terminus. Protein strands reuse the same markers for the
/// N- and C-terminus respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminus {
    FivePrime,
    ThreePrime,
}

/// A single coarse-grained structural element (one nucleotide or residue).
///
/// Monomers carry a world-space position and a local frame orientation. Both
/// are updated in place whenever a rigid transform is applied, which is how
/// the dynamics engine moves the structure it is relaxing.
#[derive(Debug, Clone, PartialEq)]
pub struct Monomer {
    /// The residue or base name (e.g., "A", "DT", "ALA").
    pub name: String,
    /// The polymer kind of this monomer.
    pub kind: MonomerKind,
    /// The ID of the parent strand.
    pub strand_id: StrandId,
    /// Zero-based position of this monomer along its strand.
    pub sequence_index: usize,
    /// The 3D coordinates of the monomer's reference point in Angstroms.
    pub position: Point3<f64>,
    /// Orientation of the monomer's local frame.
    pub orientation: UnitQuaternion<f64>,
}

impl Monomer {
    /// Creates a new `Monomer` with an identity orientation.
    ///
    /// # Arguments
    ///
    /// * `name` - The residue or base name.
    /// * `kind` - Whether the monomer is a nucleotide or an amino acid.
    /// * `strand_id` - The ID of the strand this monomer belongs to.
    /// * `position` - The 3D coordinates of the monomer.
    pub fn new(name: &str, kind: MonomerKind, strand_id: StrandId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            strand_id,
            sequence_index: 0,
            position,
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Applies a rigid transform to the monomer in place.
    ///
    /// The position is mapped through the full isometry while the orientation
    /// only picks up its rotational part.
    pub fn apply_transform(&mut self, transform: &Isometry3<f64>) {
        self.position = transform * self.position;
        self.orientation = transform.rotation * self.orientation;
    }
}

impl FromStr for MonomerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nucleotide" | "dna" | "rna" | "nucleic" => Ok(MonomerKind::Nucleotide),
            "aminoacid" | "amino-acid" | "amino_acid" | "protein" | "residue" => {
                Ok(MonomerKind::AminoAcid)
            }
            _ => Err(()),
        }
    }
}
