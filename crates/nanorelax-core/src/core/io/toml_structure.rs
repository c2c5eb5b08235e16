use crate::core::io::traits::StructureFile;
use crate::core::models::strand::{ParseStrandKindError, StrandKind};
use crate::core::models::structure::Structure;
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Strand '{strand}' has an invalid kind: {source}")]
    InvalidStrandKind {
        strand: String,
        source: ParseStrandKindError,
    },
    #[error("Component '{0}' is defined more than once")]
    DuplicateComponent(String),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructureDocument {
    #[serde(default, rename = "component")]
    components: Vec<ComponentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    translation: Option<[f64; 3]>,
    /// Axis-angle vector: the direction is the axis, the norm the angle in
    /// radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotation: Option<[f64; 3]>,
    #[serde(default, rename = "strand")]
    strands: Vec<StrandRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrandRecord {
    name: String,
    kind: String,
    #[serde(default)]
    circular: bool,
    #[serde(default, rename = "monomer")]
    monomers: Vec<MonomerRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MonomerRecord {
    name: String,
    position: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orientation: Option<[f64; 3]>,
}

/// A TOML description of a coarse-grained structure.
///
/// ```toml
/// [[component]]
/// name = "origami"
/// translation = [10.0, 0.0, 0.0]
///
/// [[component.strand]]
/// name = "scaffold"
/// kind = "dna"
/// circular = true
///
/// [[component.strand.monomer]]
/// name = "A"
/// position = [0.0, 0.0, 0.0]
/// ```
///
/// Component transforms are read into [`Component::transform`] and left
/// unbaked. Writing always emits world-space coordinates with no component
/// transforms.
///
/// [`Component::transform`]: crate::core::models::component::Component::transform
pub struct TomlStructureFile;

impl StructureFile for TomlStructureFile {
    type Error = StructureFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let document: StructureDocument = toml::from_str(&content)?;

        let mut structure = Structure::new();
        for component_record in document.components {
            if structure
                .find_component_by_name(&component_record.name)
                .is_some()
            {
                return Err(StructureFileError::DuplicateComponent(component_record.name));
            }
            let component_id = structure.add_component(&component_record.name);
            let translation = component_record.translation.map(Vector3::from).unwrap_or_else(Vector3::zeros);
            let rotation = component_record.rotation.map(Vector3::from).unwrap_or_else(Vector3::zeros);
            if let Some(component) = structure.component_mut(component_id) {
                component.transform = Isometry3::new(translation, rotation);
            }

            for strand_record in component_record.strands {
                let kind: StrandKind = strand_record.kind.parse().map_err(|source| {
                    StructureFileError::InvalidStrandKind {
                        strand: strand_record.name.clone(),
                        source,
                    }
                })?;
                let strand_id = structure
                    .add_strand(component_id, &strand_record.name, kind, strand_record.circular)
                    .ok_or_else(|| {
                        StructureFileError::Inconsistency(format!(
                            "Component '{}' vanished while adding strand '{}'",
                            component_record.name, strand_record.name
                        ))
                    })?;

                for monomer_record in strand_record.monomers {
                    let monomer_id = structure
                        .add_monomer(strand_id, &monomer_record.name, Point3::from(monomer_record.position))
                        .ok_or_else(|| {
                            StructureFileError::Inconsistency(format!(
                                "Strand '{}' vanished while adding monomer '{}'",
                                strand_record.name, monomer_record.name
                            ))
                        })?;
                    if let (Some(axis_angle), Some(monomer)) =
                        (monomer_record.orientation, structure.monomer_mut(monomer_id))
                    {
                        monomer.orientation = UnitQuaternion::from_scaled_axis(Vector3::from(axis_angle));
                    }
                }
            }
        }
        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut document = StructureDocument::default();
        for (_, component) in structure.components_iter() {
            let transform = component.transform;
            let strands = component
                .strands()
                .iter()
                .filter_map(|&strand_id| structure.strand(strand_id))
                .map(|strand| StrandRecord {
                    name: strand.name.clone(),
                    kind: strand.kind.to_string().to_lowercase(),
                    circular: strand.circular,
                    monomers: strand
                        .monomers()
                        .iter()
                        .filter_map(|&monomer_id| structure.monomer(monomer_id))
                        .map(|monomer| {
                            let position = transform * monomer.position;
                            let orientation = transform.rotation * monomer.orientation;
                            MonomerRecord {
                                name: monomer.name.clone(),
                                position: [position.x, position.y, position.z],
                                orientation: (orientation != UnitQuaternion::identity()).then(|| {
                                    let v = orientation.scaled_axis();
                                    [v.x, v.y, v.z]
                                }),
                            }
                        })
                        .collect(),
                })
                .collect();
            document.components.push(ComponentRecord {
                name: component.name.clone(),
                translation: None,
                rotation: None,
                strands,
            });
        }

        let content = toml::to_string(&document)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::monomer::MonomerKind;
    use std::io::Cursor;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[[component]]
name = "origami"
translation = [10.0, 0.0, 0.0]

[[component.strand]]
name = "scaffold"
kind = "dna"
circular = true

[[component.strand.monomer]]
name = "A"
position = [0.0, 0.0, 0.0]

[[component.strand.monomer]]
name = "T"
position = [1.0, 0.0, 0.0]

[[component]]
name = "binder"

[[component.strand]]
name = "P"
kind = "protein"

[[component.strand.monomer]]
name = "ALA"
position = [0.0, 5.0, 0.0]
orientation = [0.0, 0.0, 1.5707963267948966]
"#;

    fn read_sample() -> Structure {
        TomlStructureFile::read_from(&mut Cursor::new(SAMPLE)).unwrap()
    }

    #[test]
    fn read_builds_components_strands_and_monomers() {
        let structure = read_sample();
        assert_eq!(structure.component_ids().len(), 2);
        assert_eq!(structure.monomer_count(), 3);

        let origami = structure.find_component_by_name("origami").unwrap();
        let component = structure.component(origami).unwrap();
        assert!((component.transform.translation.vector - Vector3::new(10.0, 0.0, 0.0)).norm() < 1e-9);

        let scaffold = structure.strand(component.strands()[0]).unwrap();
        assert!(scaffold.circular);
        assert_eq!(scaffold.kind, StrandKind::Dna);
        let second = structure.monomer(scaffold.monomers()[1]).unwrap();
        assert_eq!(second.sequence_index, 1);
        assert_eq!(second.kind, MonomerKind::Nucleotide);
        assert_eq!(second.position, Point3::new(1.0, 0.0, 0.0));

        let binder = structure.find_component_by_name("binder").unwrap();
        let alanine = structure.monomers_of_component(binder)[0];
        let alanine = structure.monomer(alanine).unwrap();
        assert!((alanine.orientation.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn write_emits_world_coordinates_without_transforms() {
        let structure = read_sample();
        let mut buffer = Vec::new();
        TomlStructureFile::write_to(&structure, &mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert!(!written.contains("translation"));

        let reread = TomlStructureFile::read_from(&mut Cursor::new(written)).unwrap();
        let origami = reread.find_component_by_name("origami").unwrap();
        assert_eq!(reread.component(origami).unwrap().transform, Isometry3::identity());
        let first = reread.monomers_of_component(origami)[0];
        assert!((reread.monomer(first).unwrap().position - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn path_helpers_write_and_read_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("structure.toml");
        TomlStructureFile::write_to_path(&read_sample(), &path).unwrap();
        let structure = TomlStructureFile::read_from_path(&path).unwrap();
        assert_eq!(structure.monomer_count(), 3);
    }

    #[test]
    fn read_rejects_unknown_strand_kind() {
        let input = "[[component]]\nname = \"c\"\n[[component.strand]]\nname = \"s\"\nkind = \"lipid\"\n";
        let result = TomlStructureFile::read_from(&mut Cursor::new(input));
        assert!(matches!(result, Err(StructureFileError::InvalidStrandKind { .. })));
    }

    #[test]
    fn read_rejects_duplicate_component_names() {
        let input = "[[component]]\nname = \"c\"\n[[component]]\nname = \"c\"\n";
        let result = TomlStructureFile::read_from(&mut Cursor::new(input));
        assert!(matches!(result, Err(StructureFileError::DuplicateComponent(name)) if name == "c"));
    }

    #[test]
    fn read_rejects_malformed_toml() {
        let result = TomlStructureFile::read_from(&mut Cursor::new("[[component]\nname ="));
        assert!(matches!(result, Err(StructureFileError::Parse(_))));
    }

    #[test]
    fn read_from_path_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = TomlStructureFile::read_from_path(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(StructureFileError::Io(_))));
    }
}
