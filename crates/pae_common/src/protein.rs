//! Protein records and the protein catalog.
//!
//! The catalog is static reference data. The built-in set ships as JSON inside
//! the binary; a deployment may point `catalog.proteins_path` at its own file.

use crate::error::{PaeError, PaeResult};
use crate::grid::ErrorMatrix;
use crate::settings::{Audience, MapType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const BUILTIN_PROTEINS: &str = include_str!("../data/proteins.json");

/// Text written for each audience level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceText {
    pub elementary: String,
    pub high_school: String,
    pub undergraduate: String,
}

impl AudienceText {
    pub fn for_audience(&self, audience: Audience) -> &str {
        match audience {
            Audience::Elementary => &self.elementary,
            Audience::HighSchool => &self.high_school,
            Audience::Undergraduate => &self.undergraduate,
        }
    }
}

/// PAE maps for one protein; `full` is always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaeMaps {
    pub full: ErrorMatrix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<ErrorMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<ErrorMatrix>,
}

/// Annotated structural domain (residue block indices are inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinDomain {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protein {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
    pub description: AudienceText,
    pub function: AudienceText,
    #[serde(default)]
    pub disease: Option<AudienceText>,
    pub alphafold_link: String,
    /// Reference article URLs
    #[serde(default)]
    pub literature: Vec<String>,
    #[serde(default)]
    pub pdb_id: Option<String>,
    pub confidence_guide: String,
    pub pae_data: PaeMaps,
    #[serde(default)]
    pub domains: Vec<ProteinDomain>,
}

impl Protein {
    /// Domain annotation covering a residue block, if any
    pub fn domain_at(&self, index: usize) -> Option<&ProteinDomain> {
        self.domains.iter().find(|d| d.start <= index && index <= d.end)
    }
}

/// Matrix for the requested map type, falling back to `full` when the protein
/// has no such variant.
pub fn select_matrix(protein: &Protein, map_type: MapType) -> &ErrorMatrix {
    let maps = &protein.pae_data;
    match map_type {
        MapType::Full => &maps.full,
        MapType::Domain => maps.domain.as_ref().unwrap_or(&maps.full),
        MapType::Interface => maps.interface.as_ref().unwrap_or(&maps.full),
    }
}

/// Map types actually stored for a protein
pub fn available_map_types(protein: &Protein) -> Vec<MapType> {
    let mut types = vec![MapType::Full];
    if protein.pae_data.domain.is_some() {
        types.push(MapType::Domain);
    }
    if protein.pae_data.interface.is_some() {
        types.push(MapType::Interface);
    }
    types
}

/// Short listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinSummary {
    pub id: String,
    pub name: String,
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProteinCatalog {
    proteins: Vec<Protein>,
}

impl ProteinCatalog {
    /// Build a catalog, failing on an empty list or duplicate ids
    pub fn new(proteins: Vec<Protein>) -> PaeResult<Self> {
        if proteins.is_empty() {
            return Err(PaeError::Config("protein catalog is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for p in &proteins {
            if p.id.trim().is_empty() {
                return Err(PaeError::Config(format!("protein '{}' has an empty id", p.name)));
            }
            if !seen.insert(p.id.as_str()) {
                return Err(PaeError::Config(format!("duplicate protein id '{}'", p.id)));
            }
        }
        Ok(Self { proteins })
    }

    /// Catalog bundled with the crate
    pub fn builtin() -> PaeResult<Self> {
        Self::from_json(BUILTIN_PROTEINS)
    }

    pub fn from_json(json: &str) -> PaeResult<Self> {
        let proteins: Vec<Protein> = serde_json::from_str(json)
            .map_err(|e| PaeError::Config(format!("invalid protein catalog: {}", e)))?;
        Self::new(proteins)
    }

    pub fn from_path(path: &Path) -> PaeResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn get(&self, id: &str) -> Option<&Protein> {
        self.proteins.iter().find(|p| p.id == id)
    }

    /// Protein by id, or the first protein for unknown ids
    pub fn get_or_first(&self, id: &str) -> &Protein {
        self.get(id).unwrap_or(&self.proteins[0])
    }

    pub fn first(&self) -> &Protein {
        &self.proteins[0]
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Protein> {
        self.proteins.iter()
    }

    pub fn summaries(&self) -> Vec<ProteinSummary> {
        self.proteins
            .iter()
            .map(|p| ProteinSummary {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> AudienceText {
        AudienceText {
            elementary: s.to_string(),
            high_school: s.to_string(),
            undergraduate: s.to_string(),
        }
    }

    fn protein(id: &str, domain: Option<ErrorMatrix>) -> Protein {
        Protein {
            id: id.to_string(),
            name: format!("Protein {}", id),
            species: None,
            description: text("desc"),
            function: text("func"),
            disease: None,
            alphafold_link: "https://alphafold.ebi.ac.uk/entry/X".to_string(),
            literature: Vec::new(),
            pdb_id: None,
            confidence_guide: "guide".to_string(),
            pae_data: PaeMaps {
                full: ErrorMatrix::new(vec![vec![1.0, 20.0], vec![20.0, 1.0]]).unwrap(),
                domain,
                interface: None,
            },
            domains: vec![ProteinDomain {
                name: "Core".to_string(),
                start: 0,
                end: 0,
                description: "core".to_string(),
            }],
        }
    }

    #[test]
    fn test_select_matrix_falls_back_to_full() {
        let p = protein("a", None);
        assert_eq!(select_matrix(&p, MapType::Domain), &p.pae_data.full);
        assert_eq!(select_matrix(&p, MapType::Interface), &p.pae_data.full);
    }

    #[test]
    fn test_select_matrix_uses_variant() {
        let domain = ErrorMatrix::new(vec![vec![9.0]]).unwrap();
        let p = protein("a", Some(domain.clone()));
        assert_eq!(select_matrix(&p, MapType::Domain), &domain);
        assert_eq!(available_map_types(&p), vec![MapType::Full, MapType::Domain]);
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_empty() {
        assert!(matches!(ProteinCatalog::new(vec![]), Err(PaeError::Config(_))));
        let dup = ProteinCatalog::new(vec![protein("a", None), protein("a", None)]);
        assert!(matches!(dup, Err(PaeError::Config(_))));
    }

    #[test]
    fn test_get_or_first() {
        let catalog =
            ProteinCatalog::new(vec![protein("a", None), protein("b", None)]).unwrap();
        assert_eq!(catalog.get_or_first("b").id, "b");
        assert_eq!(catalog.get_or_first("zzz").id, "a");
        assert!(catalog.get("zzz").is_none());
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = ProteinCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 6);
        let hemoglobin = catalog.get("p1").unwrap();
        assert_eq!(hemoglobin.name, "Hemoglobin");
        assert_eq!(hemoglobin.pae_data.full.rows(), 7);
        assert_eq!(hemoglobin.domain_at(4).unwrap().name, "Beta subunit");
        assert_eq!(
            hemoglobin.literature,
            vec![
                "https://pubmed.ncbi.nlm.nih.gov/12788409/",
                "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC3543206/",
            ]
        );
        assert!(catalog.iter().all(|p| !p.literature.is_empty()));
        let elementary = hemoglobin.description.for_audience(Audience::Elementary);
        assert!(elementary.starts_with("Hemoglobin is a protein in your red blood cells"));
    }

    #[test]
    fn test_literature_defaults_to_empty() {
        let mut value = serde_json::to_value(protein("a", None)).unwrap();
        value.as_object_mut().unwrap().remove("literature");
        let parsed: Protein = serde_json::from_value(value).unwrap();
        assert!(parsed.literature.is_empty());
    }

    #[test]
    fn test_summaries_preserve_order() {
        let catalog = ProteinCatalog::builtin().unwrap();
        let ids: Vec<String> = catalog.summaries().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5", "p6"]);
    }
}
