//! Detector geometries that turn a probe ray into per-material path lengths.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{GeometryError, PersistenceError};
use crate::path_length::PathLengthList;

/// Source of target materials and path lengths for event generation.
pub trait GeometryAnalyzer {
    /// PDG codes of every material in the geometry, without duplicates.
    fn target_materials(&self) -> Vec<i32>;

    /// Density-weighted path lengths (g/cm^2) along the ray starting at
    /// `origin` with direction `direction`. The direction need not be
    /// normalised.
    fn path_lengths(
        &self,
        origin: [f64; 3],
        direction: [f64; 3],
    ) -> Result<PathLengthList, GeometryError>;
}

/// One homogeneous layer of a slab geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    /// Material PDG code (ion code for nuclei).
    pub material: i32,
    /// Thickness along z in cm.
    pub thickness: f64,
    /// Density in g/cm^3.
    pub density: f64,
}

/// Stack of slabs along the z axis, infinite in x and y.
///
/// The first slab starts at `z_start` and each following slab starts where
/// the previous one ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabGeometry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub z_start: f64,
    pub slabs: Vec<Slab>,
}

impl SlabGeometry {
    pub fn new(z_start: f64, slabs: Vec<Slab>) -> Result<Self, GeometryError> {
        let geometry = Self {
            name: String::new(),
            z_start,
            slabs,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if self.slabs.is_empty() {
            return Err(GeometryError::Empty);
        }
        for (index, slab) in self.slabs.iter().enumerate() {
            if !(slab.thickness.is_finite() && slab.thickness > 0.0) {
                return Err(GeometryError::InvalidSlab {
                    index,
                    reason: format!("thickness {} must be positive", slab.thickness),
                });
            }
            if !(slab.density.is_finite() && slab.density >= 0.0) {
                return Err(GeometryError::InvalidSlab {
                    index,
                    reason: format!("density {} must be non-negative", slab.density),
                });
            }
        }
        Ok(())
    }

    /// Load a slab geometry from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let geometry: SlabGeometry = serde_json::from_reader(BufReader::new(file)).map_err(
            |source| PersistenceError::Json {
                path: path.to_path_buf(),
                source,
            },
        )?;
        geometry.validate().map_err(|e| PersistenceError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::info!(
            "Loaded slab geometry '{}' with {} slabs from {}",
            geometry.name,
            geometry.slabs.len(),
            path.display()
        );
        Ok(geometry)
    }

    /// z extent of every slab, in stacking order.
    pub fn boundaries(&self) -> Vec<(f64, f64)> {
        let mut z = self.z_start;
        self.slabs
            .iter()
            .map(|slab| {
                let lo = z;
                z += slab.thickness;
                (lo, z)
            })
            .collect()
    }

    /// Total thickness in cm.
    pub fn thickness(&self) -> f64 {
        self.slabs.iter().map(|s| s.thickness).sum()
    }
}

impl GeometryAnalyzer for SlabGeometry {
    fn target_materials(&self) -> Vec<i32> {
        let mut materials: Vec<i32> = Vec::new();
        for slab in &self.slabs {
            if !materials.contains(&slab.material) {
                materials.push(slab.material);
            }
        }
        materials
    }

    fn path_lengths(
        &self,
        origin: [f64; 3],
        direction: [f64; 3],
    ) -> Result<PathLengthList, GeometryError> {
        let norm = direction.iter().map(|d| d * d).sum::<f64>().sqrt();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(GeometryError::InvalidDirection);
        }
        let mut list = PathLengthList::from_pdg_codes(self.target_materials());
        let uz = direction[2] / norm;

        for (index, (slab, (lo, hi))) in self.slabs.iter().zip(self.boundaries()).enumerate() {
            // distance travelled inside [lo, hi] for t >= 0
            let length = if uz.abs() < 1e-12 {
                if origin[2] >= lo && origin[2] < hi {
                    f64::INFINITY
                } else {
                    0.0
                }
            } else {
                let t1 = (lo - origin[2]) / uz;
                let t2 = (hi - origin[2]) / uz;
                let (t_in, t_out) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
                (t_out.max(0.0) - t_in.max(0.0)).max(0.0)
            };
            if length.is_infinite() {
                return Err(GeometryError::InvalidDirection);
            }
            if length > 0.0 {
                list.add_path_length(slab.material, length * slab.density)
                    .map_err(|e| GeometryError::InvalidSlab {
                        index,
                        reason: e.to_string(),
                    })?;
            }
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FE56: i32 = 1000260560;
    const O16: i32 = 1000080160;

    fn detector() -> SlabGeometry {
        SlabGeometry::new(
            0.0,
            vec![
                Slab { material: FE56, thickness: 2.0, density: 7.87 },
                Slab { material: O16, thickness: 10.0, density: 1.0 },
                Slab { material: FE56, thickness: 2.0, density: 7.87 },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_target_materials_unique_in_order() {
        assert_eq!(detector().target_materials(), vec![FE56, O16]);
        assert_eq!(detector().thickness(), 14.0);
    }

    #[test]
    fn test_axial_ray_crosses_everything() {
        let pl = detector()
            .path_lengths([0.0, 0.0, -5.0], [0.0, 0.0, 1.0])
            .unwrap();
        assert!((pl.path_length(FE56) - 4.0 * 7.87).abs() < 1e-9);
        assert!((pl.path_length(O16) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_starting_inside() {
        let pl = detector()
            .path_lengths([0.0, 0.0, 7.0], [0.0, 0.0, -2.0])
            .unwrap();
        // 5 cm of oxygen back to z = 2, then the first iron slab
        assert!((pl.path_length(O16) - 5.0).abs() < 1e-9);
        assert!((pl.path_length(FE56) - 2.0 * 7.87).abs() < 1e-9);
    }

    #[test]
    fn test_oblique_ray_is_longer() {
        let pl = detector()
            .path_lengths([0.0, 0.0, -1.0], [1.0, 0.0, 1.0])
            .unwrap();
        let expected = 10.0 * std::f64::consts::SQRT_2;
        assert!((pl.path_length(O16) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ray_leaving_geometry_is_all_zero() {
        let pl = detector()
            .path_lengths([0.0, 0.0, 20.0], [0.0, 0.0, 1.0])
            .unwrap();
        assert!(pl.are_all_zero());
        assert_eq!(pl.len(), 2);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(SlabGeometry::new(0.0, vec![]), Err(GeometryError::Empty));
        assert!(SlabGeometry::new(0.0, vec![Slab { material: O16, thickness: -1.0, density: 1.0 }])
            .is_err());
        assert_eq!(
            detector().path_lengths([0.0; 3], [0.0; 3]),
            Err(GeometryError::InvalidDirection)
        );
        // parallel to a slab inside the stack
        assert_eq!(
            detector().path_lengths([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            Err(GeometryError::InvalidDirection)
        );
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slabs.json");
        std::fs::write(
            &path,
            r#"{"name": "toy", "slabs": [{"material": 1000260560, "thickness": 1.5, "density": 7.87}]}"#,
        )
        .unwrap();
        let geometry = SlabGeometry::from_json_file(&path).unwrap();
        assert_eq!(geometry.name, "toy");
        assert_eq!(geometry.z_start, 0.0);
        assert_eq!(geometry.target_materials(), vec![FE56]);

        std::fs::write(&path, r#"{"slabs": []}"#).unwrap();
        assert!(matches!(
            SlabGeometry::from_json_file(&path),
            Err(PersistenceError::Invalid { .. })
        ));
    }
}
