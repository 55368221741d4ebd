use crate::error::{ProjectError, Result};
use crate::model::{Hru, ObjectCount, RoutingUnit};
use crate::parse;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Loaded connectivity model for one SWAT+ project directory
#[derive(Debug)]
pub struct Connectivity {
    pub project: PathBuf,
    pub object_count: Option<ObjectCount>,
    pub hrus: BTreeMap<u32, Hru>,
    pub routing_units: BTreeMap<u32, RoutingUnit>,
}

/// Downstream picture for a single burned HRU
#[derive(Debug, Clone, Serialize)]
pub struct BurnImpact {
    pub hru_id: u32,
    pub routing_unit: Option<u32>,
    /// Other HRUs in the same routing unit
    pub affected_hrus: Vec<u32>,
    pub downstream_channels: Vec<u32>,
    pub downstream_aquifers: Vec<u32>,
}

impl Connectivity {
    /// Read the configuration files and wire HRUs to their downstream
    /// channel/aquifer connections.
    pub fn load(project: &Path) -> Result<Self> {
        if !project.exists() {
            return Err(ProjectError::MissingProject(project.to_path_buf()));
        }

        log::info!("Reading SWAT+ configuration files from {}", project.display());
        let object_count = parse::read_object_count(project);
        let mut hrus = parse::read_hrus(project);
        let routing_units = parse::read_routing_units(project);

        // routing unit outlets propagate to their member HRUs
        for unit in routing_units.values() {
            for outlet in &unit.outlets {
                for hru_id in &unit.elements {
                    let Some(hru) = hrus.get_mut(hru_id) else {
                        continue;
                    };
                    match outlet.object_type.as_str() {
                        "sdc" => hru.downstream_channels.push(outlet.object_id),
                        "aqu" => hru.downstream_aquifers.push(outlet.object_id),
                        _ => {}
                    }
                }
            }
        }

        Ok(Self {
            project: project.to_path_buf(),
            object_count,
            hrus,
            routing_units,
        })
    }

    /// Routing unit an HRU belongs to, if any
    pub fn routing_unit_of(&self, hru_id: u32) -> Option<&RoutingUnit> {
        self.routing_units
            .values()
            .find(|unit| unit.elements.contains(&hru_id))
    }

    /// Lowest-numbered HRU, the default query target
    pub fn first_hru(&self) -> Option<u32> {
        self.hrus.keys().next().copied()
    }

    pub fn burn_impact(&self, hru_id: u32) -> Result<BurnImpact> {
        let hru = self
            .hrus
            .get(&hru_id)
            .ok_or(ProjectError::UnknownHru(hru_id))?;

        let routing_unit = self.routing_unit_of(hru_id);
        let affected_hrus = routing_unit
            .map(|unit| {
                unit.elements
                    .iter()
                    .filter(|id| **id != hru_id && self.hrus.contains_key(id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        Ok(BurnImpact {
            hru_id,
            routing_unit: routing_unit.map(|unit| unit.id),
            affected_hrus,
            downstream_channels: hru.downstream_channels.clone(),
            downstream_aquifers: hru.downstream_aquifers.clone(),
        })
    }

    /// Model summary in the connectivity report layout
    pub fn summary_report(&self) -> String {
        let mut out = String::new();
        out.push_str("=== SWAT+ MODEL CONNECTIVITY SUMMARY ===\n");

        if let Some(counts) = &self.object_count {
            writeln!(out, "Project: {}", counts.name).unwrap();
            writeln!(out, "Total Objects: {}", counts.total_objects).unwrap();
            writeln!(out, "HRUs: {}", counts.hru_count).unwrap();
            writeln!(out, "Routing Units: {}", counts.routing_unit_count).unwrap();
        }

        writeln!(out, "\nLoaded {} HRUs", self.hrus.len()).unwrap();
        writeln!(out, "Loaded {} Routing Units", self.routing_units.len()).unwrap();

        if !self.hrus.is_empty() {
            let total_area: f64 = self.hrus.values().map(|hru| hru.area_ha).sum();
            writeln!(out, "Total HRU Area: {total_area:.2} ha").unwrap();

            let min_elev = self
                .hrus
                .values()
                .map(|hru| hru.elevation)
                .fold(f64::INFINITY, f64::min);
            let max_elev = self
                .hrus
                .values()
                .map(|hru| hru.elevation)
                .fold(f64::NEG_INFINITY, f64::max);
            writeln!(out, "Elevation Range: {min_elev:.1} - {max_elev:.1} m").unwrap();
        }

        out.push_str("\nRouting Unit Details:\n");
        for unit in self.routing_units.values() {
            writeln!(
                out,
                "  RU {}: {} - {} HRUs -> {} outlets",
                unit.id,
                unit.name,
                unit.elements.len(),
                unit.outlets.len()
            )
            .unwrap();
        }

        out
    }

    /// Burn-impact section in the report layout
    pub fn burn_impact_report(&self, impact: &BurnImpact) -> String {
        let mut out = String::new();
        writeln!(out, "=== BURN IMPACT ANALYSIS FOR HRU {} ===", impact.hru_id).unwrap();

        if let Some(hru) = self.hrus.get(&impact.hru_id) {
            writeln!(out, "Burned HRU: {}", hru.name).unwrap();
            writeln!(out, "Area: {:.2} ha", hru.area_ha).unwrap();
            writeln!(out, "Elevation: {:.1} m", hru.elevation).unwrap();
        }

        if let Some(unit_id) = impact.routing_unit {
            if let Some(unit) = self.routing_units.get(&unit_id) {
                writeln!(out, "Routing Unit: {} ({})", unit_id, unit.name).unwrap();

                if !impact.affected_hrus.is_empty() {
                    out.push_str(
                        "\nHRUs in same routing unit (directly affected by increased runoff):\n",
                    );
                    for hru_id in &impact.affected_hrus {
                        if let Some(hru) = self.hrus.get(hru_id) {
                            writeln!(
                                out,
                                "  HRU {}: {} ({:.2} ha)",
                                hru_id, hru.name, hru.area_ha
                            )
                            .unwrap();
                        }
                    }
                }

                if !unit.outlets.is_empty() {
                    out.push_str("\nDownstream connections:\n");
                    for outlet in &unit.outlets {
                        writeln!(
                            out,
                            "  -> {} {} (flow type: {})",
                            outlet.object_type.to_uppercase(),
                            outlet.object_id,
                            outlet.hyd_type
                        )
                        .unwrap();
                    }
                }
            }
        }

        if !impact.downstream_channels.is_empty() {
            writeln!(
                out,
                "\nDirect channel connections: {:?}",
                impact.downstream_channels
            )
            .unwrap();
        }
        if !impact.downstream_aquifers.is_empty() {
            writeln!(
                out,
                "Direct aquifer connections: {:?}",
                impact.downstream_aquifers
            )
            .unwrap();
        }

        out
    }
}
