use crate::model::{Hru, ObjectCount, Outlet, RoutingUnit};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Data lines of a SWAT+ configuration file: everything past the 2-line
/// title + header, blanks dropped.
fn data_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .skip(2)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Read `object.cnt`; a missing file is a warning, not an error.
pub fn read_object_count(project: &Path) -> Option<ObjectCount> {
    let path = project.join("object.cnt");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => {
            log::warn!("Warning: {} not found", path.display());
            return None;
        }
    };

    for line in data_lines(&content) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        let parsed = (
            parts[2].parse::<u32>(),
            parts[3].parse::<u32>(),
            parts[5].parse::<u32>(),
        );
        if let (Ok(total_objects), Ok(hru_count), Ok(rtu_count)) = parsed {
            return Some(ObjectCount {
                name: parts[0].to_string(),
                total_objects,
                hru_count,
                routing_unit_count: rtu_count,
            });
        }
    }
    None
}

/// Read `hru.con` into an id-keyed map. Layout per data row:
/// `id name gis_id area_ha lat lon elev ...`
pub fn read_hrus(project: &Path) -> BTreeMap<u32, Hru> {
    let path = project.join("hru.con");
    let mut hrus = BTreeMap::new();

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => {
            log::warn!("Warning: {} not found", path.display());
            return hrus;
        }
    };

    for line in data_lines(&content) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 7 {
            continue;
        }
        let parsed = (
            parts[0].parse::<u32>(),
            parts[3].parse::<f64>(),
            parts[4].parse::<f64>(),
            parts[5].parse::<f64>(),
            parts[6].parse::<f64>(),
        );
        if let (Ok(id), Ok(area_ha), Ok(lat), Ok(lon), Ok(elevation)) = parsed {
            hrus.insert(
                id,
                Hru {
                    id,
                    name: parts[1].to_string(),
                    area_ha,
                    lat,
                    lon,
                    elevation,
                    downstream_channels: Vec::new(),
                    downstream_aquifers: Vec::new(),
                },
            );
        }
    }

    hrus
}

/// Read `rout_unit.def` (HRU groupings) and `rout_unit.con` (outlet
/// connections) into routing units.
pub fn read_routing_units(project: &Path) -> BTreeMap<u32, RoutingUnit> {
    let mut units = BTreeMap::new();

    let def_path = project.join("rout_unit.def");
    match fs::read_to_string(&def_path) {
        Ok(content) => {
            for line in data_lines(&content) {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 4 {
                    continue;
                }
                let parsed = (parts[0].parse::<u32>(), parts[2].parse::<usize>());
                let (Ok(id), Ok(elem_total)) = parsed else {
                    continue;
                };
                let elements: Vec<u32> = parts
                    .iter()
                    .skip(3)
                    .take(elem_total)
                    .filter_map(|p| p.parse().ok())
                    .collect();
                units.insert(
                    id,
                    RoutingUnit {
                        id,
                        name: parts[1].to_string(),
                        elements,
                        outlets: Vec::new(),
                    },
                );
            }
        }
        Err(_) => log::warn!("Warning: {} not found", def_path.display()),
    }

    let con_path = project.join("rout_unit.con");
    match fs::read_to_string(&con_path) {
        Ok(content) => {
            for line in data_lines(&content) {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 12 {
                    continue;
                }
                let parsed = (parts[0].parse::<u32>(), parts[10].parse::<usize>());
                let (Ok(id), Ok(out_total)) = parsed else {
                    continue;
                };
                let Some(unit) = units.get_mut(&id) else {
                    continue;
                };

                // each outlet is `obj_typ obj_id hyd_typ frac`
                let mut idx = 11;
                for _ in 0..out_total {
                    if idx + 2 >= parts.len() {
                        break;
                    }
                    if let Ok(object_id) = parts[idx + 1].parse::<u32>() {
                        unit.outlets.push(Outlet {
                            object_type: parts[idx].to_string(),
                            object_id,
                            hyd_type: parts[idx + 2].to_string(),
                        });
                    }
                    idx += 4;
                }
            }
        }
        Err(_) => log::warn!("Warning: {} not found", con_path.display()),
    }

    units
}
