use serde::Serialize;

/// Model structure counts from `object.cnt`
#[derive(Debug, Clone, Serialize)]
pub struct ObjectCount {
    pub name: String,
    pub total_objects: u32,
    pub hru_count: u32,
    pub routing_unit_count: u32,
}

/// One hydrologic response unit from `hru.con`
#[derive(Debug, Clone, Serialize)]
pub struct Hru {
    pub id: u32,
    pub name: String,
    pub area_ha: f64,
    pub lat: f64,
    pub lon: f64,
    pub elevation: f64,
    /// Channel ids this HRU drains to, via its routing unit
    #[serde(default)]
    pub downstream_channels: Vec<u32>,
    /// Aquifer ids this HRU recharges, via its routing unit
    #[serde(default)]
    pub downstream_aquifers: Vec<u32>,
}

/// Outlet connection of a routing unit from `rout_unit.con`
#[derive(Debug, Clone, Serialize)]
pub struct Outlet {
    /// Object type code (`sdc` channel, `aqu` aquifer, ...)
    pub object_type: String,
    pub object_id: u32,
    /// Hydrograph type code (`tot`, `rhg`, `sur`, ...)
    pub hyd_type: String,
}

/// A routing unit: a group of HRUs with shared outlets
#[derive(Debug, Clone, Serialize)]
pub struct RoutingUnit {
    pub id: u32,
    pub name: String,
    /// HRU element ids belonging to this unit
    pub elements: Vec<u32>,
    pub outlets: Vec<Outlet>,
}
