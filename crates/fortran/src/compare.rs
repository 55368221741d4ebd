use std::collections::{BTreeMap, BTreeSet};

/// Expected SWAT+ input/output files with their documented column counts,
/// as circulated with the file-coverage review request.
pub const REFERENCE_FILE_LIST: &str = "\
animal.hrd,1 aqu_catunit.def,6 aqu_catunit.ele,7 aqu_cha.lin,6 aqu_reg.def,6 aquifer.aqu,18 aquifer.con,20 aquifer.out,17 aquifer2d.con,20 atmo.cli,12 bmpuser.str,10 bsn_chan.out,13 cal_parms.cal,7 calibration.cal,16 ch_catunit.def,6 ch_catunit.ele,1 ch_reg.def,6 ch_sed_budget.sft,11 ch_sed_parms.sft,8 cha.key,21 chan-surf.lin,6 chandeg.con,20 channel-lte.cha,7 channel.cha,7 channel.con,20 channel.out,62 chem_app.ops,11 cntable.lum,13 codes.bsn,26 codes.sft,9 cons_prac.lum,9 constituents.cs,10 crop_yld_aa.out,5 delratio.con,20 delratio.del,7 deposition .out,29 diagnostics.out,4 dr_hmet.del,4 dr_om.del,20 dr_path.del,4 dr_pest.del,4 dr_salt.del,4 element.wro,1 exco.con,20 exco.exc,7 exco_hmet.exc,4 exco_om.exc,20 exco_path.exc,4 exco_pest.exc,4 exco_salt.exc,4 fertilizer.frt,8 field.fld,5 file.cio,152 files_out.out,2 filterstrip.str,7 fire.ops,5 flo_con.dtl,45 flow_duration_curve.out,11 grassedww.str,10 graze.ops,8 harv.ops,6 herd.hrd,1 hmd.cli,1 hmet_hru.ini,5 hmet_water.ini,5 hru-data.hru,10 hru-lte.con,20 hru-lte.hru,35 hru.con,20 hru_sub.key,12 hycon.out,4 hyd-out.out,29 hyd-sed-lte.cha,25 hyd_in.out,29 hydcon.out,7 hydrology.cha,12 hydrology.hyd,16 hydrology.res,12 hydrology.wet,11 initial.aqu,6 initial.cha,8 initial.res,8 irr.ops,10 landuse.lum,16 losses.bsn,14 losses.hru,15 losses.sd,14 losses.sub,14 ls_cal.reg,1 ls_reg.def,7 ls_reg.ele,5 ls_unit.def,8 ls_unit.ele,6 lum.dtl,45 management.sch,18 metl.cst,9 mgt.key,24 mgt.out,29 modflow.con,20 NEEDS WORK,4 nutbal.bsn,21 nutbal.hru,22 nutbal.sub,21 nutrients.cha,41 nutrients.res,14 nutrients.sol,14 object.cnt,21 om_water.ini,21 out.key,16 outlet.con,20 ovn_table.lum,8 parameters.bsn,45 path.cst,9 path_hru_ini,5 path_water.ini,5 pathogens.pth,20 pcp.cli,1 pest.cst,9 pest_hru.ini,5 pest_water.ini,5 pesticide.pes,16 pet.cli,1 plant.ini,14 plant_gro.sft,11 plant_parms.sft,11 plants.plt,57 plantwx.bsn,20 plantwx.hru,26 plantwx.sd,20 plantwx.sub,20 print.prt,227 ranch.hrd,1 rec_catunit.def,6 rec_catunit.ele,7 rec_reg.def,6 recall.con,20 recall.rec,4 recann.dat,25 recday.dat,25 res.dtl,47 res.key,21 res_catunit.def,6 res_catunit.ele,7 res_reg.def,6 reservoir.con,20 reservoir.out,44 reservoir.res,8 rout_unit.con,20 rout_unit.def,6 rout_unit.dr,19 rout_unit.ele,6 rout_unit.rtu,7 salt.cst,9 salt_hru_ini,5 salt_water.ini,5 scen_lu.dtl,45 sd_channel.out,17 sed_nut.cha,12 sediment.cha,26 sediment.res,8 septic.sep,12 septic.str,29 slr.cli,1 snow.sno,10 soil_plant.ini,9 soils.out,7 soils.sol,25 soils_lte.sol,6 sweep.ops,5 temperature.cha,7 tiledrain.str,11 tillage.til,8 time.sim,6 tmp.cli,1 topography.hyd,7 transfer.wro,1 urban.urb,13 water_allocation.wro,49 water_balance.sft,15 water_rights.wro,1 waterbal.bsn,20 waterbal.hru,42 waterbal.sd,20 waterbal.sub,20 wb_parms.sft,8 weather-sta.cli,9 weather-wgn.cli,22 weir.res,8 wetland.wet,10 wind-dir.cli,18 wnd.cli,1 yield.out,7";

/// Parse a whitespace-separated `name,count` list. Tokens without a comma
/// or with an unparsable count are dropped.
pub fn parse_reference_list(text: &str) -> BTreeMap<String, u32> {
    let mut files = BTreeMap::new();
    for part in text.split_whitespace() {
        let Some((filename, count)) = part.rsplit_once(',') else {
            continue;
        };
        if let Ok(count) = count.parse::<u32>() {
            files.insert(filename.to_string(), count);
        }
    }
    files
}

/// Parse a plain one-name-per-line list, lowercased; placeholder lines are
/// dropped.
pub fn parse_plain_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "NEEDS WORK")
        .map(str::to_lowercase)
        .collect()
}

/// Three-way partition of two filename sets
#[derive(Debug, Clone, Default)]
pub struct ListDiff {
    pub only_in_a: BTreeSet<String>,
    pub only_in_b: BTreeSet<String>,
    pub in_both: BTreeSet<String>,
}

impl ListDiff {
    pub fn compute(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Self {
        Self {
            only_in_a: a.difference(b).cloned().collect(),
            only_in_b: b.difference(a).cloned().collect(),
            in_both: a.intersection(b).cloned().collect(),
        }
    }

    /// Entries from the first list grouped by extension (no-extension
    /// entries under `no_ext`), for the missing-by-type breakdown.
    pub fn only_in_a_by_extension(&self) -> BTreeMap<String, Vec<&str>> {
        let mut by_ext: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for name in &self.only_in_a {
            let ext = name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
                .unwrap_or_else(|| "no_ext".to_string());
            by_ext.entry(ext).or_default().push(name.as_str());
        }
        by_ext
    }
}

/// Tolerant membership test used for the coverage report: exact match or
/// containment either way, so `hru.*` still pairs with `hru.con` variants.
pub fn matches_any<'a, I>(name: &str, candidates: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    candidates
        .into_iter()
        .any(|candidate| {
            name == candidate.as_str() || name.contains(candidate.as_str()) || candidate.contains(name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reference_list_parses_known_entries() {
        let files = parse_reference_list(REFERENCE_FILE_LIST);
        assert_eq!(files["hru.con"], 20);
        assert_eq!(files["print.prt"], 227);
        // the placeholder entry carries no comma on its first token
        assert!(!files.contains_key("NEEDS WORK"));
    }

    #[test]
    fn diff_partitions_are_disjoint_and_cover_the_union() {
        let a: BTreeSet<String> = ["hru.con", "time.sim", "plants.plt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let b: BTreeSet<String> = ["time.sim", "object.cnt"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let diff = ListDiff::compute(&a, &b);

        assert!(diff.only_in_a.is_disjoint(&diff.only_in_b));
        assert!(diff.only_in_a.is_disjoint(&diff.in_both));
        assert!(diff.only_in_b.is_disjoint(&diff.in_both));

        let union: BTreeSet<String> = a.union(&b).cloned().collect();
        let mut rebuilt = BTreeSet::new();
        rebuilt.extend(diff.only_in_a.iter().cloned());
        rebuilt.extend(diff.only_in_b.iter().cloned());
        rebuilt.extend(diff.in_both.iter().cloned());
        assert_eq!(rebuilt, union);
    }

    #[test]
    fn extension_breakdown_groups_missing_names() {
        let a: BTreeSet<String> = ["x.con", "y.con", "path_hru_ini"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let diff = ListDiff::compute(&a, &BTreeSet::new());
        let by_ext = diff.only_in_a_by_extension();

        assert_eq!(by_ext["con"].len(), 2);
        assert_eq!(by_ext["no_ext"], vec!["path_hru_ini"]);
    }

    #[test]
    fn tolerant_matching_pairs_wildcards() {
        let candidates = vec!["hru.*".to_string()];
        assert!(matches_any("hru.*", &candidates));
        assert!(matches_any("hru.", &candidates));
        assert!(!matches_any("plants.plt", &candidates));
    }
}
