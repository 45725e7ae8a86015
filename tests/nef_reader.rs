//! Loading converted NEF projects into a model

use starnef::nef::{NefModel, NefReader, ReadContext, ReadError, SaveFrameCategory, Stretches};
use starnef::star::nmr::{NmrDataBlock, NmrSaveFrame, NmrValue};
use starnef::star::{parse_nef_file, ParseMode};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample.nef");

/// Keeps the calls it receives; frames are handled by framecode
#[derive(Default)]
struct Project {
    chains: Vec<(String, Vec<Vec<String>>)>,
    frames: Vec<(SaveFrameCategory, String)>,
    spectrum_shift_lists: Vec<Option<String>>,
    null_chain_resolves_to: Option<String>,
}

impl NefModel for Project {
    type Handle = String;

    fn load_sequence(&mut self, chain_code: &str, stretches: &Stretches<'_>) -> Result<(), ReadError> {
        let residues = stretches
            .iter()
            .map(|stretch| {
                stretch
                    .iter()
                    .filter_map(|row| row.get("residue_name"))
                    .map(ToString::to_string)
                    .collect()
            })
            .collect();
        self.chains.push((chain_code.to_string(), residues));
        Ok(())
    }

    fn load_save_frame(
        &mut self,
        category: &SaveFrameCategory,
        frame: &NmrSaveFrame,
        context: &ReadContext<'_, String>,
    ) -> Result<Option<String>, ReadError> {
        match category {
            SaveFrameCategory::NmrSpectrum => {
                let list = context.chemical_shift_list_for(frame)?.cloned();
                self.spectrum_shift_lists.push(list);
            }
            SaveFrameCategory::ChemicalShiftList => {
                self.null_chain_resolves_to = context.chain_code(&NmrValue::Null);
            }
            _ => {}
        }
        self.frames.push((category.clone(), frame.name.clone()));
        Ok(Some(frame.name.clone()))
    }
}

fn sample_block() -> NmrDataBlock {
    let extent = parse_nef_file(SAMPLE, ParseMode::Strict, false).expect("sample converts");
    extent.get("sample").cloned().expect("sample block")
}

#[test]
fn sample_loads_in_reading_order() {
    let mut project = Project::default();
    let report = NefReader::new()
        .read(&sample_block(), &mut project)
        .expect("sample reads");

    let categories: Vec<_> = project.frames.iter().map(|(category, _)| category.clone()).collect();
    assert_eq!(
        categories,
        vec![
            SaveFrameCategory::NmrMetaData,
            SaveFrameCategory::MolecularSystem,
            SaveFrameCategory::ChemicalShiftList,
            SaveFrameCategory::NmrSpectrum,
        ]
    );
    assert_eq!(report.loaded.len(), 4);
    assert_eq!(report.unknown, vec!["my_extras_notes"]);
    assert_eq!(report.links.len(), 4);
    assert!(report.links.contains("nef_chemical_shift_list_default"));
}

#[test]
fn null_chain_codes_join_the_default_chain() {
    let mut project = Project::default();
    let report = NefReader::new()
        .read(&sample_block(), &mut project)
        .expect("sample reads");

    assert_eq!(report.default_chain_code.as_deref(), Some("A"));
    assert_eq!(report.chains, vec!["A"]);
    assert_eq!(
        project.chains,
        vec![(
            "A".to_string(),
            vec![vec!["ALA".to_string(), "GLY".to_string(), "SER".to_string()]]
        )]
    );
    assert_eq!(project.null_chain_resolves_to.as_deref(), Some("A"));
}

#[test]
fn spectrum_reference_resolves() {
    let mut project = Project::default();
    NefReader::new()
        .read(&sample_block(), &mut project)
        .expect("sample reads");
    assert_eq!(
        project.spectrum_shift_lists,
        vec![Some("nef_chemical_shift_list_default".to_string())]
    );
}

fn block_with_sequence(rows: &[(NmrValue, &str, &str, &str)]) -> NmrDataBlock {
    let mut block = NmrDataBlock::new("project");
    block.new_save_frame("nef_nmr_meta_data", "nef_nmr_meta_data");
    let columns = ["chain_code", "sequence_code", "residue_name", "linking"]
        .map(String::from)
        .to_vec();
    let table = block
        .new_save_frame("nef_molecular_system", "nef_molecular_system")
        .new_loop("nef_sequence", columns);
    for (chain, sequence_code, residue, linking) in rows {
        table.new_row([
            chain.clone(),
            NmrValue::from(*sequence_code),
            NmrValue::from(*residue),
            NmrValue::from(*linking),
        ]);
    }
    block
}

#[test]
fn default_chain_skips_taken_codes() {
    let block = block_with_sequence(&[
        (NmrValue::from("A"), "1", "MET", "start"),
        (NmrValue::from("A"), "2", "LYS", "end"),
        (NmrValue::Null, "1", "HOH", "single"),
    ]);
    let mut project = Project::default();
    let report = NefReader::new().read(&block, &mut project).expect("reads");

    assert_eq!(report.default_chain_code.as_deref(), Some("B"));
    assert_eq!(report.chains, vec!["A", "B"]);
    assert_eq!(project.chains[1].1, vec![vec!["HOH".to_string()]]);
}

#[test]
fn cyclic_chain_must_close() {
    let block = block_with_sequence(&[
        (NmrValue::from("A"), "1", "CYS", "cyclic"),
        (NmrValue::from("A"), "2", "GLY", "middle"),
        (NmrValue::from("A"), "3", "ALA", "middle"),
    ]);
    let error = NefReader::new()
        .read(&block, &mut Project::default())
        .expect_err("cycle never ends");
    assert_eq!(error, ReadError::UnterminatedCycle);
}

#[test]
fn closed_cycle_is_one_stretch() {
    let block = block_with_sequence(&[
        (NmrValue::from("A"), "1", "CYS", "cyclic"),
        (NmrValue::from("A"), "2", "GLY", "middle"),
        (NmrValue::from("A"), "3", "CYS", "cyclic"),
    ]);
    let mut project = Project::default();
    NefReader::new().read(&block, &mut project).expect("ring closes");
    assert_eq!(
        project.chains,
        vec![(
            "A".to_string(),
            vec![vec!["CYS".to_string(), "GLY".to_string(), "CYS".to_string()]]
        )]
    );
}

#[test]
fn unknown_linking_is_rejected() {
    let block = block_with_sequence(&[(NmrValue::from("A"), "1", "CYS", "cstart")]);
    let error = NefReader::new()
        .read(&block, &mut Project::default())
        .expect_err("not a NEF linking");
    assert_eq!(error, ReadError::IllegalLinking("cstart".to_string()));
}
