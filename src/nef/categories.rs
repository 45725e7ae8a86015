//! Save-frame categories and the order frames are read in

use crate::star::nmr::{NmrDataBlock, NmrSaveFrame};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Known save-frame categories, plus a catch-all for anything newer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SaveFrameCategory {
    NmrMetaData,
    MolecularSystem,
    Sample,
    Substance,
    Assignment,
    ChemicalShiftList,
    Dataset,
    DistanceRestraintList,
    DihedralRestraintList,
    RdcRestraintList,
    NmrSpectrum,
    PeakRestraintLinks,
    Complex,
    SpectrumGroup,
    RestraintList,
    Notes,
    AdditionalData,
    Unknown(String),
}

/// Known categories in reading order. Cross-references only point backwards
/// along this list, so each frame can resolve its links once read.
pub const READING_ORDER: &[SaveFrameCategory] = &[
    SaveFrameCategory::NmrMetaData,
    SaveFrameCategory::MolecularSystem,
    SaveFrameCategory::Sample,
    SaveFrameCategory::Substance,
    SaveFrameCategory::Assignment,
    SaveFrameCategory::ChemicalShiftList,
    SaveFrameCategory::Dataset,
    SaveFrameCategory::DistanceRestraintList,
    SaveFrameCategory::DihedralRestraintList,
    SaveFrameCategory::RdcRestraintList,
    SaveFrameCategory::NmrSpectrum,
    SaveFrameCategory::PeakRestraintLinks,
    SaveFrameCategory::Complex,
    SaveFrameCategory::SpectrumGroup,
    SaveFrameCategory::RestraintList,
    SaveFrameCategory::Notes,
    SaveFrameCategory::AdditionalData,
];

impl SaveFrameCategory {
    pub fn from_name(name: &str) -> Self {
        match name {
            "nef_nmr_meta_data" => SaveFrameCategory::NmrMetaData,
            "nef_molecular_system" => SaveFrameCategory::MolecularSystem,
            "ccpn_sample" => SaveFrameCategory::Sample,
            "ccpn_substance" => SaveFrameCategory::Substance,
            "ccpn_assignment" => SaveFrameCategory::Assignment,
            "nef_chemical_shift_list" => SaveFrameCategory::ChemicalShiftList,
            "ccpn_dataset" => SaveFrameCategory::Dataset,
            "nef_distance_restraint_list" => SaveFrameCategory::DistanceRestraintList,
            "nef_dihedral_restraint_list" => SaveFrameCategory::DihedralRestraintList,
            "nef_rdc_restraint_list" => SaveFrameCategory::RdcRestraintList,
            "nef_nmr_spectrum" => SaveFrameCategory::NmrSpectrum,
            "nef_peak_restraint_links" => SaveFrameCategory::PeakRestraintLinks,
            "ccpn_complex" => SaveFrameCategory::Complex,
            "ccpn_spectrum_group" => SaveFrameCategory::SpectrumGroup,
            "ccpn_restraint_list" => SaveFrameCategory::RestraintList,
            "ccpn_notes" => SaveFrameCategory::Notes,
            "ccpn_additional_data" => SaveFrameCategory::AdditionalData,
            other => SaveFrameCategory::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SaveFrameCategory::NmrMetaData => "nef_nmr_meta_data",
            SaveFrameCategory::MolecularSystem => "nef_molecular_system",
            SaveFrameCategory::Sample => "ccpn_sample",
            SaveFrameCategory::Substance => "ccpn_substance",
            SaveFrameCategory::Assignment => "ccpn_assignment",
            SaveFrameCategory::ChemicalShiftList => "nef_chemical_shift_list",
            SaveFrameCategory::Dataset => "ccpn_dataset",
            SaveFrameCategory::DistanceRestraintList => "nef_distance_restraint_list",
            SaveFrameCategory::DihedralRestraintList => "nef_dihedral_restraint_list",
            SaveFrameCategory::RdcRestraintList => "nef_rdc_restraint_list",
            SaveFrameCategory::NmrSpectrum => "nef_nmr_spectrum",
            SaveFrameCategory::PeakRestraintLinks => "nef_peak_restraint_links",
            SaveFrameCategory::Complex => "ccpn_complex",
            SaveFrameCategory::SpectrumGroup => "ccpn_spectrum_group",
            SaveFrameCategory::RestraintList => "ccpn_restraint_list",
            SaveFrameCategory::Notes => "ccpn_notes",
            SaveFrameCategory::AdditionalData => "ccpn_additional_data",
            SaveFrameCategory::Unknown(name) => name,
        }
    }

    pub fn of(frame: &NmrSaveFrame) -> Self {
        Self::from_name(&frame.category)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SaveFrameCategory::Unknown(_))
    }

    /// Position in [`READING_ORDER`]; `None` for unknown categories
    pub fn reading_rank(&self) -> Option<usize> {
        READING_ORDER.iter().position(|known| known == self)
    }

    /// Categories allowed at most once per data block
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            SaveFrameCategory::NmrMetaData
                | SaveFrameCategory::MolecularSystem
                | SaveFrameCategory::PeakRestraintLinks
        )
    }
}

impl FromStr for SaveFrameCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for SaveFrameCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frames of `block` sorted by [`READING_ORDER`]; unknown categories follow in
/// file order, as do frames sharing a category.
pub fn frames_in_reading_order(block: &NmrDataBlock) -> Vec<&NmrSaveFrame> {
    let mut frames: Vec<_> = block.save_frames().collect();
    frames.sort_by_key(|frame| {
        SaveFrameCategory::of(frame)
            .reading_rank()
            .unwrap_or(READING_ORDER.len())
    });
    frames
}
