//! Walking a converted NEF block into an external model

use super::categories::{frames_in_reading_order, SaveFrameCategory};
use super::error::ReadError;
use super::sequence::{group_by_chain, split_nef_sequence, Stretches};
use crate::star::nmr::{NmrDataBlock, NmrSaveFrame, NmrValue};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, debug_span, trace, warn};

/// Loop of the molecular system frame listing the residues
pub const SEQUENCE_LOOP: &str = "nef_sequence";
/// Tag linking a frame to its chemical shift list
pub const SHIFT_LIST_TAG: &str = "chemical_shift_list";

/// The domain model NEF data is loaded into.
///
/// The reader calls [`NefModel::load_sequence`] once per chain of the
/// molecular system, then [`NefModel::load_save_frame`] for every known frame
/// in reading order. Handles returned for a frame are registered under its
/// framecode so later frames can link to it through [`ReadContext`].
pub trait NefModel {
    type Handle;

    fn load_sequence(&mut self, chain_code: &str, stretches: &Stretches<'_>) -> Result<(), ReadError>;

    fn load_save_frame(
        &mut self,
        category: &SaveFrameCategory,
        frame: &NmrSaveFrame,
        context: &ReadContext<'_, Self::Handle>,
    ) -> Result<Option<Self::Handle>, ReadError>;
}

/// Model objects by the framecode of the frame they were loaded from
#[derive(Debug, Clone)]
pub struct CrossLinks<H> {
    objects: IndexMap<String, H>,
}

impl<H> CrossLinks<H> {
    pub fn new() -> Self {
        Self {
            objects: IndexMap::new(),
        }
    }

    /// Register `handle` under `framecode`, returning the handle it replaces
    pub fn register(&mut self, framecode: impl Into<String>, handle: H) -> Option<H> {
        self.objects.insert(framecode.into(), handle)
    }

    pub fn get(&self, framecode: &str) -> Option<&H> {
        self.objects.get(framecode)
    }

    pub fn contains(&self, framecode: &str) -> bool {
        self.objects.contains_key(framecode)
    }

    /// Registered framecodes and handles, in loading order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &H)> + '_ {
        self.objects.iter().map(|(code, handle)| (code.as_str(), handle))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<H> Default for CrossLinks<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a model sees of the reader while it loads a frame
#[derive(Debug)]
pub struct ReadContext<'a, H> {
    links: &'a CrossLinks<H>,
    default_chain_code: Option<&'a str>,
    default_shift_list: Option<&'a str>,
}

impl<'a, H> ReadContext<'a, H> {
    pub fn resolve(&self, framecode: &str) -> Option<&'a H> {
        self.links.get(framecode)
    }

    /// Object named by the save-frame reference in `tag`.
    ///
    /// `Ok(None)` when the tag is absent or null; an error when it names a
    /// frame that has not been loaded.
    pub fn linked(&self, frame: &NmrSaveFrame, tag: &str) -> Result<Option<&'a H>, ReadError> {
        let target = match frame.value(tag) {
            None | Some(NmrValue::Null) => return Ok(None),
            Some(value) => value.to_string(),
        };
        match self.resolve(&target) {
            Some(handle) => Ok(Some(handle)),
            None => Err(ReadError::UnresolvedReference {
                frame: frame.name.clone(),
                tag: tag.to_string(),
                target,
            }),
        }
    }

    /// Shift list linked from `frame`, else the first one loaded
    pub fn chemical_shift_list_for(&self, frame: &NmrSaveFrame) -> Result<Option<&'a H>, ReadError> {
        match self.linked(frame, SHIFT_LIST_TAG)? {
            Some(handle) => Ok(Some(handle)),
            None => Ok(self.default_shift_list.and_then(|code| self.resolve(code))),
        }
    }

    /// Chain code for a `chain_code` value; null maps to the default chain
    pub fn chain_code(&self, value: &NmrValue) -> Option<String> {
        match value {
            NmrValue::Null => self.default_chain_code.map(str::to_string),
            other => Some(other.to_string()),
        }
    }

    pub fn default_chain_code(&self) -> Option<&'a str> {
        self.default_chain_code
    }
}

/// Outcome of a successful read
#[derive(Debug, Clone)]
pub struct ReadReport<H> {
    /// Framecodes handed to the model, in the order they were loaded
    pub loaded: Vec<String>,
    /// Framecodes skipped for having an unknown category
    pub unknown: Vec<String>,
    /// Chain codes of the molecular system, sorted
    pub chains: Vec<String>,
    /// Code given to residues that had no chain code
    pub default_chain_code: Option<String>,
    pub links: CrossLinks<H>,
}

impl<H> ReadReport<H> {
    fn new() -> Self {
        Self {
            loaded: Vec::new(),
            unknown: Vec::new(),
            chains: Vec::new(),
            default_chain_code: None,
            links: CrossLinks::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NefReader;

impl NefReader {
    pub fn new() -> Self {
        NefReader
    }

    /// Load every frame of `block` into `model`, metadata first.
    pub fn read<M: NefModel>(
        &self,
        block: &NmrDataBlock,
        model: &mut M,
    ) -> Result<ReadReport<M::Handle>, ReadError> {
        let _span = debug_span!("nef_read", block = %block.name).entered();
        let frames = frames_in_reading_order(block);
        check_singletons(&frames)?;
        match frames.first() {
            Some(frame) if SaveFrameCategory::of(frame) == SaveFrameCategory::NmrMetaData => {}
            _ => return Err(ReadError::MissingMetaData(block.name.clone())),
        }

        let mut report = ReadReport::new();
        let mut default_shift_list: Option<String> = None;
        for frame in frames {
            let category = SaveFrameCategory::of(frame);
            match &category {
                SaveFrameCategory::Unknown(name) => {
                    warn!(category = %name, frame = %frame.name, "unknown save frame category");
                    report.unknown.push(frame.name.clone());
                    continue;
                }
                SaveFrameCategory::MolecularSystem => load_sequence(frame, model, &mut report)?,
                _ => {}
            }

            debug!(category = %category, frame = %frame.name, "loading save frame");
            let context = ReadContext {
                links: &report.links,
                default_chain_code: report.default_chain_code.as_deref(),
                default_shift_list: default_shift_list.as_deref(),
            };
            let handle = model.load_save_frame(&category, frame, &context)?;

            if category == SaveFrameCategory::ChemicalShiftList && default_shift_list.is_none() {
                default_shift_list = Some(frame.name.clone());
            }
            report.loaded.push(frame.name.clone());
            if let Some(handle) = handle {
                report.links.register(frame.name.clone(), handle);
            }
        }
        Ok(report)
    }
}

fn check_singletons(frames: &[&NmrSaveFrame]) -> Result<(), ReadError> {
    let mut seen = HashSet::new();
    for frame in frames {
        let category = SaveFrameCategory::of(frame);
        if category.is_singleton() && !seen.insert(category) {
            return Err(ReadError::DuplicateFrame {
                category: frame.category.clone(),
                framecode: frame.name.clone(),
            });
        }
    }
    Ok(())
}

fn load_sequence<M: NefModel>(
    frame: &NmrSaveFrame,
    model: &mut M,
    report: &mut ReadReport<M::Handle>,
) -> Result<(), ReadError> {
    let Some(sequence) = frame.get_loop(SEQUENCE_LOOP) else {
        debug!(frame = %frame.name, "molecular system has no sequence");
        return Ok(());
    };

    let (chains, default_code) = group_by_chain(&sequence.data);
    if let Some(code) = &default_code {
        debug!(chain_code = %code, "residues without chain code go to the default chain");
    }
    for (code, rows) in &chains {
        let stretches = split_nef_sequence(rows.iter().copied())?;
        trace!(chain_code = %code, stretches = stretches.len(), "loading chain");
        model.load_sequence(code, &stretches)?;
        report.chains.push(code.clone());
    }
    report.default_chain_code = default_code;
    Ok(())
}
