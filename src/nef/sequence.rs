//! `nef_sequence` handling: chain grouping and linked stretches

use super::error::ReadError;
use crate::star::nmr::{NmrRow, NmrValue};
use std::collections::BTreeMap;

pub const CHAIN_CODE: &str = "chain_code";
pub const LINKING: &str = "linking";

/// Rows of one chain split into sequentially linked stretches
pub type Stretches<'a> = Vec<Vec<&'a NmrRow>>;

/// Chain code following `code`: `A`..`Z`, then `AA`, `AB`, ..
fn next_code(code: &str) -> String {
    let mut letters: Vec<u8> = code.bytes().collect();
    let mut index = letters.len();
    loop {
        if index == 0 {
            letters.insert(0, b'A');
            break;
        }
        index -= 1;
        if letters[index] == b'Z' {
            letters[index] = b'A';
        } else {
            letters[index] += 1;
            break;
        }
    }
    letters.into_iter().map(char::from).collect()
}

/// First code from `A` onwards not among `taken`
pub fn default_chain_code<'a>(taken: impl IntoIterator<Item = &'a str> + Clone) -> String {
    let mut code = "A".to_string();
    while taken.clone().into_iter().any(|existing| existing == code) {
        code = next_code(&code);
    }
    code
}

/// Group rows by chain code, sorted by code.
///
/// Rows without a chain code are filed under [`default_chain_code`], which is
/// returned alongside when it was needed.
pub fn group_by_chain<'a>(
    rows: impl IntoIterator<Item = &'a NmrRow>,
) -> (BTreeMap<String, Vec<&'a NmrRow>>, Option<String>) {
    let mut chains: BTreeMap<String, Vec<&NmrRow>> = BTreeMap::new();
    let mut unnamed = Vec::new();
    for row in rows {
        match row.get(CHAIN_CODE) {
            None | Some(NmrValue::Null) => unnamed.push(row),
            Some(code) => chains.entry(code.to_string()).or_default().push(row),
        }
    }

    if unnamed.is_empty() {
        return (chains, None);
    }
    let code = default_chain_code(chains.keys().map(String::as_str));
    chains.insert(code.clone(), unnamed);
    (chains, Some(code))
}

/// Split the rows of one chain into linked stretches following the NEF
/// linking rules.
///
/// A missing linking counts as `middle`. Missing `start`/`end` markers are
/// tolerated; the first and last residues then bound the stretch. `break`
/// closes the open stretch with the current row, or opens a new one when
/// none is open.
pub fn split_nef_sequence<'a>(
    rows: impl IntoIterator<Item = &'a NmrRow>,
) -> Result<Stretches<'a>, ReadError> {
    let mut result = Vec::new();
    let mut stretch = Vec::new();
    let mut in_cycle = false;

    for row in rows {
        let linking = match row.get(LINKING) {
            None | Some(NmrValue::Null) => None,
            Some(NmrValue::Str(text)) => Some(text.as_str()),
            Some(other) => return Err(ReadError::IllegalLinking(other.to_string())),
        };

        if in_cycle && !matches!(linking, None | Some("middle") | Some("cyclic")) {
            return Err(ReadError::InterruptedCycle);
        }

        match linking {
            Some("cyclic") if in_cycle => {
                in_cycle = false;
                stretch.push(row);
                result.push(std::mem::take(&mut stretch));
            }
            Some("cyclic") => {
                in_cycle = true;
                if !stretch.is_empty() {
                    result.push(std::mem::take(&mut stretch));
                }
                stretch.push(row);
            }
            Some("single") | Some("nonlinear") | Some("dummy") => {
                if !stretch.is_empty() {
                    result.push(std::mem::take(&mut stretch));
                }
                result.push(vec![row]);
            }
            Some("start") => {
                if !stretch.is_empty() {
                    result.push(std::mem::take(&mut stretch));
                }
                stretch.push(row);
            }
            Some("end") => {
                stretch.push(row);
                result.push(std::mem::take(&mut stretch));
            }
            None | Some("middle") => stretch.push(row),
            // NEF (July 2016) is ambiguous here; a break after the residue may be meant
            Some("break") => {
                let open = !stretch.is_empty();
                stretch.push(row);
                if open {
                    result.push(std::mem::take(&mut stretch));
                }
            }
            Some(other) => return Err(ReadError::IllegalLinking(other.to_string())),
        }
    }

    if !stretch.is_empty() {
        result.push(stretch);
    }
    if in_cycle {
        return Err(ReadError::UnterminatedCycle);
    }
    Ok(result)
}
