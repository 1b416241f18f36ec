use std::collections::HashMap;

use crate::data::DataDeclaration;
use crate::error::AssembleError;
use crate::instructions::{Operand, ParsedInstruction, ParsedUnit};
use crate::labels::LabelMap;
use tv_format::ExternalIndex;

/// One instruction after label ids have been remapped into the merge
/// store's global id space; everything else is carried over unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedInstruction {
    pub op: tv_format::Opcode,
    pub label: Option<u64>,
    pub operands: Vec<Operand>,
}

/// Accumulates instructions, data declarations, and labels across one or
/// more parsed translation units (C3). Also hosts the external symbol
/// index populated by the shared-library loader (C2), since both feed
/// the same resolver pass (C4).
#[derive(Default)]
pub struct MergeStore {
    pub instructions: Vec<MergedInstruction>,
    pub data: HashMap<String, DataDeclaration>,
    pub labels: LabelMap,
    pub externals: ExternalIndex,
    next_label_id: u64,
}

impl MergeStore {
    pub fn new() -> Self {
        MergeStore::default()
    }

    /// Merges one parsed unit's labels, data declarations, and
    /// instructions into the accumulated store, in that order (labels
    /// must be assigned global ids before instructions referencing them
    /// by local index can be remapped).
    pub fn merge_unit(&mut self, unit: ParsedUnit) -> Result<(), AssembleError> {
        let mut remap: Vec<u64> = Vec::with_capacity(unit.labels.len());
        for name in &unit.labels {
            if self.labels.contains_key(name) {
                return Err(AssembleError::DupLabel(name.clone()));
            }
            let id = self.next_label_id;
            self.next_label_id += 1;
            self.labels.insert(name.clone(), id);
            remap.push(id);
        }

        for (name, decl) in unit.data {
            if self.data.contains_key(&name) {
                return Err(AssembleError::DupData(name));
            }
            self.data.insert(name, decl);
        }

        for ins in unit.instructions {
            let ParsedInstruction {
                op,
                label,
                operands,
            } = ins;
            self.instructions.push(MergedInstruction {
                op,
                label: label.map(|local| remap[local]),
                operands,
            });
        }

        Ok(())
    }
}
