use std::collections::HashMap;

use tv_format::{flag, DataSection, Instruction, LibrarySet, Opcode, OperandShape, StringTable};

use crate::data::DataDeclaration;
use crate::error::AssembleError;
use crate::instructions::Operand;
use crate::labels::IndexToPosition;
use crate::merge::MergeStore;

/// Output of the resolver: code with every name resolved, plus the data,
/// library, and string payloads it populated along the way.
pub struct Resolved {
    pub code: Vec<Instruction>,
    pub data: DataSection,
    pub libraries: LibrarySet,
    pub strings: StringTable,
    /// Index into `code` of the first instruction under the `main` label,
    /// if that label was defined and reached by at least one instruction.
    pub main_entry_index: Option<u32>,
}

struct DataTable {
    section: DataSection,
    offsets: HashMap<String, u32>,
}

impl DataTable {
    fn new() -> Self {
        DataTable {
            section: DataSection::new(),
            offsets: HashMap::new(),
        }
    }

    /// Returns `name`'s data offset, writing its bytes on first use.
    fn offset_of(&mut self, name: &str, decl: &DataDeclaration) -> u32 {
        if let Some(&off) = self.offsets.get(name) {
            return off;
        }
        let off = decl.write_into(&mut self.section);
        self.offsets.insert(name.to_string(), off);
        off
    }
}

/// Runs the two-pass symbol resolver (C4) over `store`'s merged
/// instructions, consuming `store` in the process.
pub fn resolve(store: MergeStore) -> Result<Resolved, AssembleError> {
    let MergeStore {
        instructions,
        data,
        labels,
        externals,
        ..
    } = store;
    let main_label_id = labels.get("main").copied();

    // Pass 1: map each label to the index of the first instruction that
    // follows its definition.
    let mut index_to_position: IndexToPosition = HashMap::new();
    let mut current_label: Option<u64> = None;
    for (insp, ins) in instructions.iter().enumerate() {
        if ins.label != current_label {
            if let Some(label) = ins.label {
                index_to_position.insert(label, insp as u32);
            }
            current_label = ins.label;
        }
    }

    // Pass 2: resolve every name-bearing operand, in instruction order.
    let mut data_table = DataTable::new();
    let mut libraries = LibrarySet::new();
    let mut strings = StringTable::new();
    let mut code = Vec::with_capacity(instructions.len());

    for ins in instructions {
        let mut out = Instruction::new(ins.op);
        let shape = ins.op.operand_shape();

        match shape {
            OperandShape::None => {}
            OperandShape::RegisterOnly => {
                let rd = expect_register(&ins.operands, 0)?;
                out.push_arg(rd as u64);
                out.mark_register_slot(0);
            }
            OperandShape::RegisterAndSrc => {
                let rd = expect_register(&ins.operands, 0)?;
                out.push_arg(rd as u64);
                out.mark_register_slot(0);
                resolve_operand(
                    &ins.operands[1],
                    1,
                    &labels,
                    &index_to_position,
                    &data,
                    &externals,
                    &mut data_table,
                    &mut libraries,
                    &mut strings,
                    &mut out,
                )?;
            }
            OperandShape::TargetOnly => {
                resolve_operand(
                    &ins.operands[0],
                    0,
                    &labels,
                    &index_to_position,
                    &data,
                    &externals,
                    &mut data_table,
                    &mut libraries,
                    &mut strings,
                    &mut out,
                )?;
            }
        }

        code.push(out);
    }

    let main_entry_index = main_label_id.and_then(|id| index_to_position.get(&id).copied());

    Ok(Resolved {
        code,
        data: data_table.section,
        libraries,
        strings,
        main_entry_index,
    })
}

fn expect_register(operands: &[Operand], slot: usize) -> Result<u8, AssembleError> {
    match operands.get(slot) {
        Some(Operand::Register(r)) => Ok(*r),
        _ => Err(AssembleError::Unresolved(
            "expected a register operand".to_string(),
        )),
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_operand(
    operand: &Operand,
    slot: usize,
    labels: &crate::labels::LabelMap,
    index_to_position: &IndexToPosition,
    data: &HashMap<String, DataDeclaration>,
    externals: &tv_format::ExternalIndex,
    data_table: &mut DataTable,
    libraries: &mut LibrarySet,
    strings: &mut StringTable,
    out: &mut Instruction,
) -> Result<(), AssembleError> {
    match operand {
        Operand::Register(r) => {
            out.push_arg(*r as u64);
            out.mark_register_slot(slot);
        }
        Operand::Immediate(v) => {
            out.push_arg(*v);
        }
        Operand::Name(name) => {
            if let Some(&label_id) = labels.get(name) {
                let pos = index_to_position
                    .get(&label_id)
                    .copied()
                    .expect("every merged label was seeded in pass 1");
                out.push_arg(pos as u64);
                out.flags |= flag::ADDR;
            } else if let Some(decl) = data.get(name) {
                let off = data_table.offset_of(name, decl);
                out.push_arg(off as u64);
                out.flags |= flag::ADRD;
            } else if let Some(owner) = externals.owner_of(name) {
                libraries.insert(owner);
                let off = strings.intern(name.as_bytes());
                out.push_arg(off as u64);
                out.flags |= flag::SYMU;
            } else {
                return Err(AssembleError::Unresolved(name.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instructions::{ParsedInstruction, ParsedUnit};

    fn store_from(unit: ParsedUnit) -> MergeStore {
        let mut store = MergeStore::new();
        store.merge_unit(unit).unwrap();
        store
    }

    #[test]
    fn s1_minimal_program_resolves_with_no_operands() {
        let unit = ParsedUnit {
            labels: vec!["main".to_string()],
            instructions: vec![ParsedInstruction {
                op: Opcode::RET,
                label: Some(0),
                operands: vec![],
            }],
            ..Default::default()
        };
        let resolved = resolve(store_from(unit)).unwrap();
        assert_eq!(resolved.code.len(), 1);
        assert_eq!(resolved.code[0].op, Opcode::RET);
    }

    #[test]
    fn s2_data_reference_sets_adrd_and_offset_zero() {
        let mut unit = ParsedUnit {
            labels: vec!["main".to_string()],
            ..Default::default()
        };
        unit.data
            .push(("msg".to_string(), DataDeclaration::Ascii(b"Hi".to_vec())));
        unit.instructions.push(ParsedInstruction {
            op: Opcode::MOV,
            label: Some(0),
            operands: vec![Operand::Register(0), Operand::Name("msg".to_string())],
        });
        let resolved = resolve(store_from(unit)).unwrap();
        let mov = &resolved.code[0];
        assert_eq!(mov.flags & flag::ADRD, flag::ADRD);
        assert_eq!(mov.argv[1], 0);
        assert_eq!(resolved.data.as_slice(), b"Hi");
    }

    #[test]
    fn s5_external_symbol_sets_symu_and_string_offset_zero() {
        let mut store = MergeStore::new();
        store.externals.declare("puts", "tvstdlib");
        let unit = ParsedUnit {
            labels: vec!["main".to_string()],
            instructions: vec![ParsedInstruction {
                op: Opcode::GTO,
                label: Some(0),
                operands: vec![Operand::Name("puts".to_string())],
            }],
            ..Default::default()
        };
        store.merge_unit(unit).unwrap();
        let resolved = resolve(store).unwrap();
        let gto = &resolved.code[0];
        assert_eq!(gto.flags & flag::SYMU, flag::SYMU);
        assert_eq!(gto.argv[0], 0);
        assert_eq!(resolved.libraries.names_in_order(), &["tvstdlib".to_string()]);
    }

    #[test]
    fn local_label_shadows_external_symbol_of_the_same_name() {
        let mut store = MergeStore::new();
        store.externals.declare("helper", "somelib");
        let unit = ParsedUnit {
            labels: vec!["main".to_string(), "helper".to_string()],
            instructions: vec![
                ParsedInstruction {
                    op: Opcode::GTO,
                    label: Some(0),
                    operands: vec![Operand::Name("helper".to_string())],
                },
                ParsedInstruction {
                    op: Opcode::RET,
                    label: Some(1),
                    operands: vec![],
                },
            ],
            ..Default::default()
        };
        store.merge_unit(unit).unwrap();
        let resolved = resolve(store).unwrap();
        let gto = &resolved.code[0];
        assert_eq!(gto.flags & flag::SYMU, 0);
        assert_eq!(gto.flags & flag::ADDR, flag::ADDR);
        assert_eq!(gto.argv[0], 1);
        assert!(resolved.libraries.is_empty());
    }

    #[test]
    fn unresolved_name_is_reported() {
        let unit = ParsedUnit {
            labels: vec!["main".to_string()],
            instructions: vec![ParsedInstruction {
                op: Opcode::GTO,
                label: Some(0),
                operands: vec![Operand::Name("nope".to_string())],
            }],
            ..Default::default()
        };
        let err = resolve(store_from(unit)).unwrap_err();
        assert_eq!(err, AssembleError::Unresolved("nope".to_string()));
    }

    #[test]
    fn data_table_dedups_repeated_references() {
        let mut unit = ParsedUnit {
            labels: vec!["main".to_string()],
            ..Default::default()
        };
        unit.data
            .push(("msg".to_string(), DataDeclaration::Ascii(b"Hi".to_vec())));
        unit.instructions.push(ParsedInstruction {
            op: Opcode::MOV,
            label: Some(0),
            operands: vec![Operand::Register(0), Operand::Name("msg".to_string())],
        });
        unit.instructions.push(ParsedInstruction {
            op: Opcode::MOV,
            label: Some(0),
            operands: vec![Operand::Register(1), Operand::Name("msg".to_string())],
        });
        let resolved = resolve(store_from(unit)).unwrap();
        assert_eq!(resolved.code[0].argv[1], resolved.code[1].argv[1]);
        assert_eq!(resolved.data.len(), 2);
    }
}
