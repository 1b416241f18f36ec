use pest::iterators::Pair;
use pest::Parser;
use tv_util::EnumFromStr;

use tv_format::{Opcode, OperandShape};

use crate::data::{unquote, DataDeclaration};
use crate::error::ParseError;
use crate::instructions::{Operand, ParsedInstruction, ParsedUnit};
use crate::parser::{Rule, TvAsmParser};

/// Parses one translation unit's source text into a `ParsedUnit`.
pub fn parse_unit(source: &str) -> Result<ParsedUnit, ParseError> {
    let mut pairs = TvAsmParser::parse(Rule::program, source)?;
    let program = pairs.next().expect("program rule always produces one pair");

    let mut unit = ParsedUnit::default();
    for section in program.into_inner() {
        match section.as_rule() {
            Rule::libs => parse_libs(section, &mut unit),
            Rule::data => parse_data(section, &mut unit)?,
            Rule::instructions => parse_instructions(section, &mut unit)?,
            Rule::EOI => {}
            other => unreachable!("unexpected top-level rule {:?}", other),
        }
    }
    Ok(unit)
}

fn parse_libs(pair: Pair<Rule>, unit: &mut ParsedUnit) {
    for ident in pair.into_inner() {
        unit.libs.push(ident.as_str().to_string());
    }
}

fn parse_data(pair: Pair<Rule>, unit: &mut ParsedUnit) -> Result<(), ParseError> {
    for decl in pair.into_inner() {
        let mut inner = decl.into_inner();
        let label = strip_label(inner.next().expect("data_decl always has a label"));
        let tag = inner.next().expect("data_decl always has a data_tag");
        let declaration = parse_data_tag(tag)?;
        unit.data.push((label, declaration));
    }
    Ok(())
}

fn parse_data_tag(pair: Pair<Rule>) -> Result<DataDeclaration, ParseError> {
    let inner = pair.into_inner().next().expect("data_tag wraps one alternative");
    match inner.as_rule() {
        Rule::ascii_tag => {
            let string_pair = inner.into_inner().next().expect("ascii_tag carries a string");
            Ok(DataDeclaration::Ascii(unquote(string_pair.as_str())))
        }
        Rule::zero_tag => {
            let count_pair = inner.into_inner().next().expect("zero_tag carries a count");
            Ok(DataDeclaration::Zero(parse_uint(count_pair.as_str())?))
        }
        Rule::word_tag => {
            let value_pair = inner.into_inner().next().expect("word_tag carries a value");
            Ok(DataDeclaration::Word(parse_int_literal(value_pair)?))
        }
        other => unreachable!("unexpected data_tag alternative {:?}", other),
    }
}

fn parse_instructions(pair: Pair<Rule>, unit: &mut ParsedUnit) -> Result<(), ParseError> {
    let mut current_label: Option<usize> = None;
    for instruction in pair.into_inner() {
        let mut inner = instruction.into_inner().peekable();

        if let Some(p) = inner.peek() {
            if p.as_rule() == Rule::label {
                let name = strip_label(inner.next().unwrap());
                let id = unit.labels.len();
                unit.labels.push(name);
                current_label = Some(id);
            }
        }

        let mnemonic = inner.next().expect("instruction always has a mnemonic");
        let op = Opcode::from_str(&mnemonic.as_str().to_uppercase())?;

        let mut operands = Vec::new();
        for operand_pair in inner {
            operands.push(parse_operand(operand_pair)?);
        }
        validate_shape(op, &operands)?;

        unit.instructions.push(ParsedInstruction {
            op,
            label: current_label,
            operands,
        });
    }
    Ok(())
}

fn parse_operand(pair: Pair<Rule>) -> Result<Operand, ParseError> {
    let inner = pair.into_inner().next().expect("operand wraps one alternative");
    match inner.as_rule() {
        Rule::register => Ok(Operand::Register(parse_register(inner.as_str()))),
        Rule::int_literal => Ok(Operand::Immediate(parse_int_literal(inner)?)),
        Rule::identifier => Ok(Operand::Name(inner.as_str().to_string())),
        other => unreachable!("unexpected operand alternative {:?}", other),
    }
}

fn parse_register(text: &str) -> u8 {
    text[2..].parse().expect("grammar guarantees a single digit")
}

/// `int_literal` is an atomic rule, so its match collapses to one token
/// with no inner pairs for the hex/oct/bin/dec alternative it took;
/// dispatch on the matched text's prefix instead.
fn parse_int_literal(pair: Pair<Rule>) -> Result<u64, ParseError> {
    let text = pair.as_str();
    if let Some(rest) = text.strip_prefix("0x") {
        Ok(u64::from_str_radix(rest, 16)?)
    } else if let Some(rest) = text.strip_prefix("0o") {
        Ok(u64::from_str_radix(rest, 8)?)
    } else if let Some(rest) = text.strip_prefix("0b") {
        Ok(u64::from_str_radix(rest, 2)?)
    } else {
        parse_uint(text)
    }
}

fn parse_uint(text: &str) -> Result<u64, ParseError> {
    Ok(text.parse()?)
}

fn strip_label(pair: Pair<Rule>) -> String {
    let text = pair.as_str();
    text[..text.len() - 1].to_string()
}

fn validate_shape(op: Opcode, operands: &[Operand]) -> Result<(), ParseError> {
    let ok = match op.operand_shape() {
        OperandShape::None => operands.is_empty(),
        OperandShape::RegisterOnly => {
            operands.len() == 1 && matches!(operands[0], Operand::Register(_))
        }
        OperandShape::RegisterAndSrc => {
            operands.len() == 2 && matches!(operands[0], Operand::Register(_))
        }
        OperandShape::TargetOnly => {
            operands.len() == 1 && !matches!(operands[0], Operand::Register(_))
        }
    };
    if ok {
        Ok(())
    } else {
        Err(ParseError::InvalidOperand(format!(
            "{:?} does not accept operands {:?}",
            op, operands
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn s1_minimal_program_parses_one_label_and_one_instruction() {
        let unit = parse_unit(".data\n.instructions\nmain: ret\n").unwrap();
        assert_eq!(unit.labels, vec!["main".to_string()]);
        assert_eq!(unit.instructions.len(), 1);
        assert_eq!(unit.instructions[0].op, Opcode::RET);
        assert_eq!(unit.instructions[0].label, Some(0));
    }

    #[test]
    fn lowercase_mnemonics_parse_via_uppercasing() {
        let unit = parse_unit(".data\n.instructions\nmain: mov %r0, 5\n").unwrap();
        assert_eq!(unit.instructions[0].op, Opcode::MOV);
    }

    #[test]
    fn data_section_parses_ascii_zero_and_word_tags() {
        let unit = parse_unit(
            ".data\nmsg: .ascii \"hi\"\npad: .zero 3\nn: .word 0x10\n.instructions\nmain: ret\n",
        )
        .unwrap();
        assert_eq!(unit.data[0], ("msg".to_string(), DataDeclaration::Ascii(b"hi".to_vec())));
        assert_eq!(unit.data[1], ("pad".to_string(), DataDeclaration::Zero(3)));
        assert_eq!(unit.data[2], ("n".to_string(), DataDeclaration::Word(16)));
    }

    #[test]
    fn libs_section_collects_declared_library_names() {
        let unit = parse_unit(".libs tvstdlib\n.data\n.instructions\nmain: ret\n").unwrap();
        assert_eq!(unit.libs, vec!["tvstdlib".to_string()]);
    }

    #[test]
    fn instructions_without_a_new_label_inherit_the_last_one_seen() {
        let unit = parse_unit(".data\n.instructions\nmain: inc %r0\ndec %r0\n").unwrap();
        assert_eq!(unit.instructions[0].label, Some(0));
        assert_eq!(unit.instructions[1].label, Some(0));
    }

    #[test]
    fn register_only_opcode_rejects_a_second_operand() {
        let err = parse_unit(".data\n.instructions\nmain: inc %r0, %r1\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidOperand(_)));
    }

    #[test]
    fn target_only_opcode_rejects_a_register_operand() {
        let err = parse_unit(".data\n.instructions\nmain: gto %r0\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidOperand(_)));
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let unit = parse_unit("# a comment\n.data\n\n.instructions\nmain: ret # trailing\n").unwrap();
        assert_eq!(unit.instructions.len(), 1);
    }
}
