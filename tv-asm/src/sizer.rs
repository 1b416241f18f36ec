use tv_format::{ArgWidth, Instruction};

/// Picks the narrowest encoding width for each populated argument slot
/// (C5). Operates on `argv`/`argc` only; `flags` was already fixed by the
/// resolver and is never touched here.
pub fn size_instructions(code: &mut [Instruction]) {
    for ins in code.iter_mut() {
        for slot in 0..ins.argc as usize {
            let width = ArgWidth::smallest_for(ins.argv[slot]);
            ins.sizes.set(slot, width);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tv_format::Opcode;

    #[test]
    fn picks_narrowest_width_per_populated_slot() {
        let mut ins = Instruction::new(Opcode::MOV);
        ins.push_arg(3);
        ins.push_arg(70_000);
        let mut code = vec![ins];
        size_instructions(&mut code);
        assert_eq!(code[0].sizes.get(0), ArgWidth::One);
        assert_eq!(code[0].sizes.get(1), ArgWidth::Four);
    }

    #[test]
    fn leaves_flags_untouched() {
        let mut ins = Instruction::new(Opcode::GTO);
        ins.push_arg(5);
        ins.flags |= tv_format::flag::SYMU;
        let mut code = vec![ins];
        size_instructions(&mut code);
        assert_eq!(code[0].flags, tv_format::flag::SYMU);
    }

    #[test]
    fn encoded_size_matches_sum_of_picked_widths() {
        let mut ins = Instruction::new(Opcode::ADD);
        ins.push_arg(1);
        ins.push_arg(300);
        let mut code = vec![ins];
        size_instructions(&mut code);
        assert_eq!(code[0].encoded_size(), 1 + 2 + 2 + 1 + 1 + 2);
    }
}
