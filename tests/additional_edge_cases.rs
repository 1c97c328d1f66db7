// Parser edge cases: comment/blank-line stripping and whitespace
// tolerance, beyond the plain error-path coverage in error_handling.rs.

use tomasulo_sim::parse_program;

#[test]
fn comments_and_blank_lines_parse_identically_to_stripped_source() {
    let with_comments = "# preamble comment\nADD R1, R0, R0  # inline hash comment\n\n; semicolon comment\nSUB R2, R1, R0 ; inline semicolon comment\n\n\nMUL R3, R1, R2\n";
    let stripped = "ADD R1, R0, R0\nSUB R2, R1, R0\nMUL R3, R1, R2\n";

    let a = parse_program(with_comments).unwrap();
    let b = parse_program(stripped).unwrap();

    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.op, y.op);
        assert_eq!(x.dest, y.dest);
        assert_eq!(x.src1, y.src1);
        assert_eq!(x.src2, y.src2);
        assert_eq!(x.immediate, y.immediate);
    }
}

#[test]
fn a_file_of_only_comments_and_blank_lines_parses_to_nothing() {
    let text = "# just a header\n\n; nothing else\n\n\n";
    let instructions = parse_program(text).unwrap();
    assert!(instructions.is_empty());
}

#[test]
fn extra_whitespace_around_operands_is_tolerated() {
    let text = "ADD   R1 ,  R0,R0\nLD R2,   8 (  R1 )\n";
    let instructions = parse_program(text).unwrap();
    assert_eq!(instructions.len(), 2);
    assert_eq!(instructions[1].immediate, Some(8));
}

#[test]
fn mixed_case_opcodes_are_accepted() {
    let text = "add R1, R0, R0\nBeq R1, R0, 0\n";
    let instructions = parse_program(text).unwrap();
    assert_eq!(instructions.len(), 2);
}

#[test]
fn empty_program_is_valid() {
    let instructions = parse_program("").unwrap();
    assert!(instructions.is_empty());
}

#[test]
fn store_instruction_parses_its_memory_operand_as_the_second_argument() {
    let instructions = parse_program("ST R5, -4(R6)\n").unwrap();
    assert_eq!(instructions.len(), 1);
    assert_eq!(instructions[0].dest, Some(tomasulo_sim::instruction::Register::R(5)));
    assert_eq!(instructions[0].src1, Some(tomasulo_sim::instruction::Register::R(6)));
    assert_eq!(instructions[0].immediate, Some(-4));
}
