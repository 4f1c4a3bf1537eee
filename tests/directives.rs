use pretty_assertions::assert_eq;
use z80asm::{assemble, hex_dump, AsmError, Error};

fn bytes(src: &str) -> Vec<u8> {
    assemble(src).unwrap().code
}

fn line_err(src: &str) -> (Option<usize>, AsmError) {
    let err = assemble(src).unwrap_err();
    (err.line(), err.kind().clone())
}

#[test]
fn comments_and_blank_lines_emit_nothing() {
    assert_eq!(bytes("  ; header\n\n\t\nnop ; idle\n;"), vec![0x00]);
    assert_eq!(bytes(""), Vec::<u8>::new());
}

#[test]
fn variables_substitute_textually() {
    assert_eq!(bytes("$port 0feh\nin a,($port)"), vec![0xDB, 0xFE]);
    assert_eq!(bytes("$val 10h\nld a,$val\nld b,$val"), vec![0x3E, 0x10, 0x06, 0x10]);
    assert_eq!(bytes("$reg b\nld a,$reg"), vec![0x78]);
}

#[test]
fn variable_values_are_not_rescanned() {
    let src = "$a $b\n$b 5\nld a,$a";
    assert_eq!(line_err(src), (Some(3), AsmError::InvalidLiteral("$b".into())));
}

#[test]
fn variable_without_value() {
    assert!(matches!(line_err("$x"), (Some(1), AsmError::MalformedDirective(_))));
}

#[test]
fn defb_emits_one_byte_per_value() {
    assert_eq!(bytes("defb 1,2,0ffh,\"A\""), vec![0x01, 0x02, 0xFF, 0x41]);
    assert_eq!(bytes("defb -1"), vec![0xFF]);
    assert_eq!(line_err("defb 300"), (Some(1), AsmError::ValueOutOfRange { value: 300, bits: 8 }));
    assert!(matches!(line_err("defb"), (Some(1), AsmError::MalformedDirective(_))));
    assert_eq!(line_err("defb a"), (Some(1), AsmError::InvalidLiteral("a".into())));
}

#[test]
fn defm_keeps_case_and_commas() {
    assert_eq!(bytes("DEFM Hello, World"), b"Hello, World".to_vec());
    assert_eq!(bytes("defm \"Hi\""), b"Hi".to_vec());
    assert_eq!(bytes("defm \"a;b\" ; trailing"), b"a;b".to_vec());
    assert!(matches!(line_err("defm"), (Some(1), AsmError::MalformedDirective(_))));
    assert!(matches!(line_err("defm \"\""), (Some(1), AsmError::MalformedDirective(_))));
}

#[test]
fn data_advances_the_instruction_pointer() {
    let asm = assemble("org 0\ndefm abc\n:after\njp :after").unwrap();
    assert_eq!(asm.code, vec![b'a', b'b', b'c', 0xC3, 0x03, 0x00]);
}

#[test]
fn origin_directive_forms() {
    assert_eq!(assemble("ORG 30000").unwrap().origin, Some(30000));
    assert_eq!(assemble("org 8000h").unwrap().origin, Some(0x8000));
    assert!(matches!(line_err("nop\norg"), (Some(2), AsmError::MalformedDirective(_))));
    assert!(matches!(line_err("org 1 2"), (Some(1), AsmError::MalformedDirective(_))));
}

#[test]
fn quote_errors() {
    assert_eq!(line_err("ld a,\"x"), (Some(1), AsmError::UnterminatedQuote));
    assert_eq!(line_err("nop\ndefb \"a\",\"b\""), (Some(2), AsmError::MultipleQuotes));
}

#[test]
fn error_messages_carry_the_line() {
    let err = assemble("nop\nnop\nld a,zz").unwrap_err();
    assert_eq!(err.to_string(), "line 3: invalid literal `zz`");
    let err = assemble("jp :x\n:x").unwrap_err();
    assert_eq!(err.line(), None);
    assert!(matches!(err, Error::Resolve(_)));
}

#[test]
fn hex_dump_of_program() {
    let asm = assemble("ld a,10h\nret").unwrap();
    assert_eq!(hex_dump(&asm.code), "3e 10 c9");
}
