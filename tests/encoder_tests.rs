//! Encoder tests: round-trip and idempotence.
//!
//! Hand-assembled canonical modules must decode and encode back to the
//! exact same bytes; modules built in code must survive encode, decode,
//! encode unchanged.

mod common;

#[cfg(test)]
mod tests {
    use crate::common::{hex_module, i32_const, local_get, round_trip, ModuleBuilder, ALL_SECTIONS};
    use rstest::rstest;
    use wasmtiny::encoder::{self, EncodeError};
    use wasmtiny::parser::{self, instruction::BlockType, instruction::Instruction, instruction::NumericOp};
    use wasmtiny::parser::module::{FuncType, GlobalType, Mutability, Section, ValueType};

    /// (func (export "add") (param i32 i32) (result i32) ...)
    const ADD: &str = "
        01 07 01 60 02 7f 7f 01 7f
        03 02 01 00
        07 07 01 03 616464 00 00
        0a 09 01 07 00 20 00 20 01 6a 0b";

    /// Structured control, br_table, reserved bytes on memory instructions,
    /// 0xFC bulk memory and float constants.
    const INSTRUCTIONS: &str = "
        01 04 01 60 00 00
        03 02 01 00
        05 03 01 00 01
        0a 4b 01 49 00
            02 40 03 7f 41 01 0d 01 41 00 0b 1a 0b
            41 00 04 40 01 05 01 0b
            02 40 41 00 0e 02 00 00 00 0b
            3f 00 1a
            41 00 40 00 1a
            41 00 41 00 41 00 fc 0b 00
            41 00 41 00 41 00 fc 0a 00 00
            42 7f 1a
            44 000000000000f03f 1a
            0b";

    /// Passive and explicit-memory data segments, data count
    const DATA_FORMS: &str = "
        05 03 01 00 01
        0c 01 03
        0b 12 03
            00 41 00 0b 01 aa
            01 02 bbcc
            02 00 41 08 0b 01 dd";

    #[rstest]
    #[case::empty("")]
    #[case::add(ADD)]
    #[case::all_sections(ALL_SECTIONS)]
    #[case::instructions(INSTRUCTIONS)]
    #[case::data_forms(DATA_FORMS)]
    fn decode_encode_reproduces_bytes(#[case] sections: &str) {
        let bytes = hex_module(sections);
        let module = parser::decode(&bytes).unwrap();
        assert_eq!(encoder::encode(&module).unwrap(), bytes);
    }

    #[rstest]
    #[case(ADD)]
    #[case(ALL_SECTIONS)]
    #[case(INSTRUCTIONS)]
    fn encoding_is_idempotent(#[case] sections: &str) {
        let once = encoder::encode(&parser::decode(&hex_module(sections)).unwrap()).unwrap();
        let twice = encoder::encode(&parser::decode(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn section_lengths_are_recomputed() {
        // a body large enough that the code section size needs two LEB bytes
        let body: Vec<Instruction> = (0..100)
            .flat_map(|i| [i32_const(i), Instruction::Drop])
            .collect();
        let module = ModuleBuilder::new()
            .func(Some("big"), FuncType::default(), vec![], body)
            .build();

        let bytes = encoder::encode(&module).unwrap();
        let decoded = round_trip(&module);
        assert_eq!(decoded.codes()[0].body.len(), 200);
        assert_eq!(encoder::encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn built_modules_round_trip() {
        let module = ModuleBuilder::new()
            .import_func("env", "log", FuncType::new(vec![ValueType::I32], vec![]))
            .import_memory("env", "mem", 1)
            .table(Some("table"), 2)
            .global(
                Some("g"),
                GlobalType {
                    value_type: ValueType::I64,
                    mutability: Mutability::Var,
                },
                vec![Instruction::I64Const { value: i64::MIN }],
            )
            .func(
                Some("f"),
                FuncType::new(vec![ValueType::I32], vec![ValueType::I32]),
                vec![ValueType::F64, ValueType::F64, ValueType::I64],
                vec![
                    local_get(0),
                    Instruction::If {
                        block_type: BlockType::Value(ValueType::I32),
                        then_branch: vec![i32_const(-1)],
                        else_branch: None,
                    },
                    Instruction::Numeric(NumericOp::I32Popcnt),
                ],
            )
            .element(1, vec![1])
            .data(0, &[1, 2, 3])
            .build();

        let decoded = round_trip(&module);
        assert_eq!(decoded.imports().len(), 2);
        assert_eq!(decoded.codes()[0].local_types().count(), 3);
        assert_eq!(
            decoded.to_json().unwrap(),
            module.to_json().unwrap(),
            "decoded structure should match the built one"
        );
    }

    #[test]
    fn type_index_block_types_are_not_encoded() {
        let module = ModuleBuilder::new()
            .func(
                None,
                FuncType::default(),
                vec![],
                vec![Instruction::Block {
                    block_type: BlockType::FuncType(0),
                    body: vec![],
                }],
            )
            .build();
        assert!(matches!(encoder::encode(&module), Err(EncodeError::NotImplemented(_))));
    }

    #[test]
    fn custom_sections_keep_their_position() {
        let bytes = hex_module("00 03 01 61 ff 03 01 00 00 02 01 62");
        let module = parser::decode(&bytes).unwrap();
        let ids: Vec<u8> = module.sections().iter().map(Section::id).collect();
        assert_eq!(ids, vec![0, 3, 0]);
        assert_eq!(encoder::encode(&module).unwrap(), bytes);
    }
}
