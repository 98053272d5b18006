//! A small WebAssembly binary decoder, encoder and interpreter.
//!
//! wasmtiny decodes `.wasm` bytes into a structural [`parser::module::Module`],
//! encodes such a module back to the exact same bytes, and instantiates it
//! against host-provided imports to run exported functions.
//!
//! # Modules
//!
//! - [`parser`] -- Binary format decoder. Reads `.wasm` bytes into a `Module`.
//! - [`encoder`] -- Binary encoder. Serialises a `Module` back to `.wasm` bytes.
//! - [`runtime`] -- Interpreter, memories, tables, globals and the import object.
//! - [`config`] -- Settings shared by the decoder and the interpreter.
//!
//! # Example
//!
//! Decode a module, instantiate it, and call an exported function:
//!
//! ```
//! use wasmtiny::parser;
//! use wasmtiny::runtime::{self, ImportObject, Value};
//!
//! // (func (export "add") (param i32 i32) (result i32)
//! //   local.get 0 local.get 1 i32.add)
//! let bytes = hex::decode(concat!(
//!     "0061736d01000000",
//!     "01070160027f7f017f",
//!     "03020100",
//!     "070701036164640000",
//!     "0a09010700200020016a0b",
//! ))
//! .unwrap();
//!
//! let module = parser::decode(&bytes).unwrap();
//! assert_eq!(wasmtiny::encoder::encode(&module).unwrap(), bytes);
//!
//! let instance = runtime::instantiate(&module, &ImportObject::new()).unwrap();
//! let result = instance.invoke("add", &[Value::I32(2), Value::I32(3)]).unwrap();
//! assert_eq!(result, Some(Value::I32(5)));
//! ```
//!
//! Only part of the instruction set executes; see
//! [`runtime::implemented`] for the list. The rest decodes and encodes.

pub mod config;
pub mod encoder;
pub mod parser;
pub mod runtime;
