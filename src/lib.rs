pub mod assembler;
pub mod buffer;
pub mod encoder;
pub mod error;
pub mod literal;
pub mod operand;
pub mod output;
pub mod preprocess;
pub mod symbols;

pub mod isa {
    pub mod z80; // Zilog Z80, no IX/IY
}

pub use assembler::{assemble, AsmConfig, Assembler, Assembly, ListingEntry};
pub use error::{AsmError, Error};
pub use literal::parse_literal;
pub use output::{hex_dump, render_listing};
