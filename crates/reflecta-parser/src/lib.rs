//! Reflecta parser crate - lexer and declaration parser for source files.
//!
//! This crate turns a source file into a declaration-level syntax tree:
//! namespaces, imports, types, their members, attributes and doc comments,
//! plus the constant-expression grammar used by initializers and attribute
//! arguments. Function and method bodies are lexed but skipped.
//!
//! # Example
//!
//! ```
//! use reflecta_parser::Parser;
//!
//! let source = r#"<?php
//!     namespace app;
//!
//!     #[Table('users')]
//!     class User {
//!         const LIMIT = 10 * 2;
//!     }
//! "#;
//!
//! let parser = Parser::new(source).unwrap();
//! let (file, interner) = parser.parse().unwrap();
//! let class = &file.blocks[0].types[0];
//! assert_eq!(interner.resolve(class.name.name), "User");
//! ```

pub mod ast;
pub mod interner;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use interner::{Interner, Symbol};
pub use lexer::{LexError, Lexer};
pub use parser::{parse_expression_source, ParseError, ParseErrorKind, Parser};
pub use token::{Span, Token};
