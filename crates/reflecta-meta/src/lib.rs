//! Reflecta metadata crate - annotations, documentation and type
//! constraints for declarations in source files.
//!
//! Declarations are addressed by type name. The declaring file is found
//! by a [`SourceLocator`], parsed once into a [`SyntaxTree`] and kept in a
//! bounded [`TreeCache`]. Annotation arguments are constant expressions;
//! they are evaluated against the declaring file's scope, with a
//! [`Runtime`] answering for anything defined outside of source.
//!
//! # Example
//!
//! ```
//! use reflecta_meta::{MemoryLocator, MetaInformation, StaticRuntime, Value};
//! use std::sync::Arc;
//!
//! let locator = MemoryLocator::new().with(
//!     "app\\User",
//!     r#"<?php
//!         namespace app;
//!
//!         #[Table('users')]
//!         class User {
//!             const LIMIT = 10;
//!
//!             #[Column(size: self::LIMIT * 2)]
//!             public $name;
//!         }
//!     "#,
//! );
//!
//! let meta = MetaInformation::builder(Arc::new(StaticRuntime::new()))
//!     .locator(Arc::new(locator))
//!     .build()
//!     .unwrap();
//!
//! let table = meta.type_annotations("app\\User").unwrap();
//! assert_eq!(table.get("Table").unwrap().value(), Some(&Value::from("users")));
//!
//! let column = meta.property_annotations("app\\User", "name").unwrap();
//! assert_eq!(column.get("Column").unwrap().argument("size"), Some(&Value::Int(20)));
//! ```

pub mod annotations;
pub mod cache;
pub mod config;
pub mod declaration;
pub mod docblock;
pub mod error;
pub mod eval;
pub mod facade;
pub mod meta_cache;
pub mod operators;
pub mod runtime;
pub mod scope;
pub mod source;
pub mod tree;
pub mod types;
pub mod value;

pub use annotations::{Annotation, Annotations};
pub use cache::{FileSystemLocator, MemoryLocator, SourceLocator, TreeCache, DEFAULT_CAPACITY};
pub use config::{MetaOptions, SourceMode, SourcesConfig};
pub use declaration::{Declaration, MemberRef, ParameterRef};
pub use error::{MetaError, MetaResult};
pub use eval::{Evaluator, Frame, DEFAULT_MAX_DEPTH};
pub use facade::{MetaInformation, MetaInformationBuilder, SourceLocation, VirtualProperty};
pub use meta_cache::{MetaCache, MetaEntry};
pub use runtime::{Runtime, StaticRuntime};
pub use scope::Scope;
pub use source::{
    AnnotationSource, AttributeTable, CompiledAttribute, Environment, FromAttributes, FromSyntaxTree, SourceKind,
    StaticAttributes,
};
pub use tree::{Source, SyntaxTree};
pub use types::{Constraint, Primitive, TypeExpr};
pub use value::{Array, ArrayKey, Instance, Value};
